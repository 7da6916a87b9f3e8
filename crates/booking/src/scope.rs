use serde::{Deserialize, Serialize};

/// Which fields an update call may change.
///
/// Fields outside the scope keep their stored value no matter what the caller
/// sent along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScope {
    NameOnly,
    TicketsOnly,
    Full,
}

impl UpdateScope {
    pub fn includes_name(self) -> bool {
        matches!(self, UpdateScope::NameOnly | UpdateScope::Full)
    }

    pub fn includes_tickets(self) -> bool {
        matches!(self, UpdateScope::TicketsOnly | UpdateScope::Full)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateScope::NameOnly => "name_only",
            UpdateScope::TicketsOnly => "tickets_only",
            UpdateScope::Full => "full",
        }
    }
}

impl core::fmt::Display for UpdateScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
