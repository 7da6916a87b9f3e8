use serde::{Deserialize, Serialize};

use crate::conference::Conference;

/// What a reader is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    Privileged,
    Unprivileged,
}

impl Privilege {
    pub fn is_privileged(self) -> bool {
        matches!(self, Privilege::Privileged)
    }
}

/// Read view of one conference: unprivileged readers never see bookings.
pub fn project(conference: Conference, privilege: Privilege) -> Conference {
    match privilege {
        Privilege::Privileged => conference,
        Privilege::Unprivileged => Conference {
            bookings: Vec::new(),
            ..conference
        },
    }
}

pub fn project_all(conferences: Vec<Conference>, privilege: Privilege) -> Vec<Conference> {
    conferences
        .into_iter()
        .map(|c| project(c, privilege))
        .collect()
}
