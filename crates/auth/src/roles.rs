use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role carried in a token.
///
/// Roles are opaque strings; the only one with meaning to the service is
/// [`Role::ADMIN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed(Self::ADMIN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_recognised_exactly() {
        assert!(Role::admin().is_admin());
        assert!(Role::new("admin").is_admin());
        assert!(!Role::new("Admin").is_admin());
        assert!(!Role::new("user").is_admin());
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::admin()).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
