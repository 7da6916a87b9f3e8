use boxoffice_auth::{JwtClaims, Role};
use boxoffice_booking::Privilege;

/// Who is calling, as established by the auth middleware.
///
/// Present on every request; anonymous when no bearer token was sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallerContext {
    subject: Option<String>,
    roles: Vec<Role>,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_claims(claims: JwtClaims) -> Self {
        Self {
            subject: Some(claims.sub),
            roles: claims.roles,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_none()
    }

    pub fn is_admin(&self) -> bool {
        !self.is_anonymous() && self.roles.iter().any(Role::is_admin)
    }

    pub fn privilege(&self) -> Privilege {
        if self.is_admin() {
            Privilege::Privileged
        } else {
            Privilege::Unprivileged
        }
    }
}
