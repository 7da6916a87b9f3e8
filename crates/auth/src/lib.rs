//! `boxoffice-auth`: token verification and role model.
//!
//! Decoupled from HTTP and storage: the API layer hands in a bearer token and
//! gets back claims or a typed rejection.

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use roles::Role;
