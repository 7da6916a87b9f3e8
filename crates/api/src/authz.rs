//! Route-level access guards, checked inside handlers before any service call.

use axum::http::StatusCode;
use axum::response::Response;

use crate::app::errors::json_error;
use crate::context::CallerContext;

pub fn require_authenticated(caller: &CallerContext) -> Result<(), Response> {
    if caller.is_anonymous() {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "a valid bearer token is required",
        ));
    }
    Ok(())
}

pub fn require_admin(caller: &CallerContext) -> Result<(), Response> {
    require_authenticated(caller)?;
    if !caller.is_admin() {
        return Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "only admin can perform this operation",
        ));
    }
    Ok(())
}
