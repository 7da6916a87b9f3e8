use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use boxoffice_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Attach a [`CallerContext`] to every request.
///
/// No `Authorization` header means an anonymous caller; a header that is
/// present but not a valid bearer token is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = match extract_bearer(req.headers()) {
        Ok(None) => CallerContext::anonymous(),
        Ok(Some(token)) => match state.jwt.validate(token, Utc::now()) {
            Ok(claims) => CallerContext::from_claims(claims),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                return json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string());
            }
        },
        Err(msg) => return json_error(StatusCode::UNAUTHORIZED, "invalid_token", msg),
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid text")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("expected 'Bearer <token>'")?
        .trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(Some(token))
}
