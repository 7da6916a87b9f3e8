use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::authz;
use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<CallerContext>) -> axum::response::Response {
    if let Err(resp) = authz::require_authenticated(&caller) {
        return resp;
    }

    Json(serde_json::json!({
        "subject": caller.subject(),
        "roles": caller.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "privileged": caller.is_admin(),
    }))
    .into_response()
}
