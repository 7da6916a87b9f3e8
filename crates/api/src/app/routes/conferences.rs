use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use boxoffice_booking::{UpdateConference, UpdateScope};
use boxoffice_core::ConferenceId;

use crate::app::dto::{self, ConferenceResponse};
use crate::app::errors;
use crate::app::routes::{bookings, common::parse_id};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conferences).post(create_conference))
        .route(
            "/:id",
            get(get_conference)
                .put(replace_conference)
                .delete(delete_conference),
        )
        .route("/:id/name", patch(rename_conference))
        .route("/:id/tickets", patch(resize_conference))
        .route("/:id/active-tickets", get(active_tickets))
        .nest("/:id/bookings", bookings::router())
}

pub async fn list_conferences(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_authenticated(&caller) {
        return resp;
    }

    match services.conferences.list(caller.privilege()).await {
        Ok(all) => Json(all.iter().map(ConferenceResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<dto::CreateConferenceRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin(&caller) {
        return resp;
    }
    let body = match dto::parse_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .conferences
        .create(&body.conference_name, body.total_tickets)
        .await
    {
        Ok(saved) => (StatusCode::CREATED, Json(ConferenceResponse::from(&saved))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_authenticated(&caller) {
        return resp;
    }
    let id: ConferenceId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.conferences.get(id, caller.privilege()).await {
        Ok(conference) => Json(ConferenceResponse::from(&conference)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

async fn update_with_scope(
    services: &AppServices,
    caller: &CallerContext,
    id: &str,
    scope: UpdateScope,
    body: Result<Json<dto::UpdateConferenceRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin(caller) {
        return resp;
    }
    let id: ConferenceId = match parse_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match dto::parse_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let cmd = UpdateConference {
        scope,
        changes: body.into(),
    };
    match services.conferences.update(id, cmd).await {
        Ok(updated) => Json(ConferenceResponse::from(&updated)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn replace_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateConferenceRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &caller, &id, UpdateScope::Full, body).await
}

pub async fn rename_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateConferenceRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &caller, &id, UpdateScope::NameOnly, body).await
}

pub async fn resize_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateConferenceRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &caller, &id, UpdateScope::TicketsOnly, body).await
}

pub async fn delete_conference(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin(&caller) {
        return resp;
    }
    let id: ConferenceId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.conferences.delete(id).await {
        Ok(()) => Json(serde_json::json!({
            "id": id.to_string(),
            "deleted": true,
        }))
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn active_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_authenticated(&caller) {
        return resp;
    }
    let id: ConferenceId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.conferences.active_ticket_sum(id).await {
        Ok(sum) => Json(serde_json::json!({
            "conference_id": id.to_string(),
            "active_tickets": sum,
        }))
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
