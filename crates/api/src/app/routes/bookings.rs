//! Booking routes, nested under `/conferences/:id/bookings`.
//!
//! Creating and changing a booking is open to anonymous callers; listing every
//! booking of a conference needs an admin token.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use boxoffice_booking::UpdateScope;
use boxoffice_core::{BookingId, ConferenceId};

use crate::app::dto::{self, BookingMutationResponse, BookingResponse};
use crate::app::errors;
use crate::app::routes::common::{parse_id, BookingPath};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:booking_id", get(get_booking).put(replace_booking))
        .route("/:booking_id/name", patch(rename_booking))
        .route("/:booking_id/tickets", patch(retick_booking))
        .route("/:booking_id/cancel", patch(cancel_booking))
}

fn parse_path(path: &BookingPath) -> Result<(ConferenceId, BookingId), axum::response::Response> {
    Ok((parse_id(&path.id)?, parse_id(&path.booking_id)?))
}

pub async fn list_bookings(
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

    match services.bookings.list(id).await {
        Ok(all) => Json(all.iter().map(BookingResponse::from).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::CreateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ConferenceId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match dto::parse_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .bookings
        .create(id, &body.customer_name, body.tickets_booked)
        .await
    {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(BookingMutationResponse::from(&outcome)),
        )
            .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<BookingPath>,
) -> axum::response::Response {
    let (conference_id, booking_id) = match parse_path(&path) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.bookings.get(conference_id, booking_id).await {
        Ok(booking) => Json(BookingResponse::from(&booking)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

async fn update_with_scope(
    services: &AppServices,
    path: &BookingPath,
    scope: UpdateScope,
    body: Result<Json<dto::UpdateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    let (conference_id, booking_id) = match parse_path(path) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };
    let body = match dto::parse_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services
        .bookings
        .update(conference_id, booking_id, scope, body.into())
        .await
    {
        Ok(outcome) => Json(BookingMutationResponse::from(&outcome)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn replace_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<BookingPath>,
    body: Result<Json<dto::UpdateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &path, UpdateScope::Full, body).await
}

pub async fn rename_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<BookingPath>,
    body: Result<Json<dto::UpdateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &path, UpdateScope::NameOnly, body).await
}

pub async fn retick_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<BookingPath>,
    body: Result<Json<dto::UpdateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    update_with_scope(&services, &path, UpdateScope::TicketsOnly, body).await
}

pub async fn cancel_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<BookingPath>,
) -> axum::response::Response {
    let (conference_id, booking_id) = match parse_path(&path) {
        Ok(ids) => ids,
        Err(resp) => return resp,
    };

    match services.bookings.cancel(conference_id, booking_id).await {
        Ok(outcome) => Json(BookingMutationResponse::from(&outcome)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
