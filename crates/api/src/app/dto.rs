//! Request bodies and JSON response shapes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_booking::{
    Booking, BookingChanges, BookingOutcome, BookingStatus, Conference, ConferenceChanges,
};
use boxoffice_core::AggregateRoot;

use crate::app::errors::json_error;

#[derive(Debug, Deserialize)]
pub struct CreateConferenceRequest {
    pub conference_name: String,
    pub total_tickets: u32,
}

/// Body for `PUT` and both `PATCH` conference routes; the route picks the scope.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateConferenceRequest {
    pub conference_name: Option<String>,
    pub total_tickets: Option<u32>,
}

impl From<UpdateConferenceRequest> for ConferenceChanges {
    fn from(req: UpdateConferenceRequest) -> Self {
        ConferenceChanges {
            name: req.conference_name,
            total_tickets: req.total_tickets,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub tickets_booked: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookingRequest {
    pub customer_name: Option<String>,
    pub tickets_booked: Option<u32>,
}

impl From<UpdateBookingRequest> for BookingChanges {
    fn from(req: UpdateBookingRequest) -> Self {
        BookingChanges {
            customer_name: req.customer_name,
            tickets_booked: req.tickets_booked,
        }
    }
}

/// Unwrap a JSON body, turning extractor rejections into our error shape.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(value)| value)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text()))
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub customer_name: String,
    pub tickets_booked: u32,
    pub status: BookingStatus,
    pub is_canceled: bool,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id_typed().to_string(),
            customer_name: b.customer_name().to_string(),
            tickets_booked: b.tickets_booked(),
            status: b.status(),
            is_canceled: b.is_canceled(),
            booked_at: b.booked_at(),
            updated_at: b.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConferenceResponse {
    pub id: String,
    pub conference_name: String,
    pub total_tickets: u32,
    pub remaining_tickets: u32,
    pub bookings: Vec<BookingResponse>,
    pub version: u64,
}

impl From<&Conference> for ConferenceResponse {
    fn from(c: &Conference) -> Self {
        Self {
            id: c.id_typed().to_string(),
            conference_name: c.name().to_string(),
            total_tickets: c.total_tickets(),
            remaining_tickets: c.remaining_tickets(),
            bookings: c.bookings().iter().map(BookingResponse::from).collect(),
            version: c.version(),
        }
    }
}

/// A booking mutation together with the pool it left behind.
#[derive(Debug, Serialize)]
pub struct BookingMutationResponse {
    pub conference_id: String,
    pub remaining_tickets: u32,
    pub booking: BookingResponse,
}

impl From<&BookingOutcome> for BookingMutationResponse {
    fn from(outcome: &BookingOutcome) -> Self {
        Self {
            conference_id: outcome.conference.id_typed().to_string(),
            remaining_tickets: outcome.conference.remaining_tickets(),
            booking: BookingResponse::from(&outcome.booking),
        }
    }
}
