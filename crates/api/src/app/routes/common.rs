use std::str::FromStr;

use axum::response::Response;
use serde::Deserialize;

use boxoffice_core::DomainError;

use crate::app::errors;

/// Path parameters of routes under `/conferences/:id/bookings/:booking_id`.
#[derive(Debug, Deserialize)]
pub struct BookingPath {
    pub id: String,
    pub booking_id: String,
}

/// Parse a path segment into a typed id, answering 400 on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
