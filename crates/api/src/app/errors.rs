use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use boxoffice_core::DomainError;
use boxoffice_infra::DispatchError;

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Rejected(e) => domain_error_to_response(e),
        e @ DispatchError::ConcurrentModification { .. } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "concurrent_modification",
                "message": e.to_string(),
                "retryable": true,
            })),
        )
            .into_response(),
        DispatchError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::DuplicateName { .. } => StatusCode::CONFLICT,
        DomainError::ConferenceNotFound { .. } | DomainError::BookingNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        DomainError::InvalidName { .. }
        | DomainError::InvalidTicketCount { .. }
        | DomainError::CapacityBelowBooked { .. }
        | DomainError::CanceledBookingImmutable { .. }
        | DomainError::AlreadyCanceled { .. }
        | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::{BookingId, ConferenceId};

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let conference_id = ConferenceId::new();
        let booking_id = BookingId::new();
        let cases = [
            (DomainError::invalid_ticket_count(3, 1), StatusCode::BAD_REQUEST),
            (
                DomainError::DuplicateName {
                    name: "RustConf".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::conference_not_found(conference_id),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::BookingNotFound {
                    conference_id,
                    booking_id,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::AlreadyCanceled { booking_id },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn dispatch_errors_map_to_conflict_and_unavailable() {
        let conflict = DispatchError::ConcurrentModification {
            conference_id: ConferenceId::new(),
            expected: 2,
            actual: 3,
        };
        assert_eq!(dispatch_error_to_response(conflict).status(), StatusCode::CONFLICT);

        let down = DispatchError::StoreUnavailable("timed out".to_string());
        assert_eq!(
            dispatch_error_to_response(down).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
