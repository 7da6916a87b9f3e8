//! Domain error model.

use thiserror::Error;

use crate::id::{BookingId, ConferenceId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which naming rule a rejected name broke.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NameRule {
    /// Fewer than two characters after trimming.
    TooShort,
    /// A customer name needs a first and a last name.
    MissingLastName,
}

impl core::fmt::Display for NameRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NameRule::TooShort => f.write_str("name is too short"),
            NameRule::MissingLastName => {
                f.write_str("last name is missing, expected 'FirstName LastName'")
            }
        }
    }
}

/// Domain-level rejection.
///
/// Every variant is deterministic: the same aggregate and the same command
/// always produce the same rejection. Each one carries the offending values so
/// the boundary layer can surface them verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// `remaining` is set when the name belonged to a booking request.
    #[error("invalid name '{value}': {reason}")]
    InvalidName {
        value: String,
        reason: NameRule,
        remaining: Option<u32>,
    },

    /// `requested` is the absolute count for a new booking and the increase
    /// for an update.
    #[error("cannot take {requested} tickets, {remaining} remaining")]
    InvalidTicketCount { requested: u32, remaining: u32 },

    #[error("conference name '{name}' already exists")]
    DuplicateName { name: String },

    #[error("cannot set total tickets to {requested_total}, {active_tickets} tickets already booked")]
    CapacityBelowBooked {
        requested_total: u32,
        active_tickets: u32,
    },

    #[error("conference {conference_id} not found")]
    ConferenceNotFound { conference_id: ConferenceId },

    #[error("booking {booking_id} not found for conference {conference_id}")]
    BookingNotFound {
        conference_id: ConferenceId,
        booking_id: BookingId,
    },

    #[error("booking {booking_id} is canceled and cannot be modified")]
    CanceledBookingImmutable { booking_id: BookingId },

    #[error("booking {booking_id} is already canceled")]
    AlreadyCanceled { booking_id: BookingId },

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_name(value: impl Into<String>, reason: NameRule) -> Self {
        Self::InvalidName {
            value: value.into(),
            reason,
            remaining: None,
        }
    }

    /// Attach the pool size a booking request was judged against.
    pub fn with_remaining(self, remaining: u32) -> Self {
        match self {
            Self::InvalidName { value, reason, .. } => Self::InvalidName {
                value,
                reason,
                remaining: Some(remaining),
            },
            other => other,
        }
    }

    pub fn invalid_ticket_count(requested: u32, remaining: u32) -> Self {
        Self::InvalidTicketCount {
            requested,
            remaining,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conference_not_found(conference_id: ConferenceId) -> Self {
        Self::ConferenceNotFound { conference_id }
    }

    /// Stable machine-readable code for the rejection kind.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidName { .. } => "invalid_name",
            DomainError::InvalidTicketCount { .. } => "invalid_ticket_count",
            DomainError::DuplicateName { .. } => "duplicate_name",
            DomainError::CapacityBelowBooked { .. } => "capacity_below_booked",
            DomainError::ConferenceNotFound { .. } => "conference_not_found",
            DomainError::BookingNotFound { .. } => "booking_not_found",
            DomainError::CanceledBookingImmutable { .. } => "canceled_booking_immutable",
            DomainError::AlreadyCanceled { .. } => "already_canceled",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
