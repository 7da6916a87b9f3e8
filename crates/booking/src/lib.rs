//! `boxoffice-booking`: conferences, bookings and the ticket-inventory engine.
//!
//! Pure domain logic only: every decision takes a loaded aggregate and returns
//! a new one or a [`boxoffice_core::DomainError`]. Persistence, locking and
//! transport belong to other crates.

pub mod booking;
pub mod conference;
pub mod engine;
pub mod lifecycle;
pub mod projection;
pub mod scope;
pub mod validation;

pub use booking::{Booking, BookingStatus};
pub use conference::Conference;
pub use engine::{
    BookingChanges, BookingCommand, BookingOutcome, CancelBooking, CreateBooking, UpdateBooking,
    cancel_booking, create_booking, recompute_remaining, update_booking,
};
pub use lifecycle::{
    ConferenceChanges, CreateConference, UpdateConference, create_conference, ensure_unique_name,
    update_conference,
};
pub use projection::{Privilege, project, project_all};
pub use scope::UpdateScope;
pub use validation::{ConferenceName, CustomerName};
