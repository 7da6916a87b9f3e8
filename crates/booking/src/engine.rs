//! Inventory consistency engine.
//!
//! Every operation borrows a loaded conference and returns a *new* aggregate
//! (plus the affected booking) or a typed rejection. The input is never
//! touched, so a rejected command leaves the caller's snapshot exactly as it
//! was, and nothing is ever clamped.
//!
//! Ticket-count updates are checked as deltas against the pool: the booking's
//! own allocation is already excluded from `remaining_tickets`, so only the
//! increase has to fit. Comparing the new absolute count with `remaining`
//! undercounts capacity and is wrong.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{BookingId, DomainError, DomainResult};

use crate::booking::Booking;
use crate::conference::Conference;
use crate::scope::UpdateScope;
use crate::validation::{
    CustomerName, validate_capacity, validate_ticket_change, validate_ticket_request,
};

/// Command: CreateBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    /// Fresh id drawn from the identifier supplier.
    pub booking_id: BookingId,
    pub customer_name: String,
    pub tickets_booked: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Partial field set for a booking update.
///
/// Fields inside the update scope are required; `None` there is validated as
/// an empty name or zero tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingChanges {
    pub customer_name: Option<String>,
    pub tickets_booked: Option<u32>,
}

/// Command: UpdateBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBooking {
    pub booking_id: BookingId,
    pub scope: UpdateScope,
    pub changes: BookingChanges,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelBooking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    Create(CreateBooking),
    Update(UpdateBooking),
    Cancel(CancelBooking),
}

impl BookingCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingCommand::Create(_) => "booking.create",
            BookingCommand::Update(_) => "booking.update",
            BookingCommand::Cancel(_) => "booking.cancel",
        }
    }
}

/// Accepted booking mutation: the aggregate to persist and the booking as it
/// now stands inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOutcome {
    pub conference: Conference,
    pub booking: Booking,
}

impl Conference {
    /// Decide a booking command against this snapshot.
    pub fn handle(&self, command: &BookingCommand) -> DomainResult<BookingOutcome> {
        match command {
            BookingCommand::Create(cmd) => create_booking(self, cmd),
            BookingCommand::Update(cmd) => update_booking(self, cmd),
            BookingCommand::Cancel(cmd) => cancel_booking(self, cmd),
        }
    }
}

pub fn create_booking(conference: &Conference, cmd: &CreateBooking) -> DomainResult<BookingOutcome> {
    let customer_name = CustomerName::parse(&cmd.customer_name)
        .map_err(|e| e.with_remaining(conference.remaining_tickets))?;
    validate_ticket_request(cmd.tickets_booked, conference.remaining_tickets)?;

    let booking = Booking::new(
        cmd.booking_id,
        customer_name,
        cmd.tickets_booked,
        cmd.occurred_at,
    );

    let mut next = conference.clone();
    next.remaining_tickets -= cmd.tickets_booked;
    next.bookings.push(booking.clone());

    Ok(BookingOutcome {
        conference: next,
        booking,
    })
}

pub fn update_booking(conference: &Conference, cmd: &UpdateBooking) -> DomainResult<BookingOutcome> {
    let index = locate(conference, cmd.booking_id)?;
    let current = &conference.bookings[index];
    if current.is_canceled {
        return Err(DomainError::CanceledBookingImmutable {
            booking_id: cmd.booking_id,
        });
    }

    let customer_name = if cmd.scope.includes_name() {
        CustomerName::parse(cmd.changes.customer_name.as_deref().unwrap_or_default())
            .map_err(|e| e.with_remaining(conference.remaining_tickets))?
    } else {
        current.customer_name.clone()
    };

    let tickets_booked = if cmd.scope.includes_tickets() {
        let proposed = cmd.changes.tickets_booked.unwrap_or(0);
        validate_ticket_change(current.tickets_booked, proposed, conference.remaining_tickets)?;
        proposed
    } else {
        current.tickets_booked
    };

    let updated = Booking {
        id: current.id,
        customer_name,
        tickets_booked,
        booked_at: current.booked_at,
        updated_at: cmd.occurred_at,
        is_canceled: current.is_canceled,
    };

    // Return the old allocation to the pool, then draw the new one. The
    // validation above guarantees the draw fits.
    let pool = conference.remaining_tickets + current.tickets_booked;

    let mut next = conference.clone();
    next.remaining_tickets = pool - tickets_booked;
    next.bookings[index] = updated.clone();

    Ok(BookingOutcome {
        conference: next,
        booking: updated,
    })
}

pub fn cancel_booking(conference: &Conference, cmd: &CancelBooking) -> DomainResult<BookingOutcome> {
    let index = locate(conference, cmd.booking_id)?;
    if conference.bookings[index].is_canceled {
        return Err(DomainError::AlreadyCanceled {
            booking_id: cmd.booking_id,
        });
    }

    let mut next = conference.clone();
    let booking = &mut next.bookings[index];
    booking.is_canceled = true;
    booking.updated_at = cmd.occurred_at;
    let released = booking.tickets_booked;
    let booking = booking.clone();
    next.remaining_tickets += released;

    Ok(BookingOutcome {
        conference: next,
        booking,
    })
}

/// Rebuild `remaining_tickets` from `total_tickets` and the active bookings.
///
/// Use this, never a hand adjustment, whenever `total_tickets` changes.
pub fn recompute_remaining(conference: &Conference) -> DomainResult<Conference> {
    let active = conference.active_ticket_sum();
    validate_capacity(conference.total_tickets, active)?;

    let mut next = conference.clone();
    next.remaining_tickets = conference.total_tickets - active;
    Ok(next)
}

fn locate(conference: &Conference, booking_id: BookingId) -> DomainResult<usize> {
    conference
        .position(&booking_id)
        .ok_or(DomainError::BookingNotFound {
            conference_id: conference.id,
            booking_id,
        })
}
