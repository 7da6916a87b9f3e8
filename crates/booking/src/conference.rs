use serde::{Deserialize, Serialize};

use boxoffice_core::{AggregateRoot, BookingId, ConferenceId, entity::position_of};

use crate::booking::Booking;
use crate::validation::ConferenceName;

/// Aggregate root: a conference and the bookings drawn against its tickets.
///
/// `remaining_tickets` is derived state: it always equals `total_tickets`
/// minus the tickets held by active bookings. Only the engine and lifecycle
/// functions in this crate change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    #[serde(rename = "_id")]
    pub(crate) id: ConferenceId,
    #[serde(rename = "conference_name")]
    pub(crate) name: ConferenceName,
    pub(crate) total_tickets: u32,
    pub(crate) remaining_tickets: u32,
    #[serde(default)]
    pub(crate) bookings: Vec<Booking>,
    #[serde(default)]
    pub(crate) version: u64,
}

impl Conference {
    pub(crate) fn new(id: ConferenceId, name: ConferenceName, total_tickets: u32) -> Self {
        Self {
            id,
            name,
            total_tickets,
            remaining_tickets: total_tickets,
            bookings: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> ConferenceId {
        self.id
    }

    pub fn name(&self) -> &ConferenceName {
        &self.name
    }

    pub fn total_tickets(&self) -> u32 {
        self.total_tickets
    }

    pub fn remaining_tickets(&self) -> u32 {
        self.remaining_tickets
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn booking(&self, booking_id: &BookingId) -> Option<&Booking> {
        self.position(booking_id).map(|idx| &self.bookings[idx])
    }

    pub(crate) fn position(&self, booking_id: &BookingId) -> Option<usize> {
        position_of(&self.bookings, booking_id)
    }

    pub fn active_bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.iter().filter(|b| b.is_active())
    }

    /// Σ tickets over bookings that are not canceled.
    pub fn active_ticket_sum(&self) -> u32 {
        let sum: u64 = self
            .active_bookings()
            .map(|b| u64::from(b.tickets_booked))
            .sum();
        u32::try_from(sum).unwrap_or(u32::MAX)
    }

    /// Whether `remaining_tickets` agrees with the booking sequence.
    pub fn is_consistent(&self) -> bool {
        self.total_tickets.checked_sub(self.active_ticket_sum()) == Some(self.remaining_tickets)
    }

    /// Same aggregate with a different persistence revision (stores only).
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

impl AggregateRoot for Conference {
    type Id = ConferenceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
