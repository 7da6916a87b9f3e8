use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{BookingId, Entity};

use crate::validation::CustomerName;

/// Booking lifecycle: `Active -> Canceled`, terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Canceled,
}

/// A block of tickets held by one customer.
///
/// Bookings only exist inside their conference's booking sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub(crate) id: BookingId,
    pub(crate) customer_name: CustomerName,
    pub(crate) tickets_booked: u32,
    pub(crate) booked_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) is_canceled: bool,
}

impl Booking {
    pub(crate) fn new(
        id: BookingId,
        customer_name: CustomerName,
        tickets_booked: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_name,
            tickets_booked,
            booked_at: now,
            updated_at: now,
            is_canceled: false,
        }
    }

    pub fn id_typed(&self) -> BookingId {
        self.id
    }

    pub fn customer_name(&self) -> &CustomerName {
        &self.customer_name
    }

    pub fn tickets_booked(&self) -> u32 {
        self.tickets_booked
    }

    pub fn booked_at(&self) -> DateTime<Utc> {
        self.booked_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_canceled(&self) -> bool {
        self.is_canceled
    }

    pub fn is_active(&self) -> bool {
        !self.is_canceled
    }

    pub fn status(&self) -> BookingStatus {
        if self.is_canceled {
            BookingStatus::Canceled
        } else {
            BookingStatus::Active
        }
    }
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
