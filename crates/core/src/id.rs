//! Strongly-typed identifiers and the identifier supplier seam.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a conference (the aggregate root).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConferenceId(Uuid);

/// Identifier of a booking inside its conference.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier (UUIDv7, time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(ConferenceId, "ConferenceId");
impl_uuid_newtype!(BookingId, "BookingId");

/// Source of fresh, globally unique identifiers.
///
/// The domain never generates ids itself; callers draw them from a supplier
/// and pass them in with the command.
pub trait IdSupplier: Send + Sync {
    fn next_uuid(&self) -> Uuid;

    fn next_conference_id(&self) -> ConferenceId {
        ConferenceId::from_uuid(self.next_uuid())
    }

    fn next_booking_id(&self) -> BookingId {
        BookingId::from_uuid(self.next_uuid())
    }
}

/// Default supplier backed by UUIDv7.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Supplier;

impl IdSupplier for UuidV7Supplier {
    fn next_uuid(&self) -> Uuid {
        Uuid::now_v7()
    }
}

impl<S> IdSupplier for std::sync::Arc<S>
where
    S: IdSupplier + ?Sized,
{
    fn next_uuid(&self) -> Uuid {
        (**self).next_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        let id = ConferenceId::new();
        let parsed: ConferenceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage_with_typed_error() {
        let err = "not-a-uuid".parse::<BookingId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("BookingId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn supplier_hands_out_distinct_ids() {
        let supplier = UuidV7Supplier;
        let a = supplier.next_booking_id();
        let b = supplier.next_booking_id();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_serialize_transparently() {
        let uuid = Uuid::now_v7();
        let id = BookingId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
