//! Conference lifecycle decisions: create, scoped update, name uniqueness.
//!
//! Store access and locking live in the infrastructure layer; everything here
//! is deterministic given the aggregate and the command.

use serde::{Deserialize, Serialize};

use boxoffice_core::{ConferenceId, DomainError, DomainResult};

use crate::conference::Conference;
use crate::engine::recompute_remaining;
use crate::scope::UpdateScope;
use crate::validation::{ConferenceName, validate_capacity, validate_total_tickets};

/// Command: CreateConference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConference {
    pub conference_id: ConferenceId,
    pub name: String,
    pub total_tickets: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceChanges {
    pub name: Option<String>,
    pub total_tickets: Option<u32>,
}

/// Command: UpdateConference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConference {
    pub scope: UpdateScope,
    pub changes: ConferenceChanges,
}

impl UpdateConference {
    /// The validated name this update would commit, if the name is in scope.
    pub fn proposed_name(&self) -> DomainResult<Option<ConferenceName>> {
        if !self.scope.includes_name() {
            return Ok(None);
        }
        ConferenceName::parse(self.changes.name.as_deref().unwrap_or_default()).map(Some)
    }
}

pub fn create_conference(cmd: &CreateConference) -> DomainResult<Conference> {
    let name = ConferenceName::parse(&cmd.name)?;
    validate_total_tickets(cmd.total_tickets, 0)?;
    Ok(Conference::new(cmd.conference_id, name, cmd.total_tickets))
}

/// Apply a scoped update to a freshly loaded conference.
///
/// Name uniqueness is not checked here; see [`ensure_unique_name`].
pub fn update_conference(conference: &Conference, cmd: &UpdateConference) -> DomainResult<Conference> {
    let name = cmd
        .proposed_name()?
        .unwrap_or_else(|| conference.name.clone());

    let mut next = conference.clone();
    next.name = name;

    if cmd.scope.includes_tickets() {
        let total = cmd.changes.total_tickets.unwrap_or(0);
        validate_total_tickets(total, conference.remaining_tickets)?;
        validate_capacity(total, conference.active_ticket_sum())?;
        next.total_tickets = total;
        next = recompute_remaining(&next)?;
    }

    Ok(next)
}

/// Reject `name` if any conference other than `exclude` already uses it.
///
/// Comparison is exact on the trimmed name.
pub fn ensure_unique_name<'a>(
    name: &ConferenceName,
    existing: impl IntoIterator<Item = &'a Conference>,
    exclude: Option<ConferenceId>,
) -> DomainResult<()> {
    let taken = existing
        .into_iter()
        .filter(|c| Some(c.id) != exclude)
        .any(|c| c.name == *name);

    if taken {
        return Err(DomainError::DuplicateName {
            name: name.as_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CancelBooking, CreateBooking, cancel_booking, create_booking};
    use boxoffice_core::{BookingId, NameRule};
    use chrono::Utc;

    fn create(name: &str, total: u32) -> CreateConference {
        CreateConference {
            conference_id: ConferenceId::new(),
            name: name.to_string(),
            total_tickets: total,
        }
    }

    fn with_booking(total: u32, tickets: u32) -> (Conference, BookingId) {
        let conf = create_conference(&create("RustConf", total)).unwrap();
        let outcome = create_booking(
            &conf,
            &CreateBooking {
                booking_id: BookingId::new(),
                customer_name: "Ferris Crab".to_string(),
                tickets_booked: tickets,
                occurred_at: Utc::now(),
            },
        )
        .unwrap();
        let id = outcome.booking.id_typed();
        (outcome.conference, id)
    }

    fn set_total(total: u32) -> UpdateConference {
        UpdateConference {
            scope: UpdateScope::TicketsOnly,
            changes: ConferenceChanges {
                name: None,
                total_tickets: Some(total),
            },
        }
    }

    #[test]
    fn create_conference_starts_empty() {
        let cmd = create("  EuroRust ", 100);
        let conf = create_conference(&cmd).unwrap();

        assert_eq!(conf.id_typed(), cmd.conference_id);
        assert_eq!(conf.name().as_str(), "EuroRust");
        assert_eq!(conf.total_tickets(), 100);
        assert_eq!(conf.remaining_tickets(), 100);
        assert!(conf.bookings().is_empty());
    }

    #[test]
    fn create_conference_validates_inputs() {
        assert_eq!(
            create_conference(&create("R", 10)).unwrap_err(),
            DomainError::invalid_name("R", NameRule::TooShort)
        );
        assert_eq!(
            create_conference(&create("RustConf", 0)).unwrap_err(),
            DomainError::invalid_ticket_count(0, 0)
        );
    }

    #[test]
    fn lowering_total_below_booked_is_rejected() {
        let (conf, _) = with_booking(10, 7);

        let err = update_conference(&conf, &set_total(5)).unwrap_err();
        assert_eq!(
            err,
            DomainError::CapacityBelowBooked {
                requested_total: 5,
                active_tickets: 7,
            }
        );

        let next = update_conference(&conf, &set_total(7)).unwrap();
        assert_eq!(next.remaining_tickets(), 0);
    }

    #[test]
    fn raising_total_recomputes_remaining() {
        let (conf, _) = with_booking(10, 7);
        let next = update_conference(&conf, &set_total(20)).unwrap();
        assert_eq!(next.total_tickets(), 20);
        assert_eq!(next.remaining_tickets(), 13);
        assert!(next.is_consistent());
    }

    #[test]
    fn canceled_bookings_do_not_hold_capacity() {
        let (conf, id) = with_booking(10, 7);
        let conf = cancel_booking(
            &conf,
            &CancelBooking {
                booking_id: id,
                occurred_at: Utc::now(),
            },
        )
        .unwrap()
        .conference;

        let next = update_conference(&conf, &set_total(1)).unwrap();
        assert_eq!(next.remaining_tickets(), 1);
        assert_eq!(next.bookings().len(), 1);
    }

    #[test]
    fn name_only_update_keeps_total() {
        let (conf, _) = with_booking(10, 3);
        let cmd = UpdateConference {
            scope: UpdateScope::NameOnly,
            changes: ConferenceChanges {
                name: Some(" RustFest ".to_string()),
                total_tickets: Some(1),
            },
        };

        let next = update_conference(&conf, &cmd).unwrap();
        assert_eq!(next.name().as_str(), "RustFest");
        assert_eq!(next.total_tickets(), 10);
        assert_eq!(next.remaining_tickets(), 7);
    }

    #[test]
    fn full_update_requires_both_fields() {
        let (conf, _) = with_booking(10, 3);
        let cmd = UpdateConference {
            scope: UpdateScope::Full,
            changes: ConferenceChanges {
                name: Some("RustFest".to_string()),
                total_tickets: None,
            },
        };

        let err = update_conference(&conf, &cmd).unwrap_err();
        assert_eq!(err, DomainError::invalid_ticket_count(0, 7));
    }

    #[test]
    fn unique_name_ignores_the_conference_being_renamed() {
        let a = create_conference(&create("RustConf", 10)).unwrap();
        let b = create_conference(&create("EuroRust", 10)).unwrap();
        let all = [a.clone(), b.clone()];

        let name = ConferenceName::parse("RustConf").unwrap();
        assert!(ensure_unique_name(&name, &all, Some(a.id_typed())).is_ok());
        assert_eq!(
            ensure_unique_name(&name, &all, Some(b.id_typed())).unwrap_err(),
            DomainError::DuplicateName {
                name: "RustConf".to_string()
            }
        );
        assert!(ensure_unique_name(&name, &all, None).is_err());
    }

    #[test]
    fn unique_name_is_case_sensitive() {
        let a = create_conference(&create("RustConf", 10)).unwrap();
        let name = ConferenceName::parse("rustconf").unwrap();
        assert!(ensure_unique_name(&name, [&a], None).is_ok());
    }
}
