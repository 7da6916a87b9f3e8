//! Pure validation rules for names and ticket counts.
//!
//! Callers are expected to trim input already; every parser trims again so the
//! rules hold no matter which boundary handed the value in.

use serde::{Deserialize, Serialize};

use boxoffice_core::{DomainError, DomainResult, NameRule, ValueObject};

/// Minimum number of characters in any name, after trimming.
pub const MIN_NAME_LEN: usize = 2;

/// A validated, trimmed conference name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConferenceName(String);

impl ConferenceName {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_NAME_LEN {
            return Err(DomainError::invalid_name(trimmed, NameRule::TooShort));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for ConferenceName {}

impl core::fmt::Display for ConferenceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated customer name: trimmed, first and last name present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_NAME_LEN {
            return Err(DomainError::invalid_name(trimmed, NameRule::TooShort));
        }
        if trimmed.split_whitespace().count() < 2 {
            return Err(DomainError::invalid_name(trimmed, NameRule::MissingLastName));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for CustomerName {}

impl core::fmt::Display for CustomerName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A brand-new request for `requested` tickets against the pool.
pub fn validate_ticket_request(requested: u32, remaining: u32) -> DomainResult<()> {
    if requested == 0 || requested > remaining {
        return Err(DomainError::invalid_ticket_count(requested, remaining));
    }
    Ok(())
}

/// A change of an existing allocation from `current` to `proposed`.
///
/// Only the increase competes against the pool; `remaining` already excludes
/// the booking's own `current` tickets.
pub fn validate_ticket_change(current: u32, proposed: u32, remaining: u32) -> DomainResult<()> {
    if proposed == 0 {
        return Err(DomainError::invalid_ticket_count(0, remaining));
    }
    if proposed > current {
        let increase = proposed - current;
        if increase > remaining {
            return Err(DomainError::invalid_ticket_count(increase, remaining));
        }
    }
    Ok(())
}

/// A conference must offer at least one ticket.
pub fn validate_total_tickets(total: u32, remaining: u32) -> DomainResult<()> {
    if total == 0 {
        return Err(DomainError::invalid_ticket_count(0, remaining));
    }
    Ok(())
}

/// `total` may never drop below the tickets held by active bookings.
pub fn validate_capacity(total: u32, active_tickets: u32) -> DomainResult<()> {
    if total < active_tickets {
        return Err(DomainError::CapacityBelowBooked {
            requested_total: total,
            active_tickets,
        });
    }
    Ok(())
}
