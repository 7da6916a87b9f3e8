//! Ordered conference collection shared by the in-process backends.
//!
//! Enforces the same key rules as the Postgres schema: unique id, unique
//! name, version check on replace.

use serde::{Deserialize, Serialize};

use boxoffice_booking::Conference;
use boxoffice_core::{AggregateRoot, ConferenceId, ExpectedVersion};

use super::{ConferenceFilter, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Collection(Vec<Conference>);

impl Collection {
    fn position(&self, id: ConferenceId) -> Option<usize> {
        self.0.iter().position(|c| c.id_typed() == id)
    }

    fn name_taken(&self, conference: &Conference) -> bool {
        self.0
            .iter()
            .any(|c| c.id_typed() != conference.id_typed() && c.name() == conference.name())
    }

    pub(crate) fn get(&self, id: ConferenceId) -> Result<Conference, StoreError> {
        self.position(id)
            .map(|idx| self.0[idx].clone())
            .ok_or(StoreError::NotFound(id))
    }

    pub(crate) fn filter(&self, filter: &ConferenceFilter) -> Vec<Conference> {
        self.0.iter().filter(|c| filter.matches(c)).cloned().collect()
    }

    pub(crate) fn insert(&mut self, conference: Conference) -> Result<Conference, StoreError> {
        if self.position(conference.id_typed()).is_some() || self.name_taken(&conference) {
            return Err(StoreError::DuplicateKey(conference.name().to_string()));
        }
        let stored = conference.with_version(1);
        self.0.push(stored.clone());
        Ok(stored)
    }

    pub(crate) fn replace(
        &mut self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError> {
        let id = conference.id_typed();
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;

        let actual = self.0[idx].version();
        expected.check(actual).map_err(|m| StoreError::Conflict {
            conference_id: id,
            expected: m.expected,
            actual: m.actual,
        })?;

        if self.name_taken(&conference) {
            return Err(StoreError::DuplicateKey(conference.name().to_string()));
        }

        let stored = conference.with_version(actual + 1);
        self.0[idx] = stored.clone();
        Ok(stored)
    }

    pub(crate) fn remove(&mut self, id: ConferenceId) -> Result<(), StoreError> {
        let idx = self.position(id).ok_or(StoreError::NotFound(id))?;
        self.0.remove(idx);
        Ok(())
    }
}
