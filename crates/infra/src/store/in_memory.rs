use std::sync::RwLock;

use async_trait::async_trait;

use boxoffice_booking::Conference;
use boxoffice_core::{ConferenceId, ExpectedVersion};

use super::collection::Collection;
use super::{ConferenceFilter, ConferenceStore, StoreError};

/// In-memory conference store.
///
/// Intended for tests/dev. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryConferenceStore {
    inner: RwLock<Collection>,
}

impl InMemoryConferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Collection) -> T) -> Result<T, StoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

#[async_trait]
impl ConferenceStore for InMemoryConferenceStore {
    async fn fetch_one(&self, id: ConferenceId) -> Result<Conference, StoreError> {
        self.read(|c| c.get(id))?
    }

    async fn fetch_many(&self, filter: &ConferenceFilter) -> Result<Vec<Conference>, StoreError> {
        self.read(|c| c.filter(filter))
    }

    async fn insert_one(&self, conference: Conference) -> Result<Conference, StoreError> {
        self.write(|c| c.insert(conference))
    }

    async fn replace_one(
        &self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError> {
        self.write(|c| c.replace(conference, expected))
    }

    async fn delete_one(&self, id: ConferenceId) -> Result<(), StoreError> {
        self.write(|c| c.remove(id))
    }
}
