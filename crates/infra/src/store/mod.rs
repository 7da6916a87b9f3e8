//! Conference persistence boundary.
//!
//! A store persists whole `Conference` aggregates (bookings embedded). Every
//! write is a single atomic operation: a map update under a lock, a temp-file
//! rename, or one SQL statement. Stores stamp the persistence `version`:
//! 1 on insert, +1 per replace.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use boxoffice_booking::Conference;
use boxoffice_core::{ConferenceId, ExpectedVersion};

mod collection;
pub mod in_memory;
pub mod json_file;
pub mod postgres;

pub use in_memory::InMemoryConferenceStore;
pub use json_file::JsonFileConferenceStore;
pub use postgres::PostgresConferenceStore;

/// Store operation error.
///
/// These are infrastructure outcomes; mapping them to domain rejections is
/// the dispatcher's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conference {0} not found")]
    NotFound(ConferenceId),

    #[error("version conflict on conference {conference_id}: expected {expected:?}, found {actual}")]
    Conflict {
        conference_id: ConferenceId,
        expected: ExpectedVersion,
        actual: u64,
    },

    /// Unique index violation. Carries the conflicting conference name.
    #[error("duplicate key: conference name '{0}' is taken")]
    DuplicateKey(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Which conferences `fetch_many` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceFilter {
    All,
    /// Exact match on the trimmed name.
    Name(String),
}

impl ConferenceFilter {
    pub fn by_name(name: impl AsRef<str>) -> Self {
        Self::Name(name.as_ref().trim().to_string())
    }

    pub fn matches(&self, conference: &Conference) -> bool {
        match self {
            ConferenceFilter::All => true,
            ConferenceFilter::Name(name) => conference.name().as_str() == name,
        }
    }
}

#[async_trait]
pub trait ConferenceStore: Send + Sync {
    async fn fetch_one(&self, id: ConferenceId) -> Result<Conference, StoreError>;

    /// Matching conferences in insertion order.
    async fn fetch_many(&self, filter: &ConferenceFilter) -> Result<Vec<Conference>, StoreError>;

    /// Persist a new aggregate. Fails with `DuplicateKey` if the id or the
    /// name is already stored.
    async fn insert_one(&self, conference: Conference) -> Result<Conference, StoreError>;

    /// Overwrite the stored aggregate if its version matches `expected`.
    async fn replace_one(
        &self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError>;

    async fn delete_one(&self, id: ConferenceId) -> Result<(), StoreError>;

    /// Σ tickets over the conference's active bookings.
    async fn sum_active_tickets(&self, id: ConferenceId) -> Result<u32, StoreError> {
        Ok(self.fetch_one(id).await?.active_ticket_sum())
    }
}

#[async_trait]
impl<S> ConferenceStore for Arc<S>
where
    S: ConferenceStore + ?Sized,
{
    async fn fetch_one(&self, id: ConferenceId) -> Result<Conference, StoreError> {
        (**self).fetch_one(id).await
    }

    async fn fetch_many(&self, filter: &ConferenceFilter) -> Result<Vec<Conference>, StoreError> {
        (**self).fetch_many(filter).await
    }

    async fn insert_one(&self, conference: Conference) -> Result<Conference, StoreError> {
        (**self).insert_one(conference).await
    }

    async fn replace_one(
        &self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError> {
        (**self).replace_one(conference, expected).await
    }

    async fn delete_one(&self, id: ConferenceId) -> Result<(), StoreError> {
        (**self).delete_one(id).await
    }

    async fn sum_active_tickets(&self, id: ConferenceId) -> Result<u32, StoreError> {
        (**self).sum_active_tickets(id).await
    }
}

/// Which backend to open at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File(std::path::PathBuf),
    Postgres { url: String },
}

impl StoreBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File(_) => "file",
            StoreBackend::Postgres { .. } => "postgres",
        }
    }
}

/// Open the configured backend as a shared trait object.
pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn ConferenceStore>, StoreError> {
    let store: Arc<dyn ConferenceStore> = match backend {
        StoreBackend::Memory => Arc::new(InMemoryConferenceStore::new()),
        StoreBackend::File(path) => Arc::new(JsonFileConferenceStore::open(path.clone()).await?),
        StoreBackend::Postgres { url } => {
            let store = PostgresConferenceStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };
    tracing::info!(backend = backend.kind(), "conference store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_booking::{CreateConference, create_conference};

    #[test]
    fn name_filter_trims_and_matches_exactly() {
        let conf = create_conference(&CreateConference {
            conference_id: ConferenceId::new(),
            name: "RustConf".to_string(),
            total_tickets: 5,
        })
        .unwrap();

        assert!(ConferenceFilter::by_name("  RustConf ").matches(&conf));
        assert!(!ConferenceFilter::by_name("rustconf").matches(&conf));
        assert!(ConferenceFilter::All.matches(&conf));
    }
}
