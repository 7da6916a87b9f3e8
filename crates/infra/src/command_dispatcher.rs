//! Command execution pipeline for conference aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Acquire the conference's critical section
//!   ↓
//! 2. Fetch the current aggregate (with its version)
//!   ↓
//! 3. Decide (pure domain logic, returns a new aggregate or a rejection)
//!   ↓
//! 4. Replace with ExpectedVersion::Exact(loaded version)
//!   ↓
//! 5. On version conflict: re-fetch and re-decide, up to the retry budget
//! ```
//!
//! Every store call runs under a timeout. A write that times out is checked
//! against the stored aggregate before it is reported as failed, so
//! `StoreUnavailable` from a write means nothing was stored. The dispatcher
//! holds no state besides the injected store, the lock registry and its
//! settings.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use boxoffice_booking::Conference;
use boxoffice_core::{AggregateRoot, ConferenceId, DomainError, DomainResult, ExpectedVersion};

use crate::locks::{ConferenceGuard, ConferenceLocks};
use crate::store::{ConferenceStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Deterministic domain rejection. Retrying the same request cannot help.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// Another writer committed first and the retry budget ran out.
    #[error("conference {conference_id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        conference_id: ConferenceId,
        expected: u64,
        actual: u64,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::ConcurrentModification { .. })
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(conference_id) => {
                DispatchError::Rejected(DomainError::conference_not_found(conference_id))
            }
            StoreError::Conflict {
                conference_id,
                expected,
                actual,
            } => DispatchError::ConcurrentModification {
                conference_id,
                expected: expected.exact().unwrap_or(actual),
                actual,
            },
            StoreError::DuplicateKey(name) => {
                DispatchError::Rejected(DomainError::DuplicateName { name })
            }
            StoreError::Unavailable(msg) => DispatchError::StoreUnavailable(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub store_timeout: Duration,
    /// Extra attempts after the first version conflict.
    pub conflict_retries: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5000),
            conflict_retries: 3,
        }
    }
}

/// A committed decision: the aggregate as stored plus whatever the decision
/// returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub conference: Conference,
    pub output: T,
}

#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
    locks: ConferenceLocks,
    settings: DispatchSettings,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S, settings: DispatchSettings) -> Self {
        Self {
            store,
            locks: ConferenceLocks::new(),
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> DispatchSettings {
        self.settings
    }

    /// Enter the conference's critical section without dispatching.
    pub async fn lock(&self, conference_id: ConferenceId) -> ConferenceGuard {
        self.locks.acquire(conference_id).await
    }

    /// Await a store call under the configured timeout.
    pub async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, DispatchError> {
        match tokio::time::timeout(self.settings.store_timeout, fut).await {
            Ok(result) => result.map_err(DispatchError::from),
            Err(_) => Err(self.timed_out(operation)),
        }
    }

    fn timed_out(&self, operation: &'static str) -> DispatchError {
        let timeout_ms = self.settings.store_timeout.as_millis() as u64;
        tracing::warn!(operation, timeout_ms, "store call timed out");
        DispatchError::StoreUnavailable(format!("{operation} timed out after {timeout_ms}ms"))
    }
}

impl<S> CommandDispatcher<S>
where
    S: ConferenceStore,
{
    /// Persist a brand-new conference.
    pub async fn insert(&self, conference: Conference) -> Result<Conference, DispatchError> {
        let conference_id = conference.id_typed();
        let attempted = conference.clone();
        self.write(
            "insert_one",
            conference_id,
            self.store.insert_one(conference),
            |current| current.filter(|stored| same_content(stored, &attempted)),
        )
        .await
    }

    /// Delete a conference. The caller holds its critical section.
    pub async fn remove(&self, conference_id: ConferenceId) -> Result<(), DispatchError> {
        self.write(
            "delete_one",
            conference_id,
            self.store.delete_one(conference_id),
            |current| current.is_none().then_some(()),
        )
        .await
    }

    async fn commit(
        &self,
        next: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, DispatchError> {
        let conference_id = next.id_typed();
        let attempted = next.clone();
        let landed_version = expected.exact().map(|v| v + 1);
        self.write(
            "replace_one",
            conference_id,
            self.store.replace_one(next, expected),
            |current| {
                current.filter(|stored| {
                    Some(stored.version()) == landed_version && same_content(stored, &attempted)
                })
            },
        )
        .await
    }

    /// Run a write under the timeout. When it times out the write may still
    /// have been applied, so the stored state decides: `landed` maps it to the
    /// write's result, or `None` when the write did not happen.
    async fn write<T>(
        &self,
        operation: &'static str,
        conference_id: ConferenceId,
        fut: impl Future<Output = Result<T, StoreError>>,
        landed: impl FnOnce(Option<Conference>) -> Option<T>,
    ) -> Result<T, DispatchError> {
        let timed_out = match tokio::time::timeout(self.settings.store_timeout, fut).await {
            Ok(result) => return result.map_err(DispatchError::from),
            Err(_) => self.timed_out(operation),
        };

        let current = match self.call("fetch_one", self.store.fetch_one(conference_id)).await {
            Ok(conference) => Some(conference),
            Err(DispatchError::Rejected(DomainError::ConferenceNotFound { .. })) => None,
            Err(err) => return Err(err),
        };

        match landed(current) {
            Some(out) => {
                tracing::info!(%conference_id, operation, "timed-out write was applied");
                Ok(out)
            }
            None => Err(timed_out),
        }
    }

    /// Run `decide` against the latest stored aggregate inside the
    /// conference's critical section and persist the result.
    ///
    /// `decide` may run more than once when a version conflict is retried; it
    /// must be a pure function of the aggregate it is handed.
    pub async fn dispatch<T, F>(
        &self,
        conference_id: ConferenceId,
        kind: &'static str,
        decide: F,
    ) -> Result<Committed<T>, DispatchError>
    where
        F: Fn(&Conference) -> DomainResult<(Conference, T)>,
    {
        let _guard = self.lock(conference_id).await;
        let mut attempt = 0u32;

        loop {
            let loaded = self
                .call("fetch_one", self.store.fetch_one(conference_id))
                .await?;
            let expected = ExpectedVersion::Exact(loaded.version());

            let (next, output) = decide(&loaded).inspect_err(|e| {
                tracing::warn!(%conference_id, kind, code = e.code(), error = %e, "command rejected");
            })?;

            match self.commit(next, expected).await {
                Ok(conference) => {
                    tracing::info!(
                        %conference_id,
                        kind,
                        version = conference.version(),
                        remaining_tickets = conference.remaining_tickets(),
                        "command committed"
                    );
                    return Ok(Committed { conference, output });
                }
                Err(err) if err.is_retryable() && attempt < self.settings.conflict_retries => {
                    attempt += 1;
                    tracing::debug!(%conference_id, kind, attempt, error = %err, "retrying after version conflict");
                }
                Err(err) => {
                    tracing::warn!(%conference_id, kind, error = %err, "command not committed");
                    return Err(err);
                }
            }
        }
    }

    pub async fn load(&self, conference_id: ConferenceId) -> Result<Conference, DispatchError> {
        self.call("fetch_one", self.store.fetch_one(conference_id))
            .await
    }
}

/// Equal apart from the store-stamped version.
fn same_content(stored: &Conference, attempted: &Conference) -> bool {
    stored.clone().with_version(attempted.version()) == *attempted
}
