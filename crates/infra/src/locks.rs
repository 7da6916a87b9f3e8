//! Per-conference async mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use boxoffice_core::ConferenceId;

type LockMap = HashMap<ConferenceId, Arc<AsyncMutex<()>>>;

/// Registry of one async mutex per conference id.
///
/// Entries are created on first use and pruned when the last holder or waiter
/// goes away, so the map only ever holds conferences with work in flight.
#[derive(Debug, Clone, Default)]
pub struct ConferenceLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one critical section.
#[derive(Debug)]
pub struct ConferenceGuard {
    conference_id: ConferenceId,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Arc<Mutex<LockMap>>,
}

impl ConferenceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, conference_id: ConferenceId) -> ConferenceGuard {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(conference_id).or_default().clone()
        };

        if lock.try_lock().is_err() {
            tracing::debug!(%conference_id, "waiting for conference lock");
        }
        let guard = lock.lock_owned().await;

        ConferenceGuard {
            conference_id,
            guard: Some(guard),
            registry: self.inner.clone(),
        }
    }

    /// Number of conferences with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or_default()
    }
}

impl ConferenceGuard {
    pub fn conference_id(&self) -> ConferenceId {
        self.conference_id
    }
}

impl Drop for ConferenceGuard {
    fn drop(&mut self) {
        // Release first so the strong count below reflects other users only.
        drop(self.guard.take());

        let mut map = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let idle = map
            .get(&self.conference_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            map.remove(&self.conference_id);
        }
    }
}
