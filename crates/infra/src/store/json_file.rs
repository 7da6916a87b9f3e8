//! Local JSON file store.
//!
//! The whole collection lives in one pretty-printed JSON array. A missing file
//! is created as `[]` on open. Writes go to a sibling `.tmp` file which is
//! synced and renamed over the original, so readers of the file never see a
//! partial document.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::instrument;

use boxoffice_booking::Conference;
use boxoffice_core::{ConferenceId, ExpectedVersion};

use super::collection::Collection;
use super::{ConferenceFilter, ConferenceStore, StoreError};

#[derive(Debug, Clone)]
pub struct JsonFileConferenceStore {
    path: Arc<PathBuf>,
    state: Arc<Mutex<Collection>>,
}

impl JsonFileConferenceStore {
    /// Load the collection from `path`, creating an empty one if absent.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let loaded = tokio::task::spawn_blocking({
            let path = path.clone();
            move || load_or_create(&path)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("file store task failed: {e}")))??;

        tracing::debug!(path = %path.display(), "json file store opened");
        Ok(Self {
            path: Arc::new(path),
            state: Arc::new(Mutex::new(loaded)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Collection) -> T) -> Result<T, StoreError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    /// Apply `f` to a copy of the collection, persist the copy, then swap it in.
    ///
    /// Runs on the blocking pool under the state lock. A caller that stopped
    /// waiting before the task got the lock gets no write at all; once the task
    /// holds the lock it finishes, and any later read waits for it.
    async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let state = self.state.clone();
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let result = state
                .lock()
                .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
                .and_then(|mut guard| {
                    if tx.is_closed() {
                        tracing::debug!(path = %path.display(), "caller gone, write skipped");
                        return Err(StoreError::Unavailable("write abandoned".to_string()));
                    }
                    let mut next = guard.clone();
                    let out = f(&mut next)?;
                    write_atomically(&path, &next)?;
                    *guard = next;
                    Ok(out)
                });
            let _ = tx.send(result);
        });

        rx.await
            .map_err(|_| StoreError::Unavailable("file store task failed".to_string()))?
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}

fn load_or_create(path: &Path) -> Result<Collection, StoreError> {
    if !path.exists() {
        let empty = Collection::default();
        write_atomically(path, &empty)?;
        return Ok(empty);
    }

    let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    if raw.trim().is_empty() {
        return Ok(Collection::default());
    }
    serde_json::from_str(&raw).map_err(|e| io_error(path, e))
}

fn write_atomically(path: &Path, collection: &Collection) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(collection).map_err(|e| io_error(path, e))?;
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let mut file = File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
    file.write_all(json.as_bytes())
        .map_err(|e| io_error(&temp_path, e))?;
    file.sync_all().map_err(|e| io_error(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| io_error(path, e))?;
    Ok(())
}

#[async_trait]
impl ConferenceStore for JsonFileConferenceStore {
    async fn fetch_one(&self, id: ConferenceId) -> Result<Conference, StoreError> {
        self.read(|c| c.get(id))?
    }

    async fn fetch_many(&self, filter: &ConferenceFilter) -> Result<Vec<Conference>, StoreError> {
        self.read(|c| c.filter(filter))
    }

    #[instrument(skip(self, conference), fields(conference_id = %conference.id_typed()), err)]
    async fn insert_one(&self, conference: Conference) -> Result<Conference, StoreError> {
        self.mutate(move |c| c.insert(conference)).await
    }

    #[instrument(skip(self, conference), fields(conference_id = %conference.id_typed(), expected = ?expected), err)]
    async fn replace_one(
        &self,
        conference: Conference,
        expected: ExpectedVersion,
    ) -> Result<Conference, StoreError> {
        self.mutate(move |c| c.replace(conference, expected)).await
    }

    #[instrument(skip(self), fields(conference_id = %id), err)]
    async fn delete_one(&self, id: ConferenceId) -> Result<(), StoreError> {
        self.mutate(move |c| c.remove(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_booking::{CreateBooking, CreateConference, create_booking, create_conference};
    use boxoffice_core::{AggregateRoot, BookingId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn conference(name: &str) -> Conference {
        create_conference(&CreateConference {
            conference_id: ConferenceId::new(),
            name: name.to_string(),
            total_tickets: 10,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_created_as_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database").join("conferences.json");

        let store = JsonFileConferenceStore::open(path.clone()).await.unwrap();
        assert!(store.fetch_many(&ConferenceFilter::All).await.unwrap().is_empty());

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "[]");
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conferences.json");

        let store = JsonFileConferenceStore::open(path.clone()).await.unwrap();
        let saved = store.insert_one(conference("RustConf")).await.unwrap();
        let booked = create_booking(
            &saved,
            &CreateBooking {
                booking_id: BookingId::new(),
                customer_name: "Ferris Crab".to_string(),
                tickets_booked: 4,
                occurred_at: Utc::now(),
            },
        )
        .unwrap()
        .conference;
        store
            .replace_one(booked, ExpectedVersion::Exact(saved.version()))
            .await
            .unwrap();

        let reopened = JsonFileConferenceStore::open(path.clone()).await.unwrap();
        let loaded = reopened.fetch_one(saved.id_typed()).await.unwrap();
        assert_eq!(loaded.version(), 2);
        assert_eq!(loaded.remaining_tickets(), 6);
        assert_eq!(loaded.bookings().len(), 1);
        assert_eq!(reopened.sum_active_tickets(saved.id_typed()).await.unwrap(), 4);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["conference_name"], "RustConf");
        assert_eq!(raw[0]["bookings"][0]["customer_name"], "Ferris Crab");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn rejected_write_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conferences.json");

        let store = JsonFileConferenceStore::open(path.clone()).await.unwrap();
        store.insert_one(conference("RustConf")).await.unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = store.insert_one(conference("RustConf")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn abandoned_write_is_never_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conferences.json");
        let store = JsonFileConferenceStore::open(path.clone()).await.unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // Hold the state lock so the write cannot start, then give up on it.
        let held = store.state.lock().unwrap();
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            store.insert_one(conference("RustConf")),
        )
        .await;
        assert!(pending.is_err());
        drop(held);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(store.fetch_many(&ConferenceFilter::All).await.unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }
}
