//! Store-backed conference lifecycle.
//!
//! Name-changing operations (create, rename) serialize on one catalog lock so
//! the uniqueness check and the commit cannot interleave with another rename.
//! Lock order is always catalog first, then the conference.

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::instrument;

use boxoffice_booking::{
    Conference, ConferenceName, CreateConference, Privilege, UpdateConference, create_conference,
    ensure_unique_name, project, project_all, update_conference,
};
use boxoffice_core::{ConferenceId, IdSupplier};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::store::{ConferenceFilter, ConferenceStore};

pub struct ConferenceService<S> {
    dispatcher: Arc<CommandDispatcher<S>>,
    ids: Arc<dyn IdSupplier>,
    catalog: Arc<AsyncMutex<()>>,
}

impl<S> Clone for ConferenceService<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            ids: self.ids.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<S> ConferenceService<S>
where
    S: ConferenceStore,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S>>, ids: Arc<dyn IdSupplier>) -> Self {
        Self {
            dispatcher,
            ids,
            catalog: Arc::new(AsyncMutex::new(())),
        }
    }

    async fn ensure_name_free(
        &self,
        name: &ConferenceName,
        exclude: Option<ConferenceId>,
    ) -> Result<(), DispatchError> {
        let same_name = self
            .dispatcher
            .call(
                "fetch_many",
                self.dispatcher
                    .store()
                    .fetch_many(&ConferenceFilter::by_name(name.as_str())),
            )
            .await?;
        ensure_unique_name(name, &same_name, exclude)?;
        Ok(())
    }

    #[instrument(skip(self, name), err)]
    pub async fn create(&self, name: &str, total_tickets: u32) -> Result<Conference, DispatchError> {
        let conference = create_conference(&CreateConference {
            conference_id: self.ids.next_conference_id(),
            name: name.trim().to_string(),
            total_tickets,
        })?;

        let _catalog = self.catalog.lock().await;
        self.ensure_name_free(conference.name(), None).await?;

        let saved = self.dispatcher.insert(conference).await?;

        tracing::info!(
            conference_id = %saved.id_typed(),
            name = %saved.name(),
            total_tickets,
            "conference created"
        );
        Ok(saved)
    }

    #[instrument(skip(self, cmd), fields(%conference_id, scope = %cmd.scope), err)]
    pub async fn update(
        &self,
        conference_id: ConferenceId,
        cmd: UpdateConference,
    ) -> Result<Conference, DispatchError> {
        let mut cmd = cmd;
        cmd.changes.name = cmd.changes.name.map(|n| n.trim().to_string());

        // Held until the commit when the name may change.
        let _catalog = match cmd.proposed_name()? {
            Some(name) => {
                let guard = self.catalog.lock().await;
                self.ensure_name_free(&name, Some(conference_id)).await?;
                Some(guard)
            }
            None => None,
        };

        let committed = self
            .dispatcher
            .dispatch(conference_id, "conference.update", |conference| {
                update_conference(conference, &cmd).map(|next| (next, ()))
            })
            .await?;
        Ok(committed.conference)
    }

    #[instrument(skip(self), fields(%conference_id), err)]
    pub async fn delete(&self, conference_id: ConferenceId) -> Result<(), DispatchError> {
        let _guard = self.dispatcher.lock(conference_id).await;
        self.dispatcher.remove(conference_id).await?;
        tracing::info!(%conference_id, "conference deleted");
        Ok(())
    }

    pub async fn get(
        &self,
        conference_id: ConferenceId,
        privilege: Privilege,
    ) -> Result<Conference, DispatchError> {
        let conference = self.dispatcher.load(conference_id).await?;
        Ok(project(conference, privilege))
    }

    pub async fn list(&self, privilege: Privilege) -> Result<Vec<Conference>, DispatchError> {
        let all = self
            .dispatcher
            .call(
                "fetch_many",
                self.dispatcher.store().fetch_many(&ConferenceFilter::All),
            )
            .await?;
        Ok(project_all(all, privilege))
    }

    pub async fn active_ticket_sum(&self, conference_id: ConferenceId) -> Result<u32, DispatchError> {
        self.dispatcher
            .call(
                "sum_active_tickets",
                self.dispatcher.store().sum_active_tickets(conference_id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_booking::{ConferenceChanges, UpdateScope};
    use boxoffice_core::{AggregateRoot, DomainError, UuidV7Supplier};

    use crate::bookings::BookingService;
    use crate::command_dispatcher::DispatchSettings;
    use crate::store::InMemoryConferenceStore;

    type Store = Arc<InMemoryConferenceStore>;

    fn services() -> (ConferenceService<Store>, BookingService<Store>) {
        let store = Arc::new(InMemoryConferenceStore::new());
        let dispatcher = Arc::new(CommandDispatcher::new(store, DispatchSettings::default()));
        let ids: Arc<dyn IdSupplier> = Arc::new(UuidV7Supplier);
        (
            ConferenceService::new(dispatcher.clone(), ids.clone()),
            BookingService::new(dispatcher, ids),
        )
    }

    fn rename(name: &str) -> UpdateConference {
        UpdateConference {
            scope: UpdateScope::NameOnly,
            changes: ConferenceChanges {
                name: Some(name.to_string()),
                total_tickets: None,
            },
        }
    }

    fn resize(total: u32) -> UpdateConference {
        UpdateConference {
            scope: UpdateScope::TicketsOnly,
            changes: ConferenceChanges {
                name: None,
                total_tickets: Some(total),
            },
        }
    }

    #[tokio::test]
    async fn create_trims_and_enforces_unique_names() {
        let (conferences, _) = services();

        let saved = conferences.create("  RustConf ", 10).await.unwrap();
        assert_eq!(saved.name().as_str(), "RustConf");
        assert_eq!(saved.version(), 1);

        let err = conferences.create("RustConf", 5).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected(DomainError::DuplicateName {
                name: "RustConf".to_string()
            })
        );
    }

    #[tokio::test]
    async fn rename_checks_other_conferences_only() {
        let (conferences, _) = services();
        let a = conferences.create("RustConf", 10).await.unwrap();
        conferences.create("EuroRust", 10).await.unwrap();

        let same = conferences.update(a.id_typed(), rename("RustConf")).await.unwrap();
        assert_eq!(same.name().as_str(), "RustConf");

        let err = conferences
            .update(a.id_typed(), rename(" EuroRust "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Rejected(DomainError::DuplicateName { .. })
        ));
    }

    #[tokio::test]
    async fn lowering_total_below_booked_is_rejected() {
        let (conferences, bookings) = services();
        let conf = conferences.create("RustConf", 10).await.unwrap();
        bookings.create(conf.id_typed(), "Ferris Crab", 7).await.unwrap();
        let before = conferences
            .get(conf.id_typed(), Privilege::Privileged)
            .await
            .unwrap();

        let err = conferences.update(conf.id_typed(), resize(5)).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected(DomainError::CapacityBelowBooked {
                requested_total: 5,
                active_tickets: 7,
            })
        );

        let after = conferences
            .get(conf.id_typed(), Privilege::Privileged)
            .await
            .unwrap();
        assert_eq!(after, before);
        assert_eq!(after.version(), 2);
        assert_eq!(after.total_tickets(), 10);
        assert_eq!(after.remaining_tickets(), 3);

        let resized = conferences.update(conf.id_typed(), resize(8)).await.unwrap();
        assert_eq!(resized.remaining_tickets(), 1);
        assert_eq!(conferences.active_ticket_sum(conf.id_typed()).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn unprivileged_reads_hide_bookings() {
        let (conferences, bookings) = services();
        let conf = conferences.create("RustConf", 10).await.unwrap();
        bookings.create(conf.id_typed(), "Ferris Crab", 2).await.unwrap();

        let public = conferences
            .get(conf.id_typed(), Privilege::Unprivileged)
            .await
            .unwrap();
        assert!(public.bookings().is_empty());
        assert_eq!(public.remaining_tickets(), 8);

        let admin = conferences.list(Privilege::Privileged).await.unwrap();
        assert_eq!(admin[0].bookings().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_conference_and_bookings() {
        let (conferences, bookings) = services();
        let conf = conferences.create("RustConf", 10).await.unwrap();
        bookings.create(conf.id_typed(), "Ferris Crab", 2).await.unwrap();

        conferences.delete(conf.id_typed()).await.unwrap();

        let err = conferences.delete(conf.id_typed()).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected(DomainError::conference_not_found(conf.id_typed()))
        );
        assert!(bookings.list(conf.id_typed()).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_same_name_admit_one() {
        let (conferences, _) = services();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let conferences = conferences.clone();
                tokio::spawn(async move { conferences.create("RustConf", 10).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conferences.list(Privilege::Privileged).await.unwrap().len(), 1);
    }
}
