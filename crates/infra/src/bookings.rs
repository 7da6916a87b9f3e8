//! Store-backed booking operations.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use boxoffice_booking::{
    Booking, BookingChanges, BookingCommand, BookingOutcome, CancelBooking, CreateBooking,
    UpdateBooking, UpdateScope,
};
use boxoffice_core::{BookingId, ConferenceId, DomainError, IdSupplier};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::store::ConferenceStore;

pub struct BookingService<S> {
    dispatcher: Arc<CommandDispatcher<S>>,
    ids: Arc<dyn IdSupplier>,
}

impl<S> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            ids: self.ids.clone(),
        }
    }
}

impl<S> BookingService<S>
where
    S: ConferenceStore,
{
    pub fn new(dispatcher: Arc<CommandDispatcher<S>>, ids: Arc<dyn IdSupplier>) -> Self {
        Self { dispatcher, ids }
    }

    async fn execute(
        &self,
        conference_id: ConferenceId,
        command: BookingCommand,
    ) -> Result<BookingOutcome, DispatchError> {
        let committed = self
            .dispatcher
            .dispatch(conference_id, command.kind(), |conference| {
                conference
                    .handle(&command)
                    .map(|outcome| (outcome.conference, outcome.booking))
            })
            .await?;

        Ok(BookingOutcome {
            conference: committed.conference,
            booking: committed.output,
        })
    }

    #[instrument(skip(self, customer_name), fields(%conference_id), err)]
    pub async fn create(
        &self,
        conference_id: ConferenceId,
        customer_name: &str,
        tickets_booked: u32,
    ) -> Result<BookingOutcome, DispatchError> {
        let command = BookingCommand::Create(CreateBooking {
            booking_id: self.ids.next_booking_id(),
            customer_name: customer_name.trim().to_string(),
            tickets_booked,
            occurred_at: Utc::now(),
        });
        self.execute(conference_id, command).await
    }

    #[instrument(skip(self, changes), fields(%conference_id, %booking_id, %scope), err)]
    pub async fn update(
        &self,
        conference_id: ConferenceId,
        booking_id: BookingId,
        scope: UpdateScope,
        changes: BookingChanges,
    ) -> Result<BookingOutcome, DispatchError> {
        let changes = BookingChanges {
            customer_name: changes.customer_name.map(|n| n.trim().to_string()),
            ..changes
        };
        let command = BookingCommand::Update(UpdateBooking {
            booking_id,
            scope,
            changes,
            occurred_at: Utc::now(),
        });
        self.execute(conference_id, command).await
    }

    #[instrument(skip(self), fields(%conference_id, %booking_id), err)]
    pub async fn cancel(
        &self,
        conference_id: ConferenceId,
        booking_id: BookingId,
    ) -> Result<BookingOutcome, DispatchError> {
        let command = BookingCommand::Cancel(CancelBooking {
            booking_id,
            occurred_at: Utc::now(),
        });
        self.execute(conference_id, command).await
    }

    pub async fn get(
        &self,
        conference_id: ConferenceId,
        booking_id: BookingId,
    ) -> Result<Booking, DispatchError> {
        let conference = self.dispatcher.load(conference_id).await?;
        conference.booking(&booking_id).cloned().ok_or(
            DomainError::BookingNotFound {
                conference_id,
                booking_id,
            }
            .into(),
        )
    }

    pub async fn list(&self, conference_id: ConferenceId) -> Result<Vec<Booking>, DispatchError> {
        let conference = self.dispatcher.load(conference_id).await?;
        Ok(conference.bookings().to_vec())
    }
}
