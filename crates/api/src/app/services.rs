//! Service wiring: one store, one dispatcher, shared by both services.

use std::sync::Arc;

use boxoffice_core::{IdSupplier, UuidV7Supplier};
use boxoffice_infra::store::InMemoryConferenceStore;
use boxoffice_infra::{
    BookingService, CommandDispatcher, ConferenceService, ConferenceStore, DispatchSettings,
};

pub type SharedStore = Arc<dyn ConferenceStore>;

pub struct AppServices {
    pub conferences: ConferenceService<SharedStore>,
    pub bookings: BookingService<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore, settings: DispatchSettings) -> Self {
        let dispatcher = Arc::new(CommandDispatcher::new(store, settings));
        let ids: Arc<dyn IdSupplier> = Arc::new(UuidV7Supplier);

        Self {
            conferences: ConferenceService::new(dispatcher.clone(), ids.clone()),
            bookings: BookingService::new(dispatcher, ids),
        }
    }

    /// Services over a fresh in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryConferenceStore::new()),
            DispatchSettings::default(),
        )
    }
}
