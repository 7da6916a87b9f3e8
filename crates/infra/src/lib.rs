//! Infrastructure layer: persistence, locking, command dispatch, config.

pub mod bookings;
pub mod command_dispatcher;
pub mod conferences;
pub mod config;
pub mod locks;
pub mod store;

pub use bookings::BookingService;
pub use command_dispatcher::{CommandDispatcher, Committed, DispatchError, DispatchSettings};
pub use conferences::ConferenceService;
pub use config::{AppConfig, ConfigError};
pub use locks::{ConferenceGuard, ConferenceLocks};
pub use store::{ConferenceFilter, ConferenceStore, StoreBackend, StoreError};
