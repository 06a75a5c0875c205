//! Services module
//!
//! The preferences store, its schema, and the process-wide event bus.

pub mod event_bus;
pub mod preferences;
pub mod store;

pub use event_bus::{event_bus, EventBus, HandlerId};
pub use preferences::{default_document, GlobalShortcuts, PreferenceKey, Preferences};
pub use store::{
    create_store, load_or_initialize, store_factory, DocumentSource, Loaded, PreferencesStore,
    StoreFactory, StoreHandle,
};
