//! Application state and initialization
//!
//! Wires the preferences store and the event bus together for the rest of
//! the application. Tests build their own state from an isolated factory.

use crate::services::{event_bus, store_factory, EventBus, StoreFactory, StoreHandle};
use crate::storage::{init_directory, ConfigDir};
use std::path::Path;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub events: EventBus,
}

impl AppState {
    pub fn new(store: StoreHandle, events: EventBus) -> Self {
        Self { store, events }
    }
}

/// Application setup against the process-wide store and event bus
pub fn setup() -> AppState {
    setup_with(store_factory(), event_bus())
}

/// Application setup against an explicit factory and bus
pub fn setup_with(factory: &StoreFactory, events: EventBus) -> AppState {
    tracing::info!("Initializing preferences");

    let config_dir = factory.config_dir();
    tracing::info!("Config directory: {:?}", config_dir.root());

    // Best effort; without the directory the store keeps working in memory
    let _ = init_directory(config_dir.as_ref(), Path::new(""));

    let state = AppState::new(factory.create_store(), events);

    tracing::info!("Preferences initialized successfully");

    state
}
