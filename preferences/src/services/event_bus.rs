//! Event bus for cross-component notifications
//!
//! Handlers subscribe to a named topic and are called synchronously, in
//! registration order, on the thread that emits. The bus is cheap to clone;
//! clones share one handler registry.
//!
//! A panicking handler unwinds through `emit` and the remaining handlers for
//! that emission are skipped. The registry lock is not held while handlers
//! run, so the bus stays usable afterwards and handlers may subscribe or
//! unsubscribe; such changes apply from the next emission.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handler ids are unique across every bus in the process
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registry<P> {
    topics: HashMap<String, Vec<(HandlerId, Handler<P>)>>,
}

/// Topic-based publish/subscribe channel
pub struct EventBus<P = Value> {
    registry: Arc<Mutex<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                topics: HashMap::new(),
            })),
        }
    }

    /// Register `handler` for every future emission of `topic`
    pub fn on<F>(&self, topic: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed));

        tracing::debug!("Subscribing handler {:?} to {}", id, topic);

        let handler: Handler<P> = Arc::new(handler);
        self.registry
            .lock()
            .topics
            .entry(topic)
            .or_default()
            .push((id, handler));

        id
    }

    /// Remove a registration. Returns false if it was not registered for `topic`.
    pub fn off(&self, topic: &str, id: HandlerId) -> bool {
        let mut registry = self.registry.lock();

        let Some(handlers) = registry.topics.get_mut(topic) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;

        if handlers.is_empty() {
            registry.topics.remove(topic);
        }

        removed
    }

    /// Call every handler registered for `topic` with `payload`
    pub fn emit(&self, topic: &str, payload: &P) {
        let handlers: Vec<Handler<P>> = match self.registry.lock().topics.get(topic) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };

        tracing::trace!("Emitting {} to {} handler(s)", topic, handlers.len());

        for handler in handlers {
            handler(payload);
        }
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.registry
            .lock()
            .topics
            .get(topic)
            .map_or(0, |handlers| handlers.len())
    }

    /// Drop every registration on every topic
    pub fn clear(&self) {
        self.registry.lock().topics.clear();
    }
}

lazy_static! {
    /// Process-wide event bus.
    static ref EVENT_BUS: EventBus = EventBus::new();
}

/// Handle to the process-wide event bus
pub fn event_bus() -> EventBus {
    EVENT_BUS.clone()
}
