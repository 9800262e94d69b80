//! Event dispatcher.
//!
//! Routes decoded events to listeners registered per method, then to the
//! catch-all listeners. Invocation happens on the connection's reader task,
//! so listeners must be quick; a slow listener delays every frame behind it.
//!
//! # Ordering
//!
//! Listeners for one method run in registration order, followed by the
//! catch-all listeners in registration order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{trace, warn};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::protocol::BidiEvent;

// ============================================================================
// Types
// ============================================================================

/// Event listener callback.
pub type Listener = Arc<dyn Fn(&BidiEvent) + Send + Sync>;

/// Handle returned by registration, used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener lists, guarded by one lock.
#[derive(Default)]
struct Registry {
    next_id: u64,
    by_method: FxHashMap<String, Vec<(ListenerId, Listener)>>,
    catch_all: Vec<(ListenerId, Listener)>,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

// ============================================================================
// EventDispatcher
// ============================================================================

/// Method-keyed listener registry plus catch-all listeners.
pub struct EventDispatcher {
    codec: Arc<Codec>,
    registry: Mutex<Registry>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventDispatcher")
            .field("methods", &registry.by_method.len())
            .field("catch_all", &registry.catch_all.len())
            .finish()
    }
}

impl EventDispatcher {
    /// Creates an empty dispatcher decoding with `codec`.
    #[must_use]
    pub fn new(codec: Arc<Codec>) -> Self {
        Self {
            codec,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Registers a listener for one event method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no typed decoder exists for
    /// `method`; such events only reach catch-all listeners.
    pub fn on<F>(&self, method: &str, listener: F) -> Result<ListenerId>
    where
        F: Fn(&BidiEvent) + Send + Sync + 'static,
    {
        if !self.codec.has_event_decoder(method) {
            return Err(Error::invalid_argument(format!(
                "no typed decoder for event {method}; use a catch-all listener"
            )));
        }

        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry
            .by_method
            .entry(method.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        trace!(method, ?id, "Listener registered");
        Ok(id)
    }

    /// Registers a listener invoked for every event.
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&BidiEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.catch_all.push((id, Arc::new(listener)));
        trace!(?id, "Catch-all listener registered");
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();

        if let Some(index) = registry.catch_all.iter().position(|(l, _)| *l == id) {
            registry.catch_all.remove(index);
            return true;
        }

        let mut removed = false;
        registry.by_method.retain(|_, listeners| {
            if let Some(index) = listeners.iter().position(|(l, _)| *l == id) {
                listeners.remove(index);
                removed = true;
            }
            !listeners.is_empty()
        });
        removed
    }

    /// Returns the total number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.lock();
        registry.catch_all.len() + registry.by_method.values().map(Vec::len).sum::<usize>()
    }

    /// Decodes and delivers one event.
    ///
    /// Methods without a decoder become [`BidiEvent::Unknown`] and reach only
    /// catch-all listeners. A payload that fails to decode is logged and
    /// dropped.
    pub fn dispatch(&self, method: String, params: Value) {
        let event = if self.codec.has_event_decoder(&method) {
            match self.codec.decode_event(&method, params) {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    warn!(method = %method, error = %e, "Dropping undecodable event");
                    return;
                }
                None => return,
            }
        } else {
            BidiEvent::Unknown { method, params }
        };

        self.deliver(&event);
    }

    /// Invokes the listeners for an already decoded event.
    pub fn deliver(&self, event: &BidiEvent) {
        // Snapshot so listeners may register or remove listeners.
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock();
            let specific = registry
                .by_method
                .get(event.method())
                .into_iter()
                .flatten();
            specific
                .chain(registry.catch_all.iter())
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };

        trace!(method = event.method(), listeners = listeners.len(), "Dispatching event");

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(method = event.method(), "Event listener panicked");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    fn dispatcher() -> EventDispatcher {
        EventDispatcher::new(Arc::new(Codec::new()))
    }

    fn load_params() -> Value {
        json!({ "context": "ctx", "navigation": "n", "timestamp": 1, "url": "about:blank" })
    }

    #[test]
    fn test_method_listeners_run_before_catch_all_in_order() {
        let dispatcher = dispatcher();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        dispatcher.on_any(move |_| o.lock().push("any"));
        let o = Arc::clone(&order);
        dispatcher
            .on("browsingContext.load", move |_| o.lock().push("first"))
            .expect("register");
        let o = Arc::clone(&order);
        dispatcher
            .on("browsingContext.load", move |_| o.lock().push("second"))
            .expect("register");

        dispatcher.dispatch("browsingContext.load".into(), load_params());

        assert_eq!(*order.lock(), ["first", "second", "any"]);
    }

    #[test]
    fn test_unknown_method_reaches_catch_all_only() {
        let dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        dispatcher.on_any(move |event| s.lock().push(event.method().to_string()));

        dispatcher.dispatch("vendor.somethingNew".into(), json!({ "x": 1 }));

        assert_eq!(*seen.lock(), ["vendor.somethingNew"]);
    }

    #[test]
    fn test_on_rejects_undecodable_method() {
        let dispatcher = dispatcher();
        let err = dispatcher.on("vendor.somethingNew", |_| {}).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_bad_payload_is_dropped() {
        let dispatcher = dispatcher();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        dispatcher.on_any(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch("browsingContext.load".into(), json!({ "context": 5 }));
        dispatcher.dispatch("browsingContext.load".into(), load_params());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let dispatcher = dispatcher();
        let count = Arc::new(AtomicUsize::new(0));

        dispatcher.on_any(|_| panic!("listener bug"));
        let c = Arc::clone(&count);
        dispatcher.on_any(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch("browsingContext.load".into(), load_params());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let dispatcher = dispatcher();
        let id = dispatcher
            .on("log.entryAdded", |_| {})
            .expect("register");
        let any = dispatcher.on_any(|_| {});

        assert_eq!(dispatcher.listener_count(), 2);
        assert!(dispatcher.remove(id));
        assert!(dispatcher.remove(any));
        assert!(!dispatcher.remove(id));
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
