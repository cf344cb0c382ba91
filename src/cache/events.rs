//! Cache Events Module
//!
//! Observer registry for cache notifications. Callbacks run after the
//! triggering mutation has completed, and a panicking callback is contained.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::warn;

use crate::cache::EvictionPolicy;
use crate::config::CacheConfig;

// == Eviction Reason ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionReason {
    /// Entry count limit
    Capacity,
    /// Byte limit
    Memory,
}

// == Cache Event ==
/// Notification published after a cache operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CacheEvent {
    Set {
        key: String,
        size_bytes: usize,
    },
    Hit {
        key: String,
    },
    Miss {
        key: String,
    },
    Delete {
        key: String,
    },
    Eviction {
        key: String,
        size_bytes: usize,
        reason: EvictionReason,
    },
    Cleanup {
        expired: usize,
        evicted: usize,
    },
    Clear {
        entries: usize,
        memory_usage: usize,
    },
    PolicyChange {
        from: EvictionPolicy,
        to: EvictionPolicy,
    },
    ConfigUpdate {
        config: CacheConfig,
    },
}

impl CacheEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CacheEvent::Set { .. } => EventKind::Set,
            CacheEvent::Hit { .. } => EventKind::Hit,
            CacheEvent::Miss { .. } => EventKind::Miss,
            CacheEvent::Delete { .. } => EventKind::Delete,
            CacheEvent::Eviction { .. } => EventKind::Eviction,
            CacheEvent::Cleanup { .. } => EventKind::Cleanup,
            CacheEvent::Clear { .. } => EventKind::Clear,
            CacheEvent::PolicyChange { .. } => EventKind::PolicyChange,
            CacheEvent::ConfigUpdate { .. } => EventKind::ConfigUpdate,
        }
    }
}

// == Event Kind ==
/// Event name a subscriber registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Set,
    Hit,
    Miss,
    Delete,
    Eviction,
    Cleanup,
    Clear,
    PolicyChange,
    ConfigUpdate,
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&CacheEvent) + Send + Sync + 'static>;

// == Event Bus ==
/// Callbacks registered per event kind, invoked in registration order.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<(SubscriptionId, Callback)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(handler_id, _)| *handler_id == id) {
                drop(handlers.remove(pos));
                return true;
            }
        }
        false
    }

    // == Emit ==
    /// Delivers an event to every subscriber of its kind.
    ///
    /// Returns how many callbacks panicked; those panics are logged and
    /// swallowed.
    pub fn emit(&self, event: &CacheEvent) -> usize {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            return 0;
        };

        let mut failures = 0;
        for (id, callback) in handlers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                failures += 1;
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(
                    "Event subscriber {:?} panicked on {:?}: {}",
                    id,
                    event.kind(),
                    message
                );
            }
        }
        failures
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_to_matching_kind_only() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        bus.subscribe(EventKind::Hit, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&CacheEvent::Hit { key: "a".to_string() });
        bus.emit(&CacheEvent::Miss { key: "a".to_string() });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let seen = seen.clone();
            bus.subscribe(EventKind::Delete, move |_| seen.lock().unwrap().push(n));
        }
        bus.emit(&CacheEvent::Delete { key: "k".to_string() });

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let mut bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe(EventKind::Set, |_| panic!("subscriber failure"));
        let counter = calls.clone();
        bus.subscribe(EventKind::Set, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let failures = bus.emit(&CacheEvent::Set {
            key: "k".to_string(),
            size_bytes: 3,
        });

        assert_eq!(failures, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::Clear, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.emit(&CacheEvent::Clear { entries: 0, memory_usage: 0 }), 0);
    }

    #[test]
    fn test_event_serialize() {
        let event = CacheEvent::Eviction {
            key: "k".to_string(),
            size_bytes: 10,
            reason: EvictionReason::Memory,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "eviction");
        assert_eq!(json["reason"], "memory");
        assert_eq!(event.kind(), EventKind::Eviction);
    }
}
