//! Cache Module
//!
//! Provides a bounded in-memory cache with LRU/LFU/FIFO eviction, TTL
//! expiration, memory accounting and event notifications.

mod entry;
mod events;
mod frequency;
mod order;
mod policy;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, estimate_size, CacheEntry, EntryInfo, DEFAULT_ENTRY_SIZE};
pub use events::{CacheEvent, EventBus, EventKind, EvictionReason, SubscriptionId};
pub use policy::EvictionPolicy;
pub use shared::Cache;
pub use stats::{efficiency, hit_rate, CacheStats};
pub use store::{CacheStore, SweepReport};
