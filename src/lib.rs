//! Policy Cache - A bounded in-memory cache engine
//!
//! Provides LRU/LFU/FIFO eviction, TTL expiration, memory accounting and
//! event notifications, with a small HTTP surface for the demo server.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheEvent, CacheStats, CacheStore, EventKind, EvictionPolicy};
pub use config::{CacheConfig, Config, ConfigUpdate};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
