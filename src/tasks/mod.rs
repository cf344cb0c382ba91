//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries and enforces limits at the
//!   configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
