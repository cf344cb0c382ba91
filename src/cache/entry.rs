//! Cache Entry Module
//!
//! Defines individual cache entries with size, access and TTL metadata.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

// == Constants ==
/// Size charged for a value whose serialized size cannot be measured.
pub const DEFAULT_ENTRY_SIZE: usize = 1024;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value, owned by the cache
    pub value: V,
    /// Serialized size of the value, measured at insertion
    pub size_bytes: usize,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read or write (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of hits since the entry was (re)inserted
    pub access_count: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Insertion sequence, used as the LFU tie breaker
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of the entry, `None` for no expiration
    pub fn new(key: String, value: V, size_bytes: usize, ttl: Option<Duration>, seq: u64) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl.map(|ttl| now.saturating_add(ttl_to_ms(ttl)));

        Self {
            key,
            value,
            size_bytes,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            expires_at,
            seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now >= expires)
    }

    // == Record Access ==
    /// Bumps the access counter and timestamp after a hit.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = current_timestamp_ms();
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    // == Info ==
    /// Snapshot of the entry metadata, without the value.
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            key: self.key.clone(),
            size_bytes: self.size_bytes,
            created_at: to_datetime(self.created_at),
            last_accessed_at: to_datetime(self.last_accessed_at),
            access_count: self.access_count,
            expires_at: self.expires_at.map(to_datetime),
            ttl_remaining_ms: self.ttl_remaining_ms(),
        }
    }
}

// == Entry Info ==
/// Per-entry introspection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    /// None for entries that never expire
    pub expires_at: Option<DateTime<Utc>>,
    /// None for entries that never expire
    pub ttl_remaining_ms: Option<u64>,
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Whole milliseconds of a lifetime, saturating at `u64::MAX`. A nonzero
/// lifetime is never shorter than 1 ms.
fn ttl_to_ms(ttl: Duration) -> u64 {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 && !ttl.is_zero() {
        1
    } else {
        ms
    }
}

/// Timestamps past the representable range clamp to the latest datetime.
fn to_datetime(ms: u64) -> DateTime<Utc> {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Measures a value by serializing it to JSON.
///
/// Returns `None` when the value cannot be serialized; callers fall back to
/// [`DEFAULT_ENTRY_SIZE`].
pub fn estimate_size<V: Serialize>(value: &V) -> Option<usize> {
    serde_json::to_vec(value).ok().map(|bytes| bytes.len())
}
