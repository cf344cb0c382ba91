//! Cache Statistics Module
//!
//! Tracks cache counters and memory usage, and derives hit rate and efficiency.

use serde::Serialize;

use crate::cache::EvictionPolicy;

/// Weight of the hit rate in the efficiency score; the rest goes to memory headroom.
const HIT_RATE_WEIGHT: f64 = 0.7;

// == Counters ==
/// Running counters owned by the store.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub rejected_sets: u64,
    pub size_estimate_fallbacks: u64,
    pub subscriber_failures: u64,
    /// Sum of `size_bytes` over live entries
    pub memory_usage: usize,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Memory Accounting ==
    pub fn add_memory(&mut self, bytes: usize) {
        self.memory_usage += bytes;
    }

    pub fn release_memory(&mut self, bytes: usize) {
        self.memory_usage = self.memory_usage.saturating_sub(bytes);
    }
}

// == Cache Stats ==
/// Point-in-time snapshot of cache performance and usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Entries removed by the cache to satisfy capacity or memory limits
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Sets refused because the value alone exceeds `max_memory`
    pub rejected_sets: u64,
    /// Values stored with the default size because they could not be measured
    pub size_estimate_fallbacks: u64,
    /// Subscriber callbacks that panicked
    pub subscriber_failures: u64,
    /// Current number of entries
    pub size: usize,
    pub max_size: usize,
    /// Current summed entry size in bytes
    pub memory_usage: usize,
    pub max_memory: usize,
    pub policy: EvictionPolicy,
    pub hit_rate: f64,
    pub efficiency: f64,
}

impl CacheStats {
    pub(crate) fn snapshot(
        counters: &Counters,
        size: usize,
        max_size: usize,
        max_memory: usize,
        policy: EvictionPolicy,
    ) -> Self {
        let hit_rate = hit_rate(counters.hits, counters.misses);
        Self {
            hits: counters.hits,
            misses: counters.misses,
            sets: counters.sets,
            deletes: counters.deletes,
            evictions: counters.evictions,
            expirations: counters.expirations,
            rejected_sets: counters.rejected_sets,
            size_estimate_fallbacks: counters.size_estimate_fallbacks,
            subscriber_failures: counters.subscriber_failures,
            size,
            max_size,
            memory_usage: counters.memory_usage,
            max_memory,
            policy,
            hit_rate,
            efficiency: efficiency(hit_rate, counters.memory_usage, max_memory),
        }
    }
}

// == Hit Rate ==
/// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Efficiency ==
/// Coarse health score: 70% hit rate, 30% free memory share.
pub fn efficiency(hit_rate: f64, memory_usage: usize, max_memory: usize) -> f64 {
    let used = if max_memory == 0 {
        1.0
    } else {
        memory_usage as f64 / max_memory as f64
    };
    let score = HIT_RATE_WEIGHT * hit_rate + (1.0 - HIT_RATE_WEIGHT) * (1.0 - used);
    score.clamp(0.0, 1.0)
}
