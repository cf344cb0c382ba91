//! Cache Store Module
//!
//! Main cache engine: an arena of entries indexed by key, the ordering
//! structure of the active eviction policy, memory accounting, and event
//! publication. All bookkeeping for one operation completes before any
//! subscriber is notified.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::{current_timestamp_ms, estimate_size, DEFAULT_ENTRY_SIZE};
use crate::cache::events::{CacheEvent, EventBus, EventKind, EvictionReason, SubscriptionId};
use crate::cache::policy::PolicyTracker;
use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, EntryInfo, EvictionPolicy};
use crate::config::{CacheConfig, ConfigUpdate};
use crate::error::Result;

// == Sweep Report ==
/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries removed because their TTL elapsed
    pub expired: usize,
    /// Entries evicted afterwards to get back under the limits
    pub evicted: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.expired + self.evicted
    }
}

// == Cache Store ==
/// Bounded cache storage with policy-driven eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Entry arena; `None` marks a free slot
    slots: Vec<Option<CacheEntry<V>>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    /// Key to slot index
    index: HashMap<String, usize>,
    /// Ordering structure of the active policy
    tracker: PolicyTracker,
    counters: Counters,
    config: CacheConfig,
    events: EventBus,
    /// Events raised by the running operation, published once it completes
    pending: Vec<CacheEvent>,
    next_seq: u64,
}

impl<V> CacheStore<V>
where
    V: Serialize + Clone,
{
    // == Constructor ==
    /// Creates an empty store, rejecting an invalid configuration.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            tracker: PolicyTracker::new(config.policy),
            counters: Counters::new(),
            config,
            events: EventBus::new(),
            pending: Vec::new(),
            next_seq: 0,
        })
    }

    // == Set ==
    /// Stores a value, evicting first if a limit would be breached.
    ///
    /// `ttl` overrides the configured default for this entry only;
    /// `Some(Duration::ZERO)` stores an entry that never expires.
    ///
    /// Returns `false` without touching the store when the value alone is
    /// larger than `max_memory`.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> bool {
        let key = key.into();
        let size_bytes = match estimate_size(&value) {
            Some(size) => size,
            None => {
                self.counters.size_estimate_fallbacks += 1;
                warn!(
                    "Could not measure value for key '{}', charging {} bytes",
                    key, DEFAULT_ENTRY_SIZE
                );
                DEFAULT_ENTRY_SIZE
            }
        };

        if size_bytes > self.config.max_memory {
            self.counters.rejected_sets += 1;
            warn!(
                "Refusing key '{}': {} bytes exceeds max_memory of {} bytes",
                key, size_bytes, self.config.max_memory
            );
            return false;
        }

        // Overwrite releases the previous entry before limits are checked
        if let Some(&slot) = self.index.get(&key) {
            if self.remove_slot(slot).is_some_and(|old| old.is_expired()) {
                self.counters.expirations += 1;
            }
        }

        while self.index.len() >= self.config.max_size {
            if self.evict_one(EvictionReason::Capacity).is_none() {
                break;
            }
        }
        self.evict_for_memory(size_bytes);

        let ttl = match ttl {
            Some(ttl) if ttl.is_zero() => None,
            Some(ttl) => Some(ttl),
            None => self.config.default_ttl(),
        };
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = CacheEntry::new(key.clone(), value, size_bytes, ttl, seq);
        let slot = self.insert_slot(entry);
        self.index.insert(key.clone(), slot);
        self.tracker.insert(slot, 0, seq);
        self.counters.add_memory(size_bytes);
        self.counters.sets += 1;

        self.pending.push(CacheEvent::Set { key, size_bytes });
        self.flush_events();
        true
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// Expired entries are removed on sight and reported as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = current_timestamp_ms();
        let result = match self.index.get(key).copied() {
            Some(slot) if self.slot(slot).is_some_and(|e| e.is_expired_at(now)) => {
                self.remove_slot(slot);
                self.counters.expirations += 1;
                None
            }
            Some(slot) => match self.slots.get_mut(slot).and_then(Option::as_mut) {
                Some(entry) => {
                    let prev_count = entry.access_count;
                    entry.record_access();
                    self.tracker.touch(slot, prev_count, entry.seq);
                    Some(entry.value.clone())
                }
                None => None,
            },
            None => None,
        };

        match result {
            Some(_) => {
                self.counters.record_hit();
                self.pending.push(CacheEvent::Hit {
                    key: key.to_string(),
                });
            }
            None => {
                self.counters.record_miss();
                self.pending.push(CacheEvent::Miss {
                    key: key.to_string(),
                });
            }
        }
        self.flush_events();
        result
    }

    // == Has ==
    /// Checks for a live entry without touching access statistics.
    pub fn has(&self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    // == Delete ==
    /// Removes an entry, returning whether a live entry was present.
    ///
    /// An expired entry is dropped as an expiration and reported as absent.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(slot) = self.index.get(key).copied() else {
            return false;
        };
        let expired = self.slot(slot).is_some_and(|e| e.is_expired());
        self.remove_slot(slot);

        if expired {
            self.counters.expirations += 1;
            return false;
        }

        self.counters.deletes += 1;
        self.pending.push(CacheEvent::Delete {
            key: key.to_string(),
        });
        self.flush_events();
        true
    }

    // == Clear ==
    /// Removes every entry and resets memory usage.
    pub fn clear(&mut self) {
        let entries = self.index.len();
        let memory_usage = self.counters.memory_usage;

        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.tracker.clear();
        self.counters.memory_usage = 0;

        info!("Cache cleared: {} entries, {} bytes", entries, memory_usage);
        self.pending.push(CacheEvent::Clear {
            entries,
            memory_usage,
        });
        self.flush_events();
    }

    // == Snapshots ==
    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Live values, in key order.
    pub fn values(&self) -> Vec<V> {
        self.entries().into_iter().map(|(_, value)| value).collect()
    }

    /// Live key/value pairs, sorted by key.
    pub fn entries(&self) -> Vec<(String, V)> {
        let now = current_timestamp_ms();
        let mut entries: Vec<(String, V)> = self
            .slots
            .iter()
            .flatten()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::snapshot(
            &self.counters,
            self.index.len(),
            self.config.max_size,
            self.config.max_memory,
            self.config.policy,
        )
    }

    // == Entry Info ==
    /// Metadata of a live entry, or `None` if absent or expired.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        self.live_entry(key).map(CacheEntry::info)
    }

    // == Policy ==
    pub fn policy(&self) -> EvictionPolicy {
        self.config.policy
    }

    /// Switches the eviction policy for subsequent evictions.
    ///
    /// The new ordering is seeded from the current eviction order rather than
    /// re-derived from entry timestamps, so e.g. switching LRU to FIFO queues
    /// entries by recency. LFU always orders by the recorded access counts.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        let from = self.config.policy;
        if from == policy {
            return;
        }
        self.config.policy = policy;
        self.rebuild_tracker();

        info!("Eviction policy changed from {} to {}", from, policy);
        self.pending.push(CacheEvent::PolicyChange { from, to: policy });
        self.flush_events();
    }

    /// Parses and applies a policy name; unknown names leave the policy unchanged.
    pub fn set_policy_by_name(&mut self, name: &str) -> Result<()> {
        let policy = name.parse()?;
        self.set_policy(policy);
        Ok(())
    }

    // == Config ==
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Applies a partial configuration update as one unit.
    ///
    /// The merged configuration is validated before anything changes. Lowered
    /// limits are enforced before this returns.
    pub fn update_config(&mut self, update: ConfigUpdate) -> Result<()> {
        let merged = self.config.merged(&update)?;
        let from = self.config.policy;
        self.config = merged;

        if from != self.config.policy {
            self.rebuild_tracker();
            self.pending.push(CacheEvent::PolicyChange {
                from,
                to: self.config.policy,
            });
        }

        let evicted = self.reclaim();
        info!(
            "Cache configuration updated: max_size={}, max_memory={}, default_ttl_ms={}, cleanup_interval_ms={}, policy={} ({} evicted)",
            self.config.max_size,
            self.config.max_memory,
            self.config.default_ttl_ms,
            self.config.cleanup_interval_ms,
            self.config.policy,
            evicted
        );
        self.pending.push(CacheEvent::ConfigUpdate {
            config: self.config.clone(),
        });
        self.flush_events();
        Ok(())
    }

    // == Sweep ==
    /// Removes expired entries, then evicts until both limits hold again.
    pub fn sweep(&mut self) -> SweepReport {
        let now = current_timestamp_ms();
        let expired_slots: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| {
                entry
                    .as_ref()
                    .filter(|entry| entry.is_expired_at(now))
                    .map(|_| slot)
            })
            .collect();

        for &slot in &expired_slots {
            self.remove_slot(slot);
        }
        self.counters.expirations += expired_slots.len() as u64;

        let report = SweepReport {
            expired: expired_slots.len(),
            evicted: self.reclaim(),
        };

        if report.total() > 0 {
            info!(
                "Cache sweep: removed {} expired and {} evicted entries",
                report.expired, report.evicted
            );
        } else {
            debug!("Cache sweep: nothing to remove");
        }

        self.pending.push(CacheEvent::Cleanup {
            expired: report.expired,
            evicted: report.evicted,
        });
        self.flush_events();
        report
    }

    // == Subscriptions ==
    /// Registers a callback for one event kind.
    ///
    /// Callbacks run while the store is still borrowed by the operation that
    /// raised the event, so they must not call back into the same cache.
    pub fn on_event<F>(&mut self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.counters.memory_usage
    }

    // == Internals ==
    fn slot(&self, slot: usize) -> Option<&CacheEntry<V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn live_entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.index
            .get(key)
            .and_then(|&slot| self.slot(slot))
            .filter(|entry| !entry.is_expired())
    }

    fn insert_slot(&mut self, entry: CacheEntry<V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    /// Detaches a slot from the arena, the key index, the policy tracker and
    /// the memory total in one step.
    fn remove_slot(&mut self, slot: usize) -> Option<CacheEntry<V>> {
        let entry = self.slots.get_mut(slot).and_then(Option::take)?;
        self.index.remove(&entry.key);
        self.tracker.remove(slot, entry.access_count, entry.seq);
        self.counters.release_memory(entry.size_bytes);
        self.free.push(slot);
        Some(entry)
    }

    fn evict_one(&mut self, reason: EvictionReason) -> Option<CacheEntry<V>> {
        let victim = self.tracker.peek_victim()?;
        let entry = self.remove_slot(victim)?;

        self.counters.evictions += 1;
        debug!(
            "Evicted key '{}' ({} bytes, {:?}, policy {})",
            entry.key, entry.size_bytes, reason, self.config.policy
        );
        self.pending.push(CacheEvent::Eviction {
            key: entry.key.clone(),
            size_bytes: entry.size_bytes,
            reason,
        });
        Some(entry)
    }

    /// Makes room for `incoming` bytes. Once the limit would be exceeded,
    /// evicts down to 80% of `max_memory` (including `incoming`) or until the
    /// store is empty.
    fn evict_for_memory(&mut self, incoming: usize) -> usize {
        let max_memory = self.config.max_memory;
        if self.counters.memory_usage + incoming <= max_memory {
            return 0;
        }

        let target = max_memory - max_memory / 5;
        let mut evicted = 0;
        while self.counters.memory_usage + incoming > target {
            if self.evict_one(EvictionReason::Memory).is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    /// Evicts until the store is back within both limits.
    fn reclaim(&mut self) -> usize {
        let mut evicted = 0;
        while self.index.len() > self.config.max_size {
            if self.evict_one(EvictionReason::Capacity).is_none() {
                break;
            }
            evicted += 1;
        }
        evicted + self.evict_for_memory(0)
    }

    fn rebuild_tracker(&mut self) {
        let order = self.tracker.eviction_order();
        let mut tracker = PolicyTracker::new(self.config.policy);
        for slot in order {
            if let Some(entry) = self.slot(slot) {
                tracker.insert(slot, entry.access_count, entry.seq);
            }
        }
        self.tracker = tracker;
    }

    fn flush_events(&mut self) {
        debug_assert_eq!(self.tracker.len(), self.index.len());
        for event in std::mem::take(&mut self.pending) {
            let failures = self.events.emit(&event);
            self.counters.subscriber_failures += failures as u64;
        }
    }
}
