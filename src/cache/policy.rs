//! Eviction Policy Module
//!
//! Names the supported eviction policies and dispatches to the ordering
//! structure each one needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::frequency::FrequencyIndex;
use crate::cache::order::OrderList;
use crate::error::CacheError;

// == Eviction Policy ==
/// Victim selection strategy used when a limit would be breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum EvictionPolicy {
    /// Least recently used entry goes first
    #[default]
    Lru,
    /// Entry with the lowest access count goes first
    Lfu,
    /// Oldest inserted entry goes first, regardless of access
    Fifo,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Lfu => "LFU",
            EvictionPolicy::Fifo => "FIFO",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LRU" => Ok(EvictionPolicy::Lru),
            "LFU" => Ok(EvictionPolicy::Lfu),
            "FIFO" => Ok(EvictionPolicy::Fifo),
            _ => Err(CacheError::UnsupportedPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for EvictionPolicy {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// == Policy Tracker ==
/// The ordering structure backing the active policy.
///
/// Holds slot indices only; the store owns the entries. Every live slot has
/// exactly one position in the tracker.
#[derive(Debug)]
pub(crate) enum PolicyTracker {
    Lru(OrderList),
    Lfu(FrequencyIndex),
    Fifo(OrderList),
}

impl PolicyTracker {
    pub fn new(policy: EvictionPolicy) -> Self {
        match policy {
            EvictionPolicy::Lru => PolicyTracker::Lru(OrderList::new()),
            EvictionPolicy::Lfu => PolicyTracker::Lfu(FrequencyIndex::new()),
            EvictionPolicy::Fifo => PolicyTracker::Fifo(OrderList::new()),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        match self {
            PolicyTracker::Lru(_) => EvictionPolicy::Lru,
            PolicyTracker::Lfu(_) => EvictionPolicy::Lfu,
            PolicyTracker::Fifo(_) => EvictionPolicy::Fifo,
        }
    }

    /// Registers a slot at the back of the order (or at `count` under LFU).
    pub fn insert(&mut self, slot: usize, count: u64, seq: u64) {
        match self {
            PolicyTracker::Lru(list) | PolicyTracker::Fifo(list) => list.push_back(slot),
            PolicyTracker::Lfu(index) => index.insert(slot, count, seq),
        }
    }

    /// Records a hit. `prev_count` is the access count before this hit.
    pub fn touch(&mut self, slot: usize, prev_count: u64, seq: u64) {
        match self {
            PolicyTracker::Lru(list) => list.move_to_back(slot),
            PolicyTracker::Lfu(index) => index.increment(slot, prev_count, seq),
            PolicyTracker::Fifo(_) => {}
        }
    }

    pub fn remove(&mut self, slot: usize, count: u64, seq: u64) {
        match self {
            PolicyTracker::Lru(list) | PolicyTracker::Fifo(list) => list.remove(slot),
            PolicyTracker::Lfu(index) => index.remove(slot, count, seq),
        }
    }

    /// Returns the next victim without removing it.
    pub fn peek_victim(&self) -> Option<usize> {
        match self {
            PolicyTracker::Lru(list) | PolicyTracker::Fifo(list) => list.front(),
            PolicyTracker::Lfu(index) => index.min(),
        }
    }

    /// Slots in eviction order, first victim first.
    pub fn eviction_order(&self) -> Vec<usize> {
        match self {
            PolicyTracker::Lru(list) | PolicyTracker::Fifo(list) => list.iter().collect(),
            PolicyTracker::Lfu(index) => index.iter().collect(),
        }
    }

    pub fn clear(&mut self) {
        *self = PolicyTracker::new(self.policy());
    }

    pub fn len(&self) -> usize {
        match self {
            PolicyTracker::Lru(list) | PolicyTracker::Fifo(list) => list.len(),
            PolicyTracker::Lfu(index) => index.len(),
        }
    }
}
