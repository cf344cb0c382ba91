//! Frequency Index Module
//!
//! Min-ordered access-count index backing LFU eviction.

use std::collections::BTreeSet;

// == Frequency Index ==
/// Orders slots by `(access_count, insertion_seq)`.
///
/// The smallest element is the victim; equal counts fall back to the lowest
/// insertion sequence so eviction is reproducible.
#[derive(Debug, Default)]
pub(crate) struct FrequencyIndex {
    order: BTreeSet<(u64, u64, usize)>,
}

impl FrequencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: usize, count: u64, seq: u64) {
        self.order.insert((count, seq, slot));
    }

    /// Moves a slot from `prev_count` to `prev_count + 1`.
    pub fn increment(&mut self, slot: usize, prev_count: u64, seq: u64) {
        if self.order.remove(&(prev_count, seq, slot)) {
            self.order.insert((prev_count + 1, seq, slot));
        }
    }

    pub fn remove(&mut self, slot: usize, count: u64, seq: u64) {
        self.order.remove(&(count, seq, slot));
    }

    pub fn min(&self) -> Option<usize> {
        self.order.first().map(|&(_, _, slot)| slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().map(|&(_, _, slot)| slot)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
