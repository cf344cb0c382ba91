//! Order List Module
//!
//! Doubly linked list over arena slot indices, used for LRU recency order and
//! FIFO insertion order.

// == Link ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

// == Order List ==
/// Tracks slots in order with O(1) push, move and removal.
///
/// - Front = next eviction candidate
/// - Back = most recently inserted (or touched, under LRU)
///
/// Links are kept in a vector indexed by slot, so the list never owns or
/// points at entries directly.
#[derive(Debug, Default)]
pub(crate) struct OrderList {
    links: Vec<Option<Link>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl OrderList {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Back ==
    /// Appends a slot at the back. A slot already in the list is moved instead.
    pub fn push_back(&mut self, slot: usize) {
        if self.contains(slot) {
            self.move_to_back(slot);
            return;
        }
        if slot >= self.links.len() {
            self.links.resize(slot + 1, None);
        }

        self.links[slot] = Some(Link {
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.set_next(tail, Some(slot)),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    // == Move To Back ==
    /// Marks a slot as most recent. Unknown slots are ignored.
    pub fn move_to_back(&mut self, slot: usize) {
        if !self.contains(slot) || self.tail == Some(slot) {
            return;
        }
        self.remove(slot);
        self.push_back(slot);
    }

    // == Remove ==
    /// Unlinks a slot. Unknown slots are ignored.
    pub fn remove(&mut self, slot: usize) {
        let Some(link) = self.links.get_mut(slot).and_then(Option::take) else {
            return;
        };

        match link.prev {
            Some(prev) => self.set_next(prev, link.next),
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => self.set_prev(next, link.prev),
            None => self.tail = link.prev,
        }
        self.len -= 1;
    }

    // == Front ==
    /// Returns the next eviction candidate without removing it.
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    // == Contains ==
    pub fn contains(&self, slot: usize) -> bool {
        matches!(self.links.get(slot), Some(Some(_)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    // == Iter ==
    /// Walks slots from front to back.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.head, move |slot| {
            self.links.get(*slot).copied().flatten().and_then(|link| link.next)
        })
    }

    fn set_next(&mut self, slot: usize, next: Option<usize>) {
        if let Some(Some(link)) = self.links.get_mut(slot) {
            link.next = next;
        }
    }

    fn set_prev(&mut self, slot: usize, prev: Option<usize>) {
        if let Some(Some(link)) = self.links.get_mut(slot) {
            link.prev = prev;
        }
    }
}
