//! Bounded top-K retention.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A scored combination.
///
/// Ordering: higher objective is better; on equal objectives the lower
/// combination index is better, which makes the retained set independent of
/// how the index space was partitioned.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub objective: f64,
    /// Linear index of the combination in the merged index space.
    pub index: u64,
    pub values: Vec<f64>,
}

impl Ranked {
    fn rank_cmp(&self, objective: f64, index: u64) -> Ordering {
        self.objective
            .total_cmp(&objective)
            .then_with(|| index.cmp(&self.index))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_cmp(other.objective, other.index)
    }
}

/// Keeps the `capacity` best [`Ranked`] entries seen so far.
///
/// Backed by a min-heap so the current worst entry is evicted in O(log K).
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1 << 16)),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether an entry with this score would be retained. Lets callers skip
    /// materializing values for candidates that would be evicted at once.
    pub fn admits(&self, objective: f64, index: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            return true;
        }
        match self.heap.peek() {
            Some(Reverse(worst)) => worst.rank_cmp(objective, index) == Ordering::Less,
            None => true,
        }
    }

    /// Inserts `entry`, evicting the worst entry when full.
    pub fn push(&mut self, entry: Ranked) {
        if !self.admits(entry.objective, entry.index) {
            return;
        }
        if self.heap.len() == self.capacity {
            self.heap.pop();
        }
        self.heap.push(Reverse(entry));
    }

    /// Folds `other` into `self` with the same evict-worst discipline.
    pub fn merge(mut self, other: TopK) -> TopK {
        for Reverse(entry) in other.heap {
            self.push(entry);
        }
        self
    }

    /// Entries from best to worst.
    pub fn into_sorted_vec(self) -> Vec<Ranked> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| entry)
            .collect()
    }
}
