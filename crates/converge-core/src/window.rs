//! Bounded most-recent-N history of predicate results.

use std::collections::VecDeque;

/// Sliding window over the latest predicate results.
///
/// Never holds more than `capacity` entries; pushing into a full window
/// evicts the oldest result first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWindow {
    results: VecDeque<bool>,
    capacity: usize,
}

impl ConsistencyWindow {
    /// Create an empty window. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            results: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a result, returning the evicted oldest entry if the window was full.
    pub fn push(&mut self, result: bool) -> Option<bool> {
        let evicted = if self.is_full() {
            self.results.pop_front()
        } else {
            None
        };
        self.results.push_back(result);
        evicted
    }

    pub fn is_full(&self) -> bool {
        self.results.len() == self.capacity
    }

    /// `true` once the window is full and every entry in it is `true`.
    pub fn is_consistent(&self) -> bool {
        self.is_full() && self.results.iter().all(|r| *r)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
