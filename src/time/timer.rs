//! Timer heap for deadline management.
//!
//! This module provides a small min-heap of `(deadline, key)` pairs to support
//! deadline-driven wakeups. Keys are handed out in insertion order so entries
//! with equal deadlines pop first-in first-out.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Identifies one registration in a [`TimerHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey(u64);

impl TimerKey {
    /// Returns the raw generation number of this key.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct TimerEntry {
    deadline: Instant,
    key: TimerKey,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first).
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of timers ordered by deadline.
#[derive(Debug, Default)]
pub struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    next_generation: u64,
}

impl TimerHeap {
    /// Creates a new empty timer heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of timers in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds a timer with the given deadline and returns its key.
    pub fn insert(&mut self, deadline: Instant) -> TimerKey {
        let key = TimerKey(self.next_generation);
        self.next_generation += 1;
        self.heap.push(TimerEntry { deadline, key });
        key
    }

    /// Returns the earliest deadline, if any.
    #[must_use]
    pub fn peek_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Pops all keys whose deadline is `<= now`, earliest first.
    pub fn pop_expired(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut expired = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                expired.push(entry.key);
            }
        }
        expired
    }

    /// Removes the entry for `key`. Returns `false` if it was not queued.
    pub fn remove(&mut self, key: TimerKey) -> bool {
        let before = self.heap.len();
        self.heap.retain(|entry| entry.key != key);
        self.heap.len() != before
    }
}
