//! In-memory scheduled set ordered by run time.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::core::{EnqueueError, ScheduleStore, ScheduledJob};

/// Wrapper to make `ScheduledJob` orderable by run time (earliest first) and FIFO within a run time.
struct TimedEntry {
    seq: u64,
    entry: ScheduledJob,
}

impl PartialEq for TimedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for TimedEntry {}

impl PartialOrd for TimedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: BinaryHeap is a max-heap.
        match other.entry.run_at.cmp(&self.entry.run_at) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

/// In-memory scheduled set using a binary heap keyed on run time.
/// This provides O(log n) insertion and O(log n) removal of the earliest entry.
pub struct InMemoryScheduledSet {
    max_depth: usize,
    next_seq: u64,
    entries: BinaryHeap<TimedEntry>,
}

impl InMemoryScheduledSet {
    /// Create a new scheduled set with a maximum depth.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            next_seq: 0,
            entries: BinaryHeap::with_capacity(max_depth.min(1024)),
        }
    }
}

impl ScheduleStore for InMemoryScheduledSet {
    fn schedule(&mut self, entry: ScheduledJob) -> Result<(), EnqueueError> {
        if self.len() >= self.max_depth() {
            return Err(EnqueueError::QueueFull("max scheduled depth reached".into()));
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.push(TimedEntry { seq, entry });
        Ok(())
    }

    fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let mut due = Vec::new();
        while self
            .entries
            .peek()
            .is_some_and(|top| top.entry.run_at <= now)
        {
            if let Some(top) = self.entries.pop() {
                due.push(top.entry);
            }
        }
        due
    }

    fn next_run_at(&self) -> Option<DateTime<Utc>> {
        self.entries.peek().map(|top| top.entry.run_at)
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
