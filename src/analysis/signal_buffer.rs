use std::collections::VecDeque;

use crate::models::SignalRecord;

/// Bounded result cache. Newest record at the front; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    records: VecDeque<SignalRecord>,
    capacity: usize,
}

impl SignalBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the front. Returns the evicted record, if any.
    pub fn push(&mut self, record: SignalRecord) -> Option<SignalRecord> {
        self.records.push_front(record);
        if self.records.len() > self.capacity {
            self.records.pop_back()
        } else {
            None
        }
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &SignalRecord> {
        self.records.iter()
    }

    pub fn newest(&self) -> Option<&SignalRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn average_confidence(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u64 = self.records.iter().map(|r| r.confidence as u64).sum();
        Some(total as f64 / self.records.len() as f64)
    }

    pub fn to_vec(&self) -> Vec<SignalRecord> {
        self.records.iter().cloned().collect()
    }
}
