use std::collections::VecDeque;

use super::snapshot::Snapshot;

pub const DEFAULT_CAPACITY: usize = 100;

/// Rolling window of the most recent snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
