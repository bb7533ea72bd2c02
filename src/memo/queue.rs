use std::collections::BTreeSet;

use super::cache::MemoCache;

/// Indices awaiting resolution. Insertion order is irrelevant; pops return the minimum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQueue {
    indices: BTreeSet<u64>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `index` unless it is already memoized. Returns whether it was added.
    pub fn enqueue(&mut self, index: u64, cache: &MemoCache) -> bool {
        if cache.contains(index) {
            return false;
        }
        self.indices.insert(index)
    }

    pub fn pop_min(&mut self) -> Option<u64> {
        self.indices.pop_first()
    }

    pub fn peek_min(&self) -> Option<u64> {
        self.indices.first().copied()
    }

    /// Drops every index that has been memoized since it was queued.
    pub fn retain_unmemoized(&mut self, cache: &MemoCache) {
        self.indices.retain(|index| !cache.contains(*index));
    }

    pub fn contains(&self, index: u64) -> bool {
        self.indices.contains(&index)
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
