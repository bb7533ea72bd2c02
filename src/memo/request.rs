use std::collections::HashSet;

use crate::protocol::ValuePair;

/// Single-flight guard for `request-values`.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    outstanding: HashSet<ValuePair>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `pair` as in flight. Returns `false` when an identical request is already outstanding.
    pub fn begin(&mut self, pair: ValuePair) -> bool {
        self.outstanding.insert(pair)
    }

    /// Clears `pair`. Returns whether it was outstanding.
    pub fn complete(&mut self, pair: &ValuePair) -> bool {
        self.outstanding.remove(pair)
    }

    /// Completes every outstanding pair whose members both appear in `answered`.
    pub fn complete_answered<F>(&mut self, answered: F) -> usize
    where
        F: Fn(u64) -> bool,
    {
        let before = self.outstanding.len();
        self.outstanding
            .retain(|pair| !(answered(pair.n1) && answered(pair.n2)));
        before - self.outstanding.len()
    }

    /// Drops every outstanding request. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.outstanding.len();
        self.outstanding.clear();
        cancelled
    }

    pub fn is_outstanding(&self, pair: &ValuePair) -> bool {
        self.outstanding.contains(pair)
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
