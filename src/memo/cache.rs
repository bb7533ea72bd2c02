use std::collections::BTreeMap;

use crate::protocol::MAX_INDEX;

/// Outcome of merging a single `(index, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    /// The same value was already memoized.
    Known,
    /// The pair contradicts an existing entry or the recurrence, or is out of range.
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub known: usize,
    pub rejected: usize,
}

impl MergeSummary {
    /// Pairs that ended up memoized, whether new or already present.
    pub fn accepted(&self) -> usize {
        self.inserted + self.known
    }
}

/// Grow-only mapping from Fibonacci index to value.
///
/// Invariants:
/// - `0 -> 0` and `1 -> 1` are always present.
/// - Whenever `n`, `n - 1` and `n - 2` are all memoized, `cache[n] = cache[n - 1] + cache[n - 2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoCache {
    values: BTreeMap<u64, u64>,
}

impl MemoCache {
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(0, 0);
        values.insert(1, 1);
        Self { values }
    }

    /// Builds a cache from persisted entries, skipping any that do not fit.
    pub fn from_entries<I>(entries: I) -> (Self, MergeSummary)
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut entries: Vec<(u64, u64)> = entries.into_iter().collect();
        entries.sort_unstable();

        let mut cache = Self::new();
        let summary = cache.merge_all(entries);
        (cache, summary)
    }

    /// Drops everything except the base values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn get(&self, index: u64) -> Option<u64> {
        self.values.get(&index).copied()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.values.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn highest(&self) -> Option<u64> {
        self.values.keys().next_back().copied()
    }

    /// All entries in ascending index order.
    pub fn entries(&self) -> Vec<(u64, u64)> {
        self.values.iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn merge(&mut self, index: u64, value: u64) -> Merge {
        if let Some(existing) = self.values.get(&index) {
            return if *existing == value {
                Merge::Known
            } else {
                Merge::Rejected
            };
        }

        if index > MAX_INDEX || !self.fits(index, value) {
            return Merge::Rejected;
        }

        self.values.insert(index, value);
        Merge::Inserted
    }

    pub fn merge_all<I>(&mut self, entries: I) -> MergeSummary
    where
        I: IntoIterator<Item = (u64, u64)>,
    {
        let mut summary = MergeSummary::default();
        for (index, value) in entries {
            match self.merge(index, value) {
                Merge::Inserted => summary.inserted += 1,
                Merge::Known => summary.known += 1,
                Merge::Rejected => {
                    tracing::warn!("Rejected inconsistent entry F({})={}", index, value);
                    summary.rejected += 1;
                }
            }
        }
        summary
    }

    /// Checks the recurrence for every triple the new entry would complete.
    fn fits(&self, index: u64, value: u64) -> bool {
        if index <= 1 {
            return value == index;
        }

        if let (Some(a), Some(b)) = (self.get(index - 1), self.get(index - 2))
            && a.checked_add(b) != Some(value)
        {
            return false;
        }

        if let (Some(next), Some(prev)) = (self.get(index + 1), self.get(index - 1))
            && value.checked_add(prev) != Some(next)
        {
            return false;
        }

        if let (Some(next2), Some(next1)) = (self.get(index + 2), self.get(index + 1))
            && next1.checked_add(value) != Some(next2)
        {
            return false;
        }

        true
    }

    /// Verifies the recurrence over every fully known triple.
    pub fn is_consistent(&self) -> bool {
        self.values.iter().all(|(&index, &value)| {
            if index <= 1 {
                return value == index;
            }
            match (self.get(index - 1), self.get(index - 2)) {
                (Some(a), Some(b)) => a.checked_add(b) == Some(value),
                _ => true,
            }
        })
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new()
    }
}
