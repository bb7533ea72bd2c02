//! Memo Module Tests
//!
//! ## Test Scopes
//! - **MemoCache**: base seeding, insert-only merges, recurrence guard, idempotence.
//! - **PendingQueue**: minimum-first draining and the "never memoized" invariant.
//! - **RequestTracker**: single-flight correlation.

#[cfg(test)]
mod tests {
    use crate::memo::{MemoCache, Merge, PendingQueue, RequestTracker};
    use crate::protocol::{MAX_INDEX, ValuePair};

    fn fib(n: u64) -> u64 {
        let (mut a, mut b) = (0u128, 1u128);
        for _ in 0..n {
            let next = a + b;
            a = b;
            b = next;
        }
        a as u64
    }

    // ============================================================
    // MEMO CACHE
    // ============================================================

    #[test]
    fn test_cache_seeded_with_base_values() {
        let cache = MemoCache::new();

        assert_eq!(cache.get(0), Some(0));
        assert_eq!(cache.get(1), Some(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_merge_inserts_then_reports_known() {
        let mut cache = MemoCache::new();

        assert_eq!(cache.merge(2, 1), Merge::Inserted);
        assert_eq!(cache.merge(2, 1), Merge::Known);
        assert_eq!(cache.get(2), Some(1));
    }

    #[test]
    fn test_merge_never_overwrites() {
        let mut cache = MemoCache::new();
        cache.merge(2, 1);

        assert_eq!(cache.merge(2, 7), Merge::Rejected);
        assert_eq!(cache.get(2), Some(1));
    }

    #[test]
    fn test_merge_rejects_wrong_base_values() {
        let mut cache = MemoCache::new();

        assert_eq!(cache.merge(0, 5), Merge::Rejected);
        assert_eq!(cache.merge(1, 0), Merge::Rejected);
    }

    #[test]
    fn test_merge_rejects_value_breaking_recurrence_below() {
        let mut cache = MemoCache::new();
        cache.merge(2, 1);
        cache.merge(3, 2);

        assert_eq!(cache.merge(4, 4), Merge::Rejected);
        assert_eq!(cache.merge(4, 3), Merge::Inserted);
    }

    #[test]
    fn test_merge_rejects_value_breaking_recurrence_above() {
        // 3 and 5 known, 4 missing: 4 must satisfy F(5) = F(4) + F(3).
        let mut cache = MemoCache::new();
        cache.merge(3, 2);
        cache.merge(5, 5);

        assert_eq!(cache.merge(4, 2), Merge::Rejected);
        assert_eq!(cache.merge(4, 3), Merge::Inserted);
        assert!(cache.is_consistent());
    }

    #[test]
    fn test_merge_sparse_entries_are_accepted() {
        let mut cache = MemoCache::new();

        assert_eq!(cache.merge(10, 55), Merge::Inserted);
        assert_eq!(cache.merge(20, 6765), Merge::Inserted);
    }

    #[test]
    fn test_merge_rejects_out_of_range_index() {
        let mut cache = MemoCache::new();

        assert_eq!(cache.merge(MAX_INDEX + 1, 1), Merge::Rejected);
        assert_eq!(cache.merge(MAX_INDEX, fib(MAX_INDEX)), Merge::Inserted);
    }

    #[test]
    fn test_merge_all_is_idempotent() {
        let batch: Vec<(u64, u64)> = (2..=12).map(|n| (n, fib(n))).collect();

        let mut once = MemoCache::new();
        once.merge_all(batch.clone());

        let mut twice = MemoCache::new();
        twice.merge_all(batch.clone());
        let second = twice.merge_all(batch);

        assert_eq!(once, twice);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.known, 11);
    }

    #[test]
    fn test_from_entries_skips_corrupt_values() {
        let (cache, summary) = MemoCache::from_entries(vec![(3, 2), (2, 1), (4, 9), (5, 5)]);

        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.rejected, 1);
        assert!(!cache.contains(4));
        assert!(cache.is_consistent());
    }

    #[test]
    fn test_reset_keeps_only_base_values() {
        let mut cache = MemoCache::new();
        cache.merge_all((2..=6).map(|n| (n, fib(n))));

        cache.reset();

        assert_eq!(cache.entries(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_entries_and_highest() {
        let mut cache = MemoCache::new();
        cache.merge(3, 2);
        cache.merge(2, 1);

        assert_eq!(cache.entries(), vec![(0, 0), (1, 1), (2, 1), (3, 2)]);
        assert_eq!(cache.highest(), Some(3));
    }

    // ============================================================
    // PENDING QUEUE
    // ============================================================

    #[test]
    fn test_queue_pops_in_ascending_order() {
        let cache = MemoCache::new();
        let mut queue = PendingQueue::new();
        for index in [9, 4, 7, 2, 8] {
            queue.enqueue(index, &cache);
        }

        let drained: Vec<u64> = std::iter::from_fn(|| queue.pop_min()).collect();

        assert_eq!(drained, vec![2, 4, 7, 8, 9]);
    }

    #[test]
    fn test_queue_refuses_memoized_indices() {
        let cache = MemoCache::new();
        let mut queue = PendingQueue::new();

        assert!(!queue.enqueue(1, &cache));
        assert!(queue.enqueue(2, &cache));
        assert!(!queue.enqueue(2, &cache));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_queue_retain_unmemoized() {
        let mut cache = MemoCache::new();
        let mut queue = PendingQueue::new();
        for index in 2..=6 {
            queue.enqueue(index, &cache);
        }

        cache.merge_all((2..=4).map(|n| (n, fib(n))));
        queue.retain_unmemoized(&cache);

        assert_eq!(queue.peek_min(), Some(5));
        assert_eq!(queue.len(), 2);
    }

    // ============================================================
    // REQUEST TRACKER
    // ============================================================

    #[test]
    fn test_single_flight() {
        let mut tracker = RequestTracker::new();
        let pair = ValuePair { n1: 4, n2: 3 };

        assert!(tracker.begin(pair));
        assert!(!tracker.begin(pair), "identical request must not be issued twice");
        assert_eq!(tracker.len(), 1);

        assert!(tracker.complete(&pair));
        assert!(tracker.begin(pair), "pair can be requested again once answered");
    }

    #[test]
    fn test_complete_answered() {
        let mut tracker = RequestTracker::new();
        tracker.begin(ValuePair { n1: 4, n2: 3 });
        tracker.begin(ValuePair { n1: 9, n2: 8 });

        let completed = tracker.complete_answered(|index| index == 3 || index == 4);

        assert_eq!(completed, 1);
        assert!(tracker.is_outstanding(&ValuePair { n1: 9, n2: 8 }));
    }

    #[test]
    fn test_cancel_all() {
        let mut tracker = RequestTracker::new();
        tracker.begin(ValuePair { n1: 4, n2: 3 });
        tracker.begin(ValuePair { n1: 2, n2: 1 });

        assert_eq!(tracker.cancel_all(), 2);
        assert!(tracker.is_empty());
        assert_eq!(tracker.cancel_all(), 0);
    }
}
