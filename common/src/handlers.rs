//! Issue and completion event handlers
//!
//! The two entry points the kernel program calls for every block request.
//! Both are loop-free apart from the table's own bounded lookup, never
//! block, and never allocate. The clock is passed in by the caller.

use crate::bucket::bucket_index;
use crate::constants::NSEC_PER_USEC;
use crate::histogram::HistogramStore;
use crate::tracker::{on_complete, on_issue, QueueTable};

/// A completion that was matched to an issue and counted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Issue-to-completion latency in microseconds
    pub latency_us: u64,
    /// Histogram bucket the latency fell into
    pub index: u32,
}

/// Handle a request issue: remember when `tag` was dispatched
#[inline(always)]
pub fn on_issue_event<T: QueueTable>(table: &mut T, tag: u32, now_ns: u64) {
    // A full queue drops the timestamp; nothing to report.
    let _ = on_issue(table, tag, now_ns);
}

/// Handle a request completion: match, measure and count
///
/// Returns `None` when there is no outstanding issue for `tag`.
#[inline(always)]
pub fn on_complete_event<T, H>(table: &mut T, hist: &H, tag: u32, now_ns: u64) -> Option<Completion>
where
    T: QueueTable,
    H: HistogramStore,
{
    let issued_ns = on_complete(table, tag)?;
    let latency_us = now_ns.wrapping_sub(issued_ns) / NSEC_PER_USEC;
    let index = bucket_index(latency_us);
    hist.increment(index);

    Some(Completion { latency_us, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::LruQueueTable;
    use crate::constants::{HISTOGRAM_SLOTS, ISSUE_TABLE_CAPACITY};
    use crate::histogram::AtomicHistogram;

    #[test]
    fn test_single_request_end_to_end() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        on_issue_event(&mut table, 5, 0);
        let done = on_complete_event(&mut table, &hist, 5, 150_000);

        // 150us smears to 255 and lands in the 128..=255 bucket.
        assert_eq!(done, Some(Completion { latency_us: 150, index: 7 }));
        let counts = hist.read_and_reset_all();
        for (i, &count) in counts.iter().enumerate() {
            assert_eq!(count, u32::from(i == 7), "bucket {i}");
        }
    }

    #[test]
    fn test_sub_microsecond_latency_counts_in_first_bucket() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        on_issue_event(&mut table, 1, 1_000);
        let done = on_complete_event(&mut table, &hist, 1, 1_400);

        assert_eq!(done, Some(Completion { latency_us: 0, index: 0 }));
        assert_eq!(hist.get(0), Some(1));
    }

    #[test]
    fn test_unmatched_completion_counts_nothing() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        assert_eq!(on_complete_event(&mut table, &hist, 12, 10_000), None);
        assert_eq!(hist.read_and_reset_all(), [0; HISTOGRAM_SLOTS as usize]);
    }

    #[test]
    fn test_bucket_past_allocated_slots_is_dropped() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        // 2^20 us lands in bucket 20, beyond the 18 allocated counters.
        on_issue_event(&mut table, 2, 0);
        let done = on_complete_event(&mut table, &hist, 2, (1u64 << 20) * 1_000);

        assert_eq!(done.map(|c| c.index), Some(20));
        assert_eq!(hist.read_and_reset_all().iter().sum::<u32>(), 0);
    }

    #[test]
    fn test_evicted_tag_no_longer_matches() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        for tag in 0..ISSUE_TABLE_CAPACITY {
            on_issue_event(&mut table, tag, u64::from(tag));
        }
        on_issue_event(&mut table, ISSUE_TABLE_CAPACITY, 1_000);

        assert_eq!(on_complete_event(&mut table, &hist, 0, 5_000), None);
        assert!(on_complete_event(&mut table, &hist, 1, 5_000).is_some());
        assert!(on_complete_event(&mut table, &hist, ISSUE_TABLE_CAPACITY, 5_000).is_some());
        assert_eq!(hist.read_and_reset_all().iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_interleaved_tags_match_their_own_issues() {
        let mut table = LruQueueTable::new();
        let hist = AtomicHistogram::new();

        on_issue_event(&mut table, 1, 0);
        on_issue_event(&mut table, 2, 0);
        on_issue_event(&mut table, 1, 1_000_000);

        let a = on_complete_event(&mut table, &hist, 1, 2_000_000);
        let b = on_complete_event(&mut table, &hist, 1, 2_000_000);
        let c = on_complete_event(&mut table, &hist, 2, 4_000);

        assert_eq!(a.map(|c| c.latency_us), Some(2_000));
        assert_eq!(b.map(|c| c.latency_us), Some(1_000));
        assert_eq!(c.map(|c| c.latency_us), Some(4));
    }
}
