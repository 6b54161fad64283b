//! Userspace type definitions
//!
//! Defines the data structures used by the userspace program for
//! collection and rendering.
//!
//! ## Organization
//!
//! This module separates kernel and userspace types:
//! - **Kernel Types**: Types shared with the eBPF program (from iolatency_common)
//! - **Userspace Types**: Per-interval views used only for rendering

use iolatency_common::{bucket_range, HISTOGRAM_SLOTS, ISSUE_QUEUE_DEPTH, RENDERED_BUCKETS};
use serde::{Deserialize, Serialize};

// ============================================================================
// Kernel Types (from eBPF program)
// ============================================================================

pub mod kernel {
    //! Types shared between the kernel eBPF program and userspace
    //!
    //! These are re-exported from the iolatency-common crate and must
    //! maintain binary compatibility with the eBPF program.

    pub use iolatency_common::constants;
    pub use iolatency_common::types::IssueQueue;
}

// Re-export commonly used kernel types at module level for convenience
pub use kernel::IssueQueue;

/// Raw counters as read from the histogram map
pub type HistogramCounts = [u32; HISTOGRAM_SLOTS as usize];

/// One histogram interval, ready to render
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// RFC 3339 timestamp when the counters were drained
    pub timestamp: String,
    /// Length of the interval in seconds
    pub interval_seconds: u64,
    /// Completions counted across all buckets
    pub total: u64,
    /// Every allocated bucket, in index order
    pub buckets: Vec<BucketCount>,
}

/// Count for a single power-of-two bucket
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCount {
    /// Bucket index
    pub index: u32,
    /// Smallest latency in the bucket (microseconds)
    pub low_us: u64,
    /// Largest latency in the bucket (microseconds)
    pub high_us: u64,
    /// Completions counted during the interval
    pub count: u32,
}

impl HistogramSnapshot {
    /// Build a snapshot from drained counters
    pub fn from_counts(counts: &HistogramCounts, interval_seconds: u64) -> Self {
        let buckets = counts
            .iter()
            .zip(0u32..)
            .map(|(&count, index)| {
                let (low_us, high_us) = bucket_range(index);
                BucketCount {
                    index,
                    low_us,
                    high_us,
                    count,
                }
            })
            .collect();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            interval_seconds,
            total: counts.iter().map(|&c| u64::from(c)).sum(),
            buckets,
        }
    }

    /// Buckets shown in the chart (the last slot is never rendered)
    pub fn rendered(&self) -> &[BucketCount] {
        let end = self.buckets.len().min(RENDERED_BUCKETS as usize);
        &self.buckets[..end]
    }

    /// Largest rendered count, floored at 1 so it can scale a bar
    pub fn rendered_max(&self) -> u32 {
        self.rendered()
            .iter()
            .map(|b| b.count)
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

/// Summary of the in-kernel issue table
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingStats {
    /// Tags with a queue in the table
    pub tracked_tags: u64,
    /// Issues not yet matched to a completion
    pub outstanding: u64,
    /// Largest single queue
    pub deepest_queue: u64,
    /// Queues at capacity (further issues for them are dropped)
    pub full_queues: u64,
}

impl PendingStats {
    /// Fold one queue into the summary
    pub fn add_queue(&mut self, queue: &IssueQueue) {
        let depth = queue.len().min(ISSUE_QUEUE_DEPTH as u64);
        self.tracked_tags += 1;
        self.outstanding += depth;
        self.deepest_queue = self.deepest_queue.max(depth);
        if queue.is_full() {
            self.full_queues += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_counts() {
        let mut counts = [0u32; HISTOGRAM_SLOTS as usize];
        counts[0] = 3;
        counts[7] = 10;
        counts[17] = 2;

        let snapshot = HistogramSnapshot::from_counts(&counts, 5);

        assert_eq!(snapshot.total, 15);
        assert_eq!(snapshot.buckets.len(), HISTOGRAM_SLOTS as usize);
        assert_eq!(snapshot.buckets[7].low_us, 128);
        assert_eq!(snapshot.buckets[7].high_us, 255);
        assert_eq!(snapshot.rendered().len(), RENDERED_BUCKETS as usize);
        assert_eq!(snapshot.rendered_max(), 10);
    }

    #[test]
    fn test_rendered_max_ignores_last_slot() {
        let mut counts = [0u32; HISTOGRAM_SLOTS as usize];
        counts[17] = 99;

        let snapshot = HistogramSnapshot::from_counts(&counts, 5);
        assert_eq!(snapshot.rendered_max(), 1);
    }

    #[test]
    fn test_pending_stats() {
        let mut busy = IssueQueue::new();
        for ts in 0..ISSUE_QUEUE_DEPTH as u64 {
            busy.push(ts);
        }
        let mut light = IssueQueue::new();
        light.push(1);
        light.push(2);

        let mut stats = PendingStats::default();
        stats.add_queue(&busy);
        stats.add_queue(&light);
        stats.add_queue(&IssueQueue::new());

        assert_eq!(stats.tracked_tags, 3);
        assert_eq!(stats.outstanding, ISSUE_QUEUE_DEPTH as u64 + 2);
        assert_eq!(stats.deepest_queue, ISSUE_QUEUE_DEPTH as u64);
        assert_eq!(stats.full_queues, 1);
    }
}
