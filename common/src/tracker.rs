//! Per-tag issue tracking
//!
//! Matches each completion to the oldest outstanding issue of the same
//! request tag. Storage sits behind [`QueueTable`] so the same algorithm
//! runs against the kernel LRU map and the host-side arena.

use crate::types::IssueQueue;

/// Tag -> issue queue storage with least-recently-used eviction
pub trait QueueTable {
    /// Look up the queue for `tag`, refreshing its recency
    fn get_mut(&mut self, tag: u32) -> Option<&mut IssueQueue>;

    /// Create an empty queue for `tag` unless one already exists
    ///
    /// Evicts the least recently used tag when the table is full.
    /// Returns `false` if the table refused the insert.
    fn insert_empty(&mut self, tag: u32) -> bool;

    /// Look up the queue for `tag`, creating it if needed
    #[inline(always)]
    fn get_or_create(&mut self, tag: u32) -> Option<&mut IssueQueue> {
        if self.get_mut(tag).is_none() && !self.insert_empty(tag) {
            return None;
        }
        self.get_mut(tag)
    }
}

/// Record an issue timestamp for `tag`
///
/// Returns `false` when the timestamp was dropped, either because the
/// tag's queue is full or because no queue could be created.
#[inline(always)]
pub fn on_issue<T: QueueTable>(table: &mut T, tag: u32, timestamp_ns: u64) -> bool {
    match table.get_or_create(tag) {
        Some(queue) => queue.push(timestamp_ns),
        None => false,
    }
}

/// Take the oldest outstanding issue timestamp for `tag`
///
/// `None` when the tag is unknown (evicted, or issued before the probe
/// attached) or has nothing outstanding.
#[inline(always)]
pub fn on_complete<T: QueueTable>(table: &mut T, tag: u32) -> Option<u64> {
    table.get_mut(tag)?.pop()
}
