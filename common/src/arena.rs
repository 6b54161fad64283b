//! Fixed-capacity LRU issue table
//!
//! Host-side counterpart of the kernel's LRU hash map: a pre-sized array
//! of entries addressed by index, a logical clock for recency, and no
//! heap allocation. Every operation is a bounded scan over
//! `ISSUE_TABLE_CAPACITY` entries.

use crate::constants::ISSUE_TABLE_CAPACITY;
use crate::tracker::QueueTable;
use crate::types::IssueQueue;

const CAPACITY: usize = ISSUE_TABLE_CAPACITY as usize;

#[derive(Clone, Copy, Debug)]
struct Entry {
    tag: u32,
    last_used: u64,
    queue: IssueQueue,
}

/// Tag -> issue queue table holding at most `ISSUE_TABLE_CAPACITY` tags
#[derive(Debug)]
pub struct LruQueueTable {
    entries: [Option<Entry>; CAPACITY],
    clock: u64,
}

impl LruQueueTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: [None; CAPACITY],
            clock: 0,
        }
    }

    /// Number of tags currently tracked
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `tag` has a queue, without refreshing its recency
    pub fn contains(&self, tag: u32) -> bool {
        self.position(tag).is_some()
    }

    /// Read-only view of the queue for `tag`, without refreshing its recency
    pub fn peek(&self, tag: u32) -> Option<&IssueQueue> {
        self.position(tag)
            .and_then(|i| self.entries[i].as_ref())
            .map(|e| &e.queue)
    }

    fn position(&self, tag: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, Some(entry) if entry.tag == tag))
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Index to store a new tag in: a free entry, else the least recently used
    fn victim(&self) -> usize {
        let mut victim = 0;
        let mut oldest = u64::MAX;
        for (i, entry) in self.entries.iter().enumerate() {
            match entry {
                None => return i,
                Some(e) if e.last_used < oldest => {
                    oldest = e.last_used;
                    victim = i;
                }
                Some(_) => {}
            }
        }
        victim
    }
}

impl Default for LruQueueTable {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueTable for LruQueueTable {
    fn get_mut(&mut self, tag: u32) -> Option<&mut IssueQueue> {
        let i = self.position(tag)?;
        let now = self.tick();
        let entry = self.entries[i].as_mut()?;
        entry.last_used = now;
        Some(&mut entry.queue)
    }

    fn insert_empty(&mut self, tag: u32) -> bool {
        if self.contains(tag) {
            return true;
        }
        let i = self.victim();
        let now = self.tick();
        self.entries[i] = Some(Entry {
            tag,
            last_used: now,
            queue: IssueQueue::new(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{on_complete, on_issue};

    fn fill(table: &mut LruQueueTable) {
        for tag in 0..ISSUE_TABLE_CAPACITY {
            assert!(on_issue(table, tag, u64::from(tag) + 1));
        }
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = LruQueueTable::new();
        assert!(table.insert_empty(4));
        if let Some(q) = table.get_mut(4) {
            assert!(q.push(99));
        }
        assert!(table.insert_empty(4));
        assert_eq!(table.peek(4).map(|q| q.len()), Some(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut table = LruQueueTable::new();
        fill(&mut table);
        assert_eq!(table.len(), CAPACITY);

        // A 101st tag pushes out tag 0, the oldest untouched entry.
        assert!(on_issue(&mut table, 500, 1));
        assert_eq!(table.len(), CAPACITY);
        assert!(!table.contains(0));
        assert_eq!(on_complete(&mut table, 0), None);
        assert_eq!(on_complete(&mut table, 500), Some(1));
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let mut table = LruQueueTable::new();
        fill(&mut table);

        // Touching tag 0 makes tag 1 the eviction victim instead.
        assert!(table.get_mut(0).is_some());
        assert!(on_issue(&mut table, 500, 1));

        assert!(table.contains(0));
        assert!(!table.contains(1));
        assert_eq!(on_complete(&mut table, 0), Some(1));
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut table = LruQueueTable::new();
        fill(&mut table);

        assert!(table.peek(0).is_some());
        assert!(on_issue(&mut table, 500, 1));
        assert!(!table.contains(0));
    }
}
