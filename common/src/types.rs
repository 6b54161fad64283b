//! Shared data structures between kernel and userspace
//!
//! These structures must be repr(C) to ensure consistent memory layout
//! between the eBPF program and userspace code reading the maps.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::constants::ISSUE_QUEUE_DEPTH;

/// Pending issue timestamps for one request tag
///
/// A fixed ring of `ISSUE_QUEUE_DEPTH` slots. `head` and `tail` are
/// free-running cursors; the slot they address is the cursor modulo the
/// depth. Cursor and count updates are atomic fetch-and-add/sub so that
/// handlers running on several CPUs never tear a counter, but the
/// read-check-update sequence as a whole is not serialised.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct IssueQueue {
    /// Cursor of the oldest outstanding timestamp
    pub head: u64,
    /// Cursor of the next free slot
    pub tail: u64,
    /// Number of outstanding timestamps, at most `ISSUE_QUEUE_DEPTH`
    pub count: u64,
    /// Issue timestamps (nanoseconds)
    pub slots: [u64; ISSUE_QUEUE_DEPTH],
}

impl IssueQueue {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            head: 0,
            tail: 0,
            count: 0,
            slots: [0; ISSUE_QUEUE_DEPTH],
        }
    }

    /// Number of outstanding timestamps
    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.count >= ISSUE_QUEUE_DEPTH as u64
    }

    /// Append an issue timestamp
    ///
    /// Returns `false` without touching the queue when it is full.
    #[inline(always)]
    pub fn push(&mut self, timestamp_ns: u64) -> bool {
        if self.is_full() {
            return false;
        }

        let cursor = fetch_add(&mut self.tail, 1);
        self.slots[slot_of(cursor)] = timestamp_ns;
        fetch_add(&mut self.count, 1);
        true
    }

    /// Remove and return the oldest issue timestamp
    #[inline(always)]
    pub fn pop(&mut self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }

        let cursor = fetch_add(&mut self.head, 1);
        let timestamp_ns = self.slots[slot_of(cursor)];
        fetch_sub(&mut self.count, 1);
        Some(timestamp_ns)
    }
}

impl Default for IssueQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
fn slot_of(cursor: u64) -> usize {
    (cursor % ISSUE_QUEUE_DEPTH as u64) as usize
}

#[inline(always)]
fn fetch_add(field: &mut u64, val: u64) -> u64 {
    // SAFETY: the field is a valid, aligned u64 for the lifetime of the borrow.
    unsafe { AtomicU64::from_ptr(field).fetch_add(val, Ordering::Relaxed) }
}

#[inline(always)]
fn fetch_sub(field: &mut u64, val: u64) -> u64 {
    // SAFETY: see fetch_add.
    unsafe { AtomicU64::from_ptr(field).fetch_sub(val, Ordering::Relaxed) }
}

// Compile-time layout checks
const _: () = {
    assert!(core::mem::size_of::<IssueQueue>() == 8 * (3 + ISSUE_QUEUE_DEPTH));
    assert!(core::mem::size_of::<IssueQueue>() % core::mem::align_of::<IssueQueue>() == 0);
};

// Implement Aya's Pod trait for userspace usage
#[cfg(feature = "userspace")]
mod userspace_impls {
    use super::*;

    // Pod trait implementation for reading the issue table from userspace
    unsafe impl aya::Pod for IssueQueue {}
}
