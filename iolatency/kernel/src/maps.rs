//! BPF map definitions for block I/O latency tracking
//!
//! Declares the two maps shared with userspace and binds them to the
//! storage traits of the common core.

use core::sync::atomic::AtomicU32;

use aya_ebpf::{
    bindings::BPF_NOEXIST,
    cty::c_long,
    macros::map,
    maps::{Array, LruHashMap},
};
use iolatency_common::{
    HistogramStore, IssueQueue, QueueTable, HISTOGRAM_SLOTS, ISSUE_TABLE_CAPACITY,
};

const EEXIST: c_long = 17;

/// Pending issue timestamps per request tag
///
/// Key: request tag
/// Value: IssueQueue (ring of issue timestamps in nanoseconds)
///
/// LRU: a new tag at capacity evicts the least recently used one.
#[map]
pub static ISSUE_TIME_MAP: LruHashMap<u32, IssueQueue> =
    LruHashMap::with_max_entries(ISSUE_TABLE_CAPACITY, 0);

/// Latency histogram, one counter per power-of-two microsecond bucket
///
/// Read and reset by userspace every interval.
#[map]
pub static LATENCY_HIST: Array<u32> = Array::with_max_entries(HISTOGRAM_SLOTS, 0);

/// Handle to `ISSUE_TIME_MAP`
pub struct IssueTimeMap;

impl QueueTable for IssueTimeMap {
    #[inline(always)]
    fn get_mut(&mut self, tag: u32) -> Option<&mut IssueQueue> {
        // SAFETY: the pointer refers to a live map value; concurrent
        // handlers only touch its counters through atomics.
        ISSUE_TIME_MAP.get_ptr_mut(&tag).map(|q| unsafe { &mut *q })
    }

    #[inline(always)]
    fn insert_empty(&mut self, tag: u32) -> bool {
        let empty = IssueQueue::new();
        match ISSUE_TIME_MAP.insert(&tag, &empty, BPF_NOEXIST as u64) {
            Ok(()) => true,
            // Another CPU created it first.
            Err(e) => e == -EEXIST,
        }
    }
}

/// Handle to `LATENCY_HIST`
pub struct LatencyHist;

impl HistogramStore for LatencyHist {
    #[inline(always)]
    fn slot(&self, index: u32) -> Option<&AtomicU32> {
        // The array lookup itself rejects indices past HISTOGRAM_SLOTS.
        LATENCY_HIST
            .get_ptr_mut(index)
            .map(|c| unsafe { AtomicU32::from_ptr(c) })
    }
}
