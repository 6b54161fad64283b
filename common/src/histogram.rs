//! Latency histogram storage
//!
//! One `u32` counter per power-of-two bucket, shared between the kernel
//! writer and the userspace reader. Writers only ever fetch-and-add.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::constants::HISTOGRAM_SLOTS;

/// Fixed array of atomic bucket counters
pub trait HistogramStore {
    /// Counter for `index`, or `None` outside the allocated slots
    fn slot(&self, index: u32) -> Option<&AtomicU32>;

    /// Add one sample to bucket `index`
    ///
    /// Out-of-range indices are ignored.
    #[inline(always)]
    fn increment(&self, index: u32) {
        if let Some(counter) = self.slot(index) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// In-process histogram with the same slot layout as the kernel array
#[derive(Debug, Default)]
pub struct AtomicHistogram {
    buckets: [AtomicU32; HISTOGRAM_SLOTS as usize],
}

impl AtomicHistogram {
    /// Create a histogram with every bucket at zero
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            buckets: [ZERO; HISTOGRAM_SLOTS as usize],
        }
    }

    /// Current value of bucket `index`
    pub fn get(&self, index: u32) -> Option<u32> {
        self.slot(index).map(|c| c.load(Ordering::Relaxed))
    }

    /// Overwrite bucket `index`; out-of-range indices are ignored
    pub fn set(&self, index: u32, value: u32) {
        if let Some(counter) = self.slot(index) {
            counter.store(value, Ordering::Relaxed);
        }
    }

    /// Read every bucket, zeroing each one right after it is read
    ///
    /// The read and the zero are two separate operations, so an increment
    /// landing in between is lost. The histogram is a rate indicator and
    /// tolerates that.
    pub fn read_and_reset_all(&self) -> [u32; HISTOGRAM_SLOTS as usize] {
        let mut counts = [0u32; HISTOGRAM_SLOTS as usize];
        for (count, bucket) in counts.iter_mut().zip(self.buckets.iter()) {
            *count = bucket.load(Ordering::Relaxed);
            bucket.store(0, Ordering::Relaxed);
        }
        counts
    }
}

impl HistogramStore for AtomicHistogram {
    #[inline(always)]
    fn slot(&self, index: u32) -> Option<&AtomicU32> {
        self.buckets.get(index as usize)
    }
}
