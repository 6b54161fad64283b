//! Histogram collection
//!
//! Drains the kernel histogram once per interval and summarises the
//! issue table.

use crate::types::*;
use anyhow::{Context, Result};
use aya::maps::{Array, HashMap as AyaHashMap, MapData};
use iolatency_common::{AtomicHistogram, HISTOGRAM_SLOTS};
use log::debug;

/// Readable and resettable bucket counters
pub trait CounterSource {
    /// Current value of bucket `index`
    fn read(&self, index: u32) -> Result<u32>;

    /// Set bucket `index` back to zero
    fn reset(&mut self, index: u32) -> Result<()>;
}

impl CounterSource for Array<MapData, u32> {
    fn read(&self, index: u32) -> Result<u32> {
        self.get(&index, 0)
            .with_context(|| format!("Failed to read histogram bucket {}", index))
    }

    fn reset(&mut self, index: u32) -> Result<()> {
        self.set(index, 0u32, 0)
            .with_context(|| format!("Failed to reset histogram bucket {}", index))
    }
}

impl CounterSource for AtomicHistogram {
    fn read(&self, index: u32) -> Result<u32> {
        self.get(index)
            .with_context(|| format!("Histogram bucket {} out of range", index))
    }

    fn reset(&mut self, index: u32) -> Result<()> {
        self.set(index, 0);
        Ok(())
    }
}

/// Collector that drains a histogram every interval
pub struct HistogramCollector<S> {
    source: S,
    interval_seconds: u64,
    /// Intervals collected so far
    intervals: u64,
    /// Completions counted across all intervals
    total_completions: u64,
}

impl<S: CounterSource> HistogramCollector<S> {
    /// Create a new collector
    ///
    /// # Arguments
    ///
    /// * `source` - Histogram counters to drain
    /// * `interval_seconds` - Length of one collection interval
    pub fn new(source: S, interval_seconds: u64) -> Self {
        Self {
            source,
            interval_seconds,
            intervals: 0,
            total_completions: 0,
        }
    }

    /// Zero every bucket
    ///
    /// Called once before the first interval so that counts gathered
    /// between attach and the first tick are not reported.
    pub fn reset_all(&mut self) -> Result<()> {
        for index in 0..HISTOGRAM_SLOTS {
            self.source.reset(index)?;
        }
        Ok(())
    }

    /// Read every bucket and zero it right after reading
    ///
    /// The read and the reset are separate map operations, so a sample
    /// counted in between is lost.
    pub fn read_and_reset_all(&mut self) -> Result<HistogramCounts> {
        let mut counts = [0u32; HISTOGRAM_SLOTS as usize];
        for (index, count) in (0u32..).zip(counts.iter_mut()) {
            *count = self.source.read(index)?;
            self.source.reset(index)?;
        }
        Ok(counts)
    }

    /// Drain the histogram into a snapshot
    pub fn collect(&mut self) -> Result<HistogramSnapshot> {
        let counts = self.read_and_reset_all()?;
        let snapshot = HistogramSnapshot::from_counts(&counts, self.interval_seconds);

        self.intervals += 1;
        self.total_completions += snapshot.total;
        debug!(
            "Interval {}: {} completions",
            self.intervals, snapshot.total
        );

        Ok(snapshot)
    }

    /// Number of intervals collected
    pub fn intervals(&self) -> u64 {
        self.intervals
    }

    /// Completions counted across all intervals
    pub fn total_completions(&self) -> u64 {
        self.total_completions
    }

    /// Get the underlying counter source
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Summarise the issue table
///
/// Entries evicted while iterating show up as lookup errors and are
/// skipped.
pub fn read_pending(map: &AyaHashMap<MapData, u32, IssueQueue>) -> PendingStats {
    let mut stats = PendingStats::default();
    for entry in map.iter() {
        match entry {
            Ok((_tag, queue)) => stats.add_queue(&queue),
            Err(e) => debug!("Skipping issue table entry: {}", e),
        }
    }
    stats
}
