//! Periodic histogram polling
//!
//! Drives the collector on a fixed interval and renders each snapshot
//! until the run duration elapses or the process is interrupted.

use crate::{
    collector::{read_pending, CounterSource, HistogramCollector},
    render::SnapshotRenderer,
    types::{HistogramSnapshot, IssueQueue},
};
use anyhow::Result;
use aya::maps::{HashMap as AyaHashMap, MapData};
use log::{debug, info};
use std::{future, io::Write, time::Duration};
use tokio::{
    signal,
    time::{interval_at, sleep, Instant},
};

/// Poll loop that drains, renders and discards one interval at a time
pub struct Poller<S, W> {
    collector: HistogramCollector<S>,
    renderer: Box<dyn SnapshotRenderer + Send>,
    out: W,
    issue_table: Option<AyaHashMap<MapData, u32, IssueQueue>>,
    period: Duration,
}

impl<S: CounterSource, W: Write> Poller<S, W> {
    /// Create a new poller
    ///
    /// # Arguments
    ///
    /// * `collector` - Histogram collector to drain
    /// * `renderer` - Output format for each interval
    /// * `out` - Destination for rendered snapshots
    /// * `period` - Time between two collections
    pub fn new(
        collector: HistogramCollector<S>,
        renderer: Box<dyn SnapshotRenderer + Send>,
        out: W,
        period: Duration,
    ) -> Self {
        Self {
            collector,
            renderer,
            out,
            issue_table: None,
            period,
        }
    }

    /// Also summarise the kernel issue table every interval (debug log)
    pub fn with_issue_table(mut self, table: AyaHashMap<MapData, u32, IssueQueue>) -> Self {
        self.issue_table = Some(table);
        self
    }

    /// Collect and render one interval
    pub fn tick(&mut self) -> Result<HistogramSnapshot> {
        let snapshot = self.collector.collect()?;
        self.renderer.render(&snapshot, &mut self.out)?;

        if let Some(table) = &self.issue_table {
            let pending = read_pending(table);
            debug!(
                "Issue table: {} tags, {} outstanding, deepest {}, {} full",
                pending.tracked_tags, pending.outstanding, pending.deepest_queue, pending.full_queues
            );
        }

        Ok(snapshot)
    }

    /// Poll until `duration` elapses (forever if `None`) or Ctrl-C
    pub async fn run(&mut self, duration: Option<Duration>) -> Result<()> {
        // First collection happens one full period after start.
        let mut ticker = interval_at(Instant::now() + self.period, self.period);

        let deadline = async {
            match duration {
                Some(d) => sleep(d).await,
                None => future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick()?;
                }
                _ = &mut deadline => {
                    info!("Duration reached, shutting down...");
                    break;
                }
                res = &mut ctrl_c => {
                    res?;
                    info!("Interrupted, shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Get the collector
    pub fn collector(&self) -> &HistogramCollector<S> {
        &self.collector
    }

    /// Get the output sink
    pub fn output(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{JsonRenderer, TableRenderer};
    use iolatency_common::{AtomicHistogram, HistogramStore, RENDERED_BUCKETS};

    #[test]
    fn test_tick_renders_and_resets() {
        let hist = AtomicHistogram::new();
        hist.increment(3);
        hist.increment(3);

        let collector = HistogramCollector::new(hist, 5);
        let mut poller = Poller::new(
            collector,
            Box::new(TableRenderer::new(false)),
            Vec::<u8>::new(),
            Duration::from_secs(5),
        );

        let snapshot = poller.tick().unwrap();
        assert_eq!(snapshot.buckets[3].count, 2);

        let text = String::from_utf8(poller.output().clone()).unwrap();
        assert_eq!(text.lines().count(), 1 + RENDERED_BUCKETS as usize);
        assert!(text.contains("        8 -> 15       : 2        |"));

        assert_eq!(poller.tick().unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_run_stops_after_duration() {
        let collector = HistogramCollector::new(AtomicHistogram::new(), 0);
        let mut poller = Poller::new(
            collector,
            Box::new(JsonRenderer),
            Vec::<u8>::new(),
            Duration::from_millis(20),
        );

        poller.run(Some(Duration::from_millis(110))).await.unwrap();

        let intervals = poller.collector().intervals();
        assert!(intervals >= 1, "expected at least one interval, got {intervals}");
        let text = String::from_utf8(poller.output().clone()).unwrap();
        assert_eq!(text.lines().count() as u64, intervals);
    }
}
