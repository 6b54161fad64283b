//! Snapshot renderers
//!
//! Turn one interval's histogram into text: the classic ASCII
//! distribution chart, a JSON line, or Prometheus exposition format.
//! Renderers write to any `io::Write` and keep no history.

use crate::types::HistogramSnapshot;
use anyhow::{Context, Result};
use iolatency_common::BAR_WIDTH;
use std::io::Write;

/// ANSI sequence that clears the terminal and homes the cursor
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Trait for snapshot renderers
pub trait SnapshotRenderer {
    /// Render one snapshot
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Histogram interval to render
    /// * `out` - Destination for the rendered text
    fn render(&self, snapshot: &HistogramSnapshot, out: &mut dyn Write) -> Result<()>;
}

/// Render format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererType {
    /// ASCII distribution chart
    Table,
    /// One JSON object per line
    Json,
    /// Prometheus text format
    Prometheus,
}

impl RendererType {
    /// Parse a `--format` value
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "prometheus" | "prom" => Ok(Self::Prometheus),
            _ => anyhow::bail!(
                "Unsupported format: {}. Use table, json, or prometheus",
                format
            ),
        }
    }

    /// Build the renderer for this format
    pub fn build(self, clear_screen: bool) -> Box<dyn SnapshotRenderer + Send> {
        match self {
            Self::Table => Box::new(TableRenderer::new(clear_screen)),
            Self::Json => Box::new(JsonRenderer),
            Self::Prometheus => Box::new(PrometheusRenderer::new("iolatency")),
        }
    }
}

/// Length of the distribution bar for `count` when the interval's largest
/// bucket holds `max`
///
/// `max` is expected to be at least 1.
pub fn bar_length(count: u32, max: u32) -> usize {
    let max = max.max(1);
    let star_index = ((1.0 - f64::from(count) / f64::from(max)) * BAR_WIDTH as f64) as usize;
    BAR_WIDTH - star_index.min(BAR_WIDTH)
}

/// ASCII chart renderer
///
/// ```text
///         usecs         : count     distribution
///         0 -> 1        : 12       |**                                      |
///         2 -> 3        : 240      |****************************************|
/// ```
pub struct TableRenderer {
    clear_screen: bool,
}

impl TableRenderer {
    /// Create a new table renderer
    ///
    /// # Arguments
    ///
    /// * `clear_screen` - Clear the terminal before each chart
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }

    fn to_table(snapshot: &HistogramSnapshot) -> String {
        let max = snapshot.rendered_max();
        let mut output = format!("{:8}usecs{:8} : count     distribution\n", "", "");

        for bucket in snapshot.rendered() {
            let bar = "*".repeat(bar_length(bucket.count, max));
            output.push_str(&format!(
                "{:>9} -> {:<9}: {:<9}|{:<width$}|\n",
                bucket.low_us,
                bucket.high_us,
                bucket.count,
                bar,
                width = BAR_WIDTH
            ));
        }

        output
    }
}

impl SnapshotRenderer for TableRenderer {
    fn render(&self, snapshot: &HistogramSnapshot, out: &mut dyn Write) -> Result<()> {
        if self.clear_screen {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        out.write_all(Self::to_table(snapshot).as_bytes())
            .context("Failed to write histogram table")?;
        out.flush()?;
        Ok(())
    }
}

/// JSON lines renderer
pub struct JsonRenderer;

impl SnapshotRenderer for JsonRenderer {
    fn render(&self, snapshot: &HistogramSnapshot, out: &mut dyn Write) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        writeln!(out, "{}", json).context("Failed to write JSON snapshot")?;
        out.flush()?;
        Ok(())
    }
}

/// Prometheus text format renderer
pub struct PrometheusRenderer {
    prefix: String,
}

impl PrometheusRenderer {
    /// Create a new Prometheus renderer
    ///
    /// # Arguments
    ///
    /// * `prefix` - Metric name prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn to_prometheus_format(&self, snapshot: &HistogramSnapshot) -> String {
        let p = &self.prefix;
        let mut output = String::new();

        output.push_str(&format!("# HELP {p}_completions Block I/O completions counted in the interval\n"));
        output.push_str(&format!("# TYPE {p}_completions gauge\n"));
        output.push_str(&format!("{p}_completions {}\n", snapshot.total));
        output.push('\n');

        output.push_str(&format!("# HELP {p}_interval_seconds Length of the collection interval\n"));
        output.push_str(&format!("# TYPE {p}_interval_seconds gauge\n"));
        output.push_str(&format!("{p}_interval_seconds {}\n", snapshot.interval_seconds));
        output.push('\n');

        output.push_str(&format!("# HELP {p}_latency_bucket Completions per log2 latency bucket (microseconds)\n"));
        output.push_str(&format!("# TYPE {p}_latency_bucket gauge\n"));
        for bucket in &snapshot.buckets {
            output.push_str(&format!(
                "{p}_latency_bucket{{low_us=\"{}\",high_us=\"{}\"}} {}\n",
                bucket.low_us, bucket.high_us, bucket.count
            ));
        }
        output.push('\n');

        output
    }
}

impl SnapshotRenderer for PrometheusRenderer {
    fn render(&self, snapshot: &HistogramSnapshot, out: &mut dyn Write) -> Result<()> {
        out.write_all(self.to_prometheus_format(snapshot).as_bytes())
            .context("Failed to write Prometheus snapshot")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistogramCounts;
    use iolatency_common::{HISTOGRAM_SLOTS, RENDERED_BUCKETS};

    fn create_test_snapshot() -> HistogramSnapshot {
        let mut counts: HistogramCounts = [0; HISTOGRAM_SLOTS as usize];
        counts[0] = 10;
        counts[7] = 40;
        counts[8] = 20;
        HistogramSnapshot::from_counts(&counts, 5)
    }

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(0, 1), 0);
        assert_eq!(bar_length(40, 40), BAR_WIDTH);
        assert_eq!(bar_length(20, 40), 20);
        assert_eq!(bar_length(10, 40), 10);
        assert_eq!(bar_length(0, 0), 0);
        assert_eq!(bar_length(1, 3), 14);
    }

    #[test]
    fn test_table_format() {
        let table = TableRenderer::to_table(&create_test_snapshot());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 1 + RENDERED_BUCKETS as usize);
        assert!(lines[0].contains("usecs"));
        assert!(lines[0].contains("distribution"));
        assert_eq!(
            lines[1 + 7],
            format!("      128 -> 255      : 40       |{}|", "*".repeat(40))
        );
        assert!(lines[1 + 8].contains(&format!("|{:<40}|", "*".repeat(20))));
        assert!(lines[1 + 1].contains(&format!("|{}|", " ".repeat(40))));
    }

    #[test]
    fn test_table_clears_screen() {
        let mut out: Vec<u8> = Vec::new();
        TableRenderer::new(true)
            .render(&create_test_snapshot(), &mut out)
            .unwrap();
        assert!(out.starts_with(CLEAR_SCREEN.as_bytes()));

        let mut out: Vec<u8> = Vec::new();
        TableRenderer::new(false)
            .render(&create_test_snapshot(), &mut out)
            .unwrap();
        assert!(!out.starts_with(CLEAR_SCREEN.as_bytes()));
    }

    #[test]
    fn test_json_format() {
        let mut out: Vec<u8> = Vec::new();
        JsonRenderer.render(&create_test_snapshot(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let parsed: HistogramSnapshot = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(parsed.total, 70);
        assert_eq!(parsed.buckets.len(), HISTOGRAM_SLOTS as usize);
    }

    #[test]
    fn test_prometheus_format() {
        let prometheus =
            PrometheusRenderer::new("iolatency").to_prometheus_format(&create_test_snapshot());

        assert!(prometheus.contains("iolatency_completions 70"));
        assert!(prometheus.contains("iolatency_interval_seconds 5"));
        assert!(prometheus.contains("iolatency_latency_bucket{low_us=\"128\",high_us=\"255\"} 40"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(RendererType::parse("TABLE").unwrap(), RendererType::Table);
        assert_eq!(RendererType::parse("json").unwrap(), RendererType::Json);
        assert_eq!(RendererType::parse("prom").unwrap(), RendererType::Prometheus);
        assert!(RendererType::parse("csv").is_err());
    }
}
