//! eBPF Block I/O Latency Probe - Userspace Program
//!
//! Loads the eBPF program, attaches the block request tracepoints, and
//! prints a log2 histogram of request latency every interval.
//!
//! ## Usage
//!
//! ```bash
//! # Live chart, refreshed every 5 seconds until Ctrl-C
//! sudo ./iolatency --ebpf-object path/to/iolatency
//!
//! # One JSON line per second for a minute
//! sudo ./iolatency --interval 1 --duration 60 --format json
//!
//! # Kernel with a different struct request layout
//! sudo ./iolatency --tag-offset 40
//! ```

use anyhow::Result;
use clap::Parser;
use iolatency_common::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUEST_TAG_OFFSET};
use iolatency_userspace::{
    collector::HistogramCollector, loader::ProbeLoader, poller::Poller, render::RendererType,
};
use log::{info, warn};
use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    time::Duration,
};

/// Block device I/O latency histogram using eBPF
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Seconds between two histogram refreshes
    #[clap(short, long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// Duration to run the probe (in seconds, 0 = until interrupted)
    #[clap(short, long, default_value_t = 0)]
    duration: u64,

    /// Output format (table, json, prometheus)
    #[clap(short, long, default_value = "table")]
    format: String,

    /// Do not clear the terminal before each table
    #[clap(long)]
    no_clear: bool,

    /// Path to eBPF object file (if not embedded)
    #[clap(long)]
    ebpf_object: Option<PathBuf>,

    /// Byte offset of `tag` in the kernel's struct request
    #[clap(long, default_value_t = DEFAULT_REQUEST_TAG_OFFSET)]
    tag_offset: u32,

    /// Verbose logging
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("Starting eBPF block I/O latency probe...");
    info!("   Interval: {} seconds", args.interval);
    info!(
        "   Duration: {} seconds",
        if args.duration == 0 {
            "infinite".to_string()
        } else {
            args.duration.to_string()
        }
    );
    info!("   Format: {}", args.format);

    // Validate interval
    if args.interval == 0 {
        anyhow::bail!("Interval must be >= 1 second");
    }

    let format = RendererType::parse(&args.format)?;
    let clear_screen = format == RendererType::Table && !args.no_clear && io::stdout().is_terminal();

    // Load eBPF program
    let mut loader = ProbeLoader::load(args.ebpf_object.clone(), args.tag_offset)?;

    // Initialize eBPF logger (optional)
    loader.init_logger();

    // Attach tracepoints
    loader.attach_tracepoints()?;

    // Start from an empty histogram
    let mut collector = HistogramCollector::new(loader.histogram()?, args.interval);
    collector.reset_all()?;

    let mut poller = Poller::new(
        collector,
        format.build(clear_screen),
        io::stdout(),
        Duration::from_secs(args.interval),
    );
    match loader.issue_table() {
        Ok(table) => poller = poller.with_issue_table(table),
        Err(e) => warn!("Issue table not available for inspection: {:#}", e),
    }

    info!("Tracing block I/O... Hit Ctrl-C to end.");

    let duration = if args.duration > 0 {
        Some(Duration::from_secs(args.duration))
    } else {
        None
    };
    poller.run(duration).await?;

    info!(
        "Collected {} intervals, {} completions",
        poller.collector().intervals(),
        poller.collector().total_completions()
    );

    Ok(())
}
