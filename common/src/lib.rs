//! Block I/O latency tracking core
//!
//! This crate holds everything the eBPF program does, expressed as plain
//! `no_std` Rust so it can be built for the BPF target and unit-tested on
//! the host: issue/completion matching per request tag, power-of-two
//! bucketing, and the shared histogram layout.
//!
//! ```text
//! block_rq_issue    -> tracker::on_issue (push timestamp for tag)
//! block_rq_complete -> tracker::on_complete (pop oldest for tag)
//!                   -> bucket::bucket_index -> HistogramStore::increment
//! userspace         -> read and reset every counter each interval
//! ```

#![no_std]

pub mod arena;
pub mod bucket;
pub mod constants;
pub mod handlers;
pub mod histogram;
pub mod tracker;
pub mod types;

// Re-export commonly used items
pub use arena::LruQueueTable;
pub use bucket::{bucket_index, bucket_range};
pub use constants::*;
pub use handlers::{on_complete_event, on_issue_event, Completion};
pub use histogram::{AtomicHistogram, HistogramStore};
pub use tracker::{on_complete, on_issue, QueueTable};
pub use types::IssueQueue;
