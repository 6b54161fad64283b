//! eBPF Block I/O Latency Probe - Kernel Space Program
//!
//! This eBPF program measures block device request latency by attaching
//! to the block_rq_issue and block_rq_complete tracepoints.
//!
//! Each issue pushes a timestamp onto a per-tag queue; each completion
//! pops the oldest timestamp for its tag and counts the elapsed time in a
//! log2 histogram that userspace drains periodically.
//!
//! ## Architecture
//!
//! ```text
//! block_rq_issue()    -> Push timestamp into ISSUE_TIME_MAP[tag]
//!                        |
//!                        v
//! block_rq_complete() -> Pop oldest timestamp, bucket latency,
//!                        increment LATENCY_HIST[bucket]
//!                        |
//!                        v
//! Userspace           -> Read and reset LATENCY_HIST, render chart
//! ```
//!
//! ## Usage
//!
//! This program must be compiled for the bpfel-unknown-none target:
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! The compiled bytecode is then loaded by the userspace program.

#![no_std]
#![no_main]

mod handlers;
mod helpers;
mod maps;

// Re-export programs so they're visible to the loader
pub use handlers::{block_rq_complete, block_rq_issue};

// Re-export maps for verification
pub use maps::{ISSUE_TIME_MAP, LATENCY_HIST};

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    // eBPF programs cannot panic - the verifier rejects any path to here
    loop {}
}
