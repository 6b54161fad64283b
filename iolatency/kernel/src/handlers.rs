//! Block tracepoint handlers
//!
//! Attach to block:block_rq_issue and block:block_rq_complete and feed the
//! issue tracker and latency histogram.

use aya_ebpf::{macros::btf_tracepoint, programs::BtfTracePointContext};
use aya_log_ebpf::debug;
use iolatency_common::{on_complete_event, on_issue_event};

use crate::{
    helpers::*,
    maps::{IssueTimeMap, LatencyHist},
};

/// Track request dispatch
///
/// Attached to: block:block_rq_issue
///
/// Pushes the issue time onto the request tag's queue.
#[btf_tracepoint(function = "block_rq_issue")]
pub fn block_rq_issue(ctx: BtfTracePointContext) -> i32 {
    match try_block_rq_issue(&ctx) {
        Ok(ret) => ret,
        Err(_) => 1,
    }
}

fn try_block_rq_issue(ctx: &BtfTracePointContext) -> Result<i32, i64> {
    let issue_time = get_timestamp();

    // struct request *rq
    let rq: *const u8 = unsafe { ctx.arg(0) };
    let tag = read_request_tag(rq)?;

    on_issue_event(&mut IssueTimeMap, tag, issue_time);

    Ok(0)
}

/// Track request completion
///
/// Attached to: block:block_rq_complete
///
/// Pops the oldest issue time for the tag and counts the latency in the
/// histogram. The status and byte count arguments are not used.
#[btf_tracepoint(function = "block_rq_complete")]
pub fn block_rq_complete(ctx: BtfTracePointContext) -> i32 {
    match try_block_rq_complete(&ctx) {
        Ok(ret) => ret,
        Err(_) => 1,
    }
}

fn try_block_rq_complete(ctx: &BtfTracePointContext) -> Result<i32, i64> {
    let complete_time = get_timestamp();

    let rq: *const u8 = unsafe { ctx.arg(0) };
    let tag = read_request_tag(rq)?;

    if let Some(done) = on_complete_event(&mut IssueTimeMap, &LatencyHist, tag, complete_time) {
        debug!(ctx, "tag {} latency {} us bucket {}", tag, done.latency_us, done.index);
    }

    Ok(0)
}
