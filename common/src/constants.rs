//! Shared constants for the block I/O latency probe
//!
//! These constants are used by both the kernel program and the userspace
//! loader so that map sizes, names and bucket layout always agree.

// ============================================================================
// BPF Map Sizes
// ============================================================================

/// Number of issue timestamps buffered per request tag
pub const ISSUE_QUEUE_DEPTH: usize = 50;

/// Maximum number of distinct request tags tracked at once
///
/// The issue table is an LRU hash map, so the least recently used tag is
/// evicted when a new tag arrives at capacity.
pub const ISSUE_TABLE_CAPACITY: u32 = 100;

/// Number of counters in the latency histogram
pub const HISTOGRAM_SLOTS: u32 = 18;

/// Number of histogram buckets shown by the table renderer
///
/// The last slot is allocated but never rendered.
pub const RENDERED_BUCKETS: u32 = 17;

// ============================================================================
// Map and Program Names
// ============================================================================

/// Name of the tag -> issue queue LRU map
pub const ISSUE_TIME_MAP: &str = "ISSUE_TIME_MAP";

/// Name of the latency histogram array
pub const LATENCY_HIST: &str = "LATENCY_HIST";

/// Program attached to the block:block_rq_issue tracepoint
pub const PROG_RQ_ISSUE: &str = "block_rq_issue";

/// Program attached to the block:block_rq_complete tracepoint
pub const PROG_RQ_COMPLETE: &str = "block_rq_complete";

/// Global holding the byte offset of `tag` inside `struct request`
pub const REQUEST_TAG_OFFSET_SYMBOL: &str = "REQUEST_TAG_OFFSET";

// ============================================================================
// Kernel Layout
// ============================================================================

/// Byte offset of `int tag` in `struct request` on 64-bit 5.x/6.x kernels
///
/// `q`, `mq_ctx` and `mq_hctx` pointers, then `cmd_flags` and `rq_flags`.
pub const DEFAULT_REQUEST_TAG_OFFSET: u32 = 32;

// ============================================================================
// Bucketing
// ============================================================================

/// De Bruijn multiplier for the 32-bit integer log2
pub const DEBRUIJN_MULTIPLIER: u32 = 0x07C4_ACDD;

/// Maps the top five bits of `smeared * DEBRUIJN_MULTIPLIER` to the
/// position of the highest set bit.
pub const DEBRUIJN_TABLE: [u32; 32] = [
    0, 9, 1, 10, 13, 21, 2, 29, //
    11, 14, 16, 18, 22, 25, 3, 30, //
    8, 12, 20, 28, 15, 17, 24, 7, //
    19, 27, 23, 6, 26, 5, 4, 31,
];

/// Nanoseconds per microsecond
pub const NSEC_PER_USEC: u64 = 1_000;

// ============================================================================
// Rendering
// ============================================================================

/// Default polling interval of the collector (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Width of the distribution bar in the table renderer
pub const BAR_WIDTH: usize = 40;
