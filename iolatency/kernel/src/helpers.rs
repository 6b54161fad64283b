//! Helper functions for the eBPF program
//!
//! Thin wrappers around BPF helpers and the request layout.

use aya_ebpf::helpers::{bpf_ktime_get_ns, bpf_probe_read_kernel};
use iolatency_common::DEFAULT_REQUEST_TAG_OFFSET;

/// Byte offset of `int tag` inside `struct request`
///
/// Patched by the loader before the program is loaded.
#[no_mangle]
static REQUEST_TAG_OFFSET: u32 = DEFAULT_REQUEST_TAG_OFFSET;

/// Get current monotonic timestamp in nanoseconds
#[inline(always)]
pub fn get_timestamp() -> u64 {
    unsafe { bpf_ktime_get_ns() }
}

/// Read the hardware queue tag of a block request
///
/// `rq` is the `struct request *` handed to the block tracepoints.
#[inline(always)]
pub fn read_request_tag(rq: *const u8) -> Result<u32, i64> {
    if rq.is_null() {
        return Err(-1);
    }

    // Volatile so the patched value is read instead of the initialiser.
    let offset = unsafe { core::ptr::read_volatile(&REQUEST_TAG_OFFSET) };
    unsafe { bpf_probe_read_kernel(rq.add(offset as usize) as *const u32) }
}
