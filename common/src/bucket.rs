//! Power-of-two latency bucketing
//!
//! Constant-time integer log2 via de Bruijn multiplication. The kernel
//! verifier needs a statically bounded instruction count, so the highest
//! set bit is found with five shifts, one multiply and a table lookup
//! instead of a loop or a bit-scan instruction.

use crate::constants::{DEBRUIJN_MULTIPLIER, DEBRUIJN_TABLE};

/// Map a latency in microseconds to its histogram bucket
///
/// Returns the position of the highest set bit of `latency_us` (0..=31),
/// with 0 treated as 1. Only the low 32 bits of the smeared value take
/// part in the multiply, so inputs at or above 2^32 alias to a lower
/// bucket; microsecond deltas never get there in practice.
#[inline(always)]
pub fn bucket_index(latency_us: u64) -> u32 {
    let mut v = if latency_us == 0 { 1 } else { latency_us };

    // Smear the highest set bit into every lower bit.
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;

    let key = (v as u32).wrapping_mul(DEBRUIJN_MULTIPLIER) >> 27;
    DEBRUIJN_TABLE[key as usize]
}

/// Inclusive range of microsecond values that land in `index`
///
/// Bucket 0 also holds zero.
pub const fn bucket_range(index: u32) -> (u64, u64) {
    if index == 0 {
        return (0, 1);
    }
    let low = 1u64 << index;
    (low, (low << 1) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shares_bucket_with_one() {
        assert_eq!(bucket_index(0), bucket_index(1));
        assert_eq!(bucket_index(0), 0);
    }

    #[test]
    fn test_known_values() {
        let cases: [(u64, u32); 10] = [
            (1, 0),
            (2, 1),
            (3, 1),
            (4, 2),
            (150, 7),
            (255, 7),
            (256, 8),
            (1023, 9),
            (1024, 10),
            (65535, 15),
        ];
        for (latency_us, expected) in cases {
            assert_eq!(bucket_index(latency_us), expected, "latency {latency_us}");
        }
    }

    #[test]
    fn test_matches_highest_set_bit_below_2_32() {
        for shift in 0..32 {
            let low = 1u64 << shift;
            let high = (low << 1) - 1;
            assert_eq!(bucket_index(low), shift);
            assert_eq!(bucket_index(high), shift);
            assert_eq!(bucket_index(low + (high - low) / 2), shift);
        }
    }

    #[test]
    fn test_wide_values_alias() {
        // Only the low 32 bits of the smeared value reach the table.
        assert!(bucket_index(1u64 << 32) < 32);
        assert!(bucket_index(u64::MAX) < 32);
    }

    #[test]
    fn test_bucket_range_agrees_with_index() {
        for index in 0..18 {
            let (low, high) = bucket_range(index);
            assert_eq!(bucket_index(low), index);
            assert_eq!(bucket_index(high), index);
        }
        assert_eq!(bucket_range(0), (0, 1));
        assert_eq!(bucket_range(7), (128, 255));
    }
}
