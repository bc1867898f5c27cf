//! Lower-bound search backends that satisfy the common search contract.
//!
//! These are the "low-level" strategies the quaternary search is measured
//! against. They are treated as opaque: nothing in the crate relies on their
//! internals, only on their agreement with the reference search, which the
//! differential verifier checks.
//!
//! # Strategies
//!
//! | Function | Strategy | Best For |
//! |----------|----------|----------|
//! | [`branching_search`] | Lower-bound loop with a data-dependent branch | Predictable queries |
//! | [`branchless_search`] | Lower-bound loop with arithmetic selection | Random queries (fewer mispredicts) |
//! | [`branchless_prefetch_search`] | Branchless + prefetch of both next midpoints | Arrays larger than L1 |
//!
//! # Performance notes
//!
//! - **Branching**: The compare is a real branch. On random keys it mispredicts
//!   roughly half the time, but it can stop as soon as the range is exhausted.
//! - **Branchless**: Always runs `ceil(log2 n)` iterations. The compare result
//!   feeds an add instead of a jump, so the pipeline never flushes.
//! - **Prefetch**: Both candidate midpoints of the next iteration are requested
//!   before the current compare resolves. Only worth it once the array falls
//!   out of L1.
//!
//! All three return the first index whose value is `>= key` and then test it
//! for equality, which equals the reference result on duplicate-free input.

use crate::prefetch::prefetch_index;
use crate::scalar::NOT_FOUND;

/// Arrays smaller than this (in bytes) skip prefetching.
/// 32KB is a conservative L1 data cache size across modern CPUs.
const PREFETCH_THRESHOLD_BYTES: usize = 32 * 1024;

/// Minimum element count to enable prefetching (i64 = 8 bytes).
const PREFETCH_THRESHOLD_ELEMENTS: usize = PREFETCH_THRESHOLD_BYTES / std::mem::size_of::<i64>();

/// Lower-bound search with an explicit branch on the midpoint compare.
pub fn branching_search(values: &[i64], key: i64) -> i64 {
    if values.is_empty() {
        return NOT_FOUND;
    }

    let mut base = 0usize;
    let mut len = values.len();
    while len > 1 {
        let half = len / 2;
        // SAFETY: base + len <= values.len() and half >= 1, so base + half - 1 is in bounds.
        if unsafe { *values.get_unchecked(base + half - 1) } < key {
            base += half;
        }
        len -= half;
    }

    finish(values, key, base)
}

/// Branchless lower-bound search.
///
/// Uses arithmetic selection for the midpoint compare to avoid a data-dependent branch.
pub fn branchless_search(values: &[i64], key: i64) -> i64 {
    if values.is_empty() {
        return NOT_FOUND;
    }

    let mut base = 0usize;
    let mut len = values.len();
    while len > 1 {
        let half = len / 2;
        let mid = base + half - 1;
        // SAFETY: Loop invariant: base + len <= values.len()
        // Since len > 1 and half = len/2, we have half >= 1
        // So mid = base + half - 1 < base + len <= values.len()
        let cmp = unsafe { *values.get_unchecked(mid) < key };
        base += cmp as usize * half;
        len -= half;
    }

    finish(values, key, base)
}

/// Branchless lower-bound search with prefetching of the next midpoints.
pub fn branchless_prefetch_search(values: &[i64], key: i64) -> i64 {
    // Small arrays already sit in L1/L2; the hints would be pure overhead.
    if values.len() < PREFETCH_THRESHOLD_ELEMENTS {
        return branchless_search(values, key);
    }

    let mut base = 0usize;
    let mut len = values.len();
    while len > 1 {
        let half = len / 2;
        let left_len = len - half;

        if left_len > 1 {
            prefetch_index(values, base + left_len / 2 - 1);
        }
        if half > 1 {
            prefetch_index(values, base + half + half / 2 - 1);
        }

        let mid = base + half - 1;
        // SAFETY: Same invariant as branchless_search - mid < values.len()
        let cmp = unsafe { *values.get_unchecked(mid) < key };
        base += cmp as usize * half;
        len = left_len;
    }

    finish(values, key, base)
}

#[inline]
fn finish(values: &[i64], key: i64, base: usize) -> i64 {
    // SAFETY: base < values.len() because base + len <= values.len() and len >= 1
    if unsafe { *values.get_unchecked(base) } == key {
        base as i64
    } else {
        NOT_FOUND
    }
}
