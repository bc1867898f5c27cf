//! Quaternary (four-way) search over sorted `i64` slices.
//!
//! Binary search halves the candidate range per step. Here every step probes
//! four positions at once, `left + q`, `left + 2q`, `left + 3q` and `right`
//! (`q` is a quarter of the range), gathers the four values into one vector
//! register and compares them against the broadcast key in a single
//! instruction. One step discards up to three quarters of the range.
//!
//! # Strategies
//!
//! | Function | Strategy | Cutover |
//! |----------|----------|---------|
//! | [`quaternary_search`] | AVX2/NEON four-way narrowing, scalar finish | 16 |
//! | [`quaternary_search_pipelined`] | Same + prefetch hints, pipelined scalar finish | 32 |
//! | [`quaternary_search_portable`] | Four-way narrowing with a lane-by-lane compare | 16 |
//!
//! # Narrowing
//!
//! Each compare produces two 4-bit masks, bit `i` describing probe `i`:
//! `eq` (probe == key) and `lt` (probe < key). A set `eq` bit ends the search.
//! Otherwise, because probes are ascending and the slice is strictly
//! ascending, `lt` is a prefix of set bits and picks the next range:
//!
//! | `lt` | Key lies | Next range |
//! |------|----------|------------|
//! | `1111` | above every probe | `[p3 + 1, right]` |
//! | `0111` | between p2 and p3 | `[p2 + 1, p3 - 1]` |
//! | `0011` | between p1 and p2 | `[p1 + 1, p2 - 1]` |
//! | `0001` | between p0 and p1 | `[p0 + 1, p1 - 1]` |
//! | `0000` | at or below p0 | `[left, p0 - 1]` |
//!
//! Any other pattern means the input was not strictly ascending. The search
//! then answers with the reference search over the whole slice. Every probe
//! stays inside the current range, so malformed input can produce a wrong
//! answer but never an out-of-bounds read.
//!
//! Once the range is no wider than the cutover, vector overhead outweighs the
//! extra elimination and a scalar halving loop finishes the job.

use crate::prefetch::prefetch_index;
use crate::scalar::{NOT_FOUND, binary_search_reference, search_range};

/// Slices shorter than this go straight to [`binary_search_reference`].
pub const SCALAR_THRESHOLD: usize = 32;

/// Range width at which [`quaternary_search`] switches to the scalar loop.
pub const CUTOVER: i64 = 16;

/// Range width at which [`quaternary_search_pipelined`] switches to the
/// scalar loop. Wider, so prefetches issued in the last vector steps land.
pub const PIPELINED_CUTOVER: i64 = 32;

/// Probes per narrowing step.
pub const LANES: usize = 4;

type FinishFn = fn(&[i64], i64, i64, i64) -> i64;

/// Parameters that distinguish the plain and pipelined searches.
#[derive(Clone, Copy)]
struct Narrowing {
    cutover: i64,
    prefetch: bool,
    finish: FinishFn,
}

const PLAIN: Narrowing = Narrowing {
    cutover: CUTOVER,
    prefetch: false,
    finish: search_range,
};

const PIPELINED: Narrowing = Narrowing {
    cutover: PIPELINED_CUTOVER,
    prefetch: true,
    finish: search_range_pipelined,
};

/// Result of one four-way compare. Bit `i` of each mask describes probe `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneMasks {
    /// Probes equal to the key.
    pub eq: u32,
    /// Probes strictly less than the key.
    pub lt: u32,
}

/// Quaternary search using the best compare kernel for the running CPU.
///
/// Returns the index of `key` in `values`, or [`NOT_FOUND`].
pub fn quaternary_search(values: &[i64], key: i64) -> i64 {
    dispatch(values, key, PLAIN)
}

/// Quaternary search with prefetch hints and a pipelined scalar finish.
///
/// Produces exactly the same results as [`quaternary_search`]; only latency differs.
pub fn quaternary_search_pipelined(values: &[i64], key: i64) -> i64 {
    dispatch(values, key, PIPELINED)
}

/// Quaternary search with the portable lane-by-lane compare kernel.
///
/// Exercises the narrowing logic on targets without AVX2 or NEON.
pub fn quaternary_search_portable(values: &[i64], key: i64) -> i64 {
    if values.len() < SCALAR_THRESHOLD {
        return binary_search_reference(values, key);
    }
    narrow(values, key, PLAIN, compare4_scalar)
}

/// Name of the compare kernel [`quaternary_search`] uses on this CPU.
pub fn compare_backend() -> &'static str {
    #[cfg(target_arch = "aarch64")]
    {
        "neon"
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        if avx2_available() { "avx2" } else { "portable" }
    }
}

/// Runtime detection for AVX2 support.
pub fn avx2_available() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("avx2")
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        false
    }
}

/// Lane-by-lane four-way compare.
#[inline]
pub fn compare4_scalar(probes: &[i64; LANES], key: i64) -> LaneMasks {
    let mut eq = 0u32;
    let mut lt = 0u32;
    for (lane, &probe) in probes.iter().enumerate() {
        eq |= ((probe == key) as u32) << lane;
        lt |= ((probe < key) as u32) << lane;
    }
    LaneMasks { eq, lt }
}

#[inline]
fn dispatch(values: &[i64], key: i64, plan: Narrowing) -> i64 {
    if values.len() < SCALAR_THRESHOLD {
        return binary_search_reference(values, key);
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: aarch64 guarantees NEON availability.
        unsafe { aarch64_neon::narrow_neon(values, key, plan) }
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if avx2_available() {
            // SAFETY: AVX2 support was detected at runtime.
            return unsafe { x86_avx2::narrow_avx2(values, key, plan) };
        }

        narrow(values, key, plan, compare4_scalar)
    }
}

/// Vector narrowing followed by the plan's scalar finish.
///
/// Callers guarantee `values.len() >= SCALAR_THRESHOLD`.
#[inline(always)]
fn narrow<C>(values: &[i64], key: i64, plan: Narrowing, compare: C) -> i64
where
    C: Fn(&[i64; LANES], i64) -> LaneMasks,
{
    let mut left = 0i64;
    let mut right = values.len() as i64 - 1;

    while right - left > plan.cutover {
        let quarter = (right - left + 1) / 4;
        let pos = [left + quarter, left + quarter * 2, left + quarter * 3, right];

        if plan.prefetch {
            prefetch_index(values, (left + quarter / 2) as usize);
            prefetch_index(values, (right - quarter / 2) as usize);
        }

        // SAFETY: the range is wider than the cutover, so quarter >= 4 and
        // left < pos[0] < pos[1] < pos[2] < pos[3] == right < values.len().
        let probes = pos.map(|p| unsafe { *values.get_unchecked(p as usize) });
        let masks = compare(&probes, key);

        if masks.eq != 0 {
            return pos[masks.eq.trailing_zeros() as usize];
        }

        match masks.lt {
            0b1111 => left = pos[3] + 1,
            0b0111 => {
                left = pos[2] + 1;
                right = pos[3] - 1;
            }
            0b0011 => {
                left = pos[1] + 1;
                right = pos[2] - 1;
            }
            0b0001 => {
                left = pos[0] + 1;
                right = pos[1] - 1;
            }
            0b0000 => right = pos[0] - 1,
            // Not a prefix: the slice is not strictly ascending.
            _ => return binary_search_reference(values, key),
        }
    }

    (plan.finish)(values, key, left, right)
}

/// Scalar finish that loads the next midpoint before the loop re-tests it,
/// so the load overlaps the bounds update instead of following it.
fn search_range_pipelined(values: &[i64], key: i64, mut left: i64, mut right: i64) -> i64 {
    if left > right {
        return NOT_FOUND;
    }

    let mut mid = left + (right - left) / 2;
    // SAFETY: 0 <= left <= mid <= right < values.len() (narrowing never leaves the slice).
    let mut value = unsafe { *values.get_unchecked(mid as usize) };

    loop {
        if value == key {
            return mid;
        }

        if value < key {
            left = mid + 1;
        } else {
            right = mid - 1;
        }

        if left > right {
            return NOT_FOUND;
        }

        mid = left + (right - left) / 2;
        // SAFETY: same bounds as above.
        value = unsafe { *values.get_unchecked(mid as usize) };
    }
}

/// AVX2 compare kernel for x86/x86_64.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86_avx2 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86 as arch;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64 as arch;

    use arch::{
        __m256i, _mm256_castsi256_pd, _mm256_cmpeq_epi64, _mm256_cmpgt_epi64, _mm256_loadu_si256,
        _mm256_movemask_pd, _mm256_set1_epi64x,
    };

    use super::{LANES, LaneMasks, Narrowing};

    /// Compares four gathered probes against the key in one 256-bit register.
    ///
    /// `movemask_pd` reads the sign bit of each 64-bit lane, which is all we
    /// need from an all-ones/all-zeros compare result.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn compare4_avx2(probes: &[i64; LANES], key: i64) -> LaneMasks {
        unsafe {
            let values = _mm256_loadu_si256(probes.as_ptr() as *const __m256i);
            let key_v = _mm256_set1_epi64x(key);

            let eq = _mm256_movemask_pd(_mm256_castsi256_pd(_mm256_cmpeq_epi64(values, key_v)));
            // cmpgt(key, probe) sets lanes where probe < key.
            let lt = _mm256_movemask_pd(_mm256_castsi256_pd(_mm256_cmpgt_epi64(key_v, values)));

            LaneMasks {
                eq: eq as u32,
                lt: lt as u32,
            }
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn narrow_avx2(values: &[i64], key: i64, plan: Narrowing) -> i64 {
        super::narrow(values, key, plan, |probes, key| unsafe {
            compare4_avx2(probes, key)
        })
    }
}

/// NEON compare kernel for aarch64. Two 2-lane registers cover the four probes.
#[cfg(target_arch = "aarch64")]
mod aarch64_neon {
    use std::arch::aarch64::*;

    use super::{LANES, LaneMasks, Narrowing};

    #[inline]
    #[target_feature(enable = "neon")]
    pub(super) unsafe fn compare4_neon(probes: &[i64; LANES], key: i64) -> LaneMasks {
        unsafe {
            let key_v = vdupq_n_s64(key);
            let lo = vld1q_s64(probes.as_ptr());
            let hi = vld1q_s64(probes.as_ptr().add(2));

            let eq = mask2(vceqq_s64(lo, key_v)) | (mask2(vceqq_s64(hi, key_v)) << 2);
            let lt = mask2(vcltq_s64(lo, key_v)) | (mask2(vcltq_s64(hi, key_v)) << 2);

            LaneMasks { eq, lt }
        }
    }

    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn mask2(cmp: uint64x2_t) -> u32 {
        unsafe { ((vgetq_lane_u64(cmp, 0) & 1) | ((vgetq_lane_u64(cmp, 1) & 1) << 1)) as u32 }
    }

    #[target_feature(enable = "neon")]
    pub(super) unsafe fn narrow_neon(values: &[i64], key: i64, plan: Narrowing) -> i64 {
        super::narrow(values, key, plan, |probes, key| unsafe {
            compare4_neon(probes, key)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const QUATERNARY: &[(&str, fn(&[i64], i64) -> i64)] = &[
        ("quaternary", quaternary_search),
        ("quaternary_pipelined", quaternary_search_pipelined),
        ("quaternary_portable", quaternary_search_portable),
    ];

    fn evens(len: usize) -> Vec<i64> {
        (0..len as i64).map(|i| i * 2).collect()
    }

    /// The detected kernel, for comparing against [`compare4_scalar`].
    fn compare4_native(probes: &[i64; LANES], key: i64) -> LaneMasks {
        #[cfg(target_arch = "aarch64")]
        {
            unsafe { aarch64_neon::compare4_neon(probes, key) }
        }

        #[cfg(not(target_arch = "aarch64"))]
        {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            if avx2_available() {
                return unsafe { x86_avx2::compare4_avx2(probes, key) };
            }
            compare4_scalar(probes, key)
        }
    }

    #[test]
    fn concrete_scenario() {
        let values = evens(100);
        for &(name, search) in QUATERNARY {
            assert_eq!(search(&values, 42), 21, "{name}");
            assert_eq!(search(&values, 43), NOT_FOUND, "{name}");
            assert_eq!(search(&values, -5), NOT_FOUND, "{name}");
            assert_eq!(search(&values, 250), NOT_FOUND, "{name}");
        }
    }

    #[test]
    fn below_threshold_is_the_reference_search() {
        for len in 0..SCALAR_THRESHOLD {
            let values = evens(len);
            for key in -2..=(len as i64 * 2 + 2) {
                let expected = binary_search_reference(&values, key);
                for &(name, search) in QUATERNARY {
                    assert_eq!(search(&values, key), expected, "{name} len={len} key={key}");
                }
            }
        }
    }

    #[test]
    fn every_key_around_the_cutovers() {
        for len in [32, 33, 34, 35, 47, 63, 64, 65, 66, 67, 68, 69, 70, 127, 128, 129, 257, 1000] {
            let values = evens(len);
            for key in -3..=(len as i64 * 2 + 3) {
                let expected = binary_search_reference(&values, key);
                for &(name, search) in QUATERNARY {
                    assert_eq!(search(&values, key), expected, "{name} len={len} key={key}");
                }
            }
        }
    }

    #[test]
    fn exact_index_for_every_element_of_large_array() {
        let values: Vec<i64> = (0..100_000i64).map(|i| i * 3 - 150_000).collect();
        for (idx, &value) in values.iter().enumerate() {
            for &(name, search) in QUATERNARY {
                assert_eq!(search(&values, value), idx as i64, "{name}");
            }
        }
    }

    #[test]
    fn extreme_keys_and_values() {
        let mut values = evens(200);
        values[0] = i64::MIN;
        values[199] = i64::MAX;
        for &(name, search) in QUATERNARY {
            assert_eq!(search(&values, i64::MIN), 0, "{name}");
            assert_eq!(search(&values, i64::MAX), 199, "{name}");
            assert_eq!(search(&values, i64::MIN + 1), NOT_FOUND, "{name}");
            assert_eq!(search(&values, i64::MAX - 1), NOT_FOUND, "{name}");
        }
    }

    #[test]
    fn scalar_kernel_masks() {
        let probes = [10, 20, 30, 40];
        assert_eq!(compare4_scalar(&probes, 5), LaneMasks { eq: 0, lt: 0b0000 });
        assert_eq!(compare4_scalar(&probes, 10), LaneMasks { eq: 0b0001, lt: 0b0000 });
        assert_eq!(compare4_scalar(&probes, 25), LaneMasks { eq: 0, lt: 0b0011 });
        assert_eq!(compare4_scalar(&probes, 40), LaneMasks { eq: 0b1000, lt: 0b0111 });
        assert_eq!(compare4_scalar(&probes, 41), LaneMasks { eq: 0, lt: 0b1111 });
    }

    #[test]
    fn native_kernel_matches_scalar_kernel() {
        let probes = [i64::MIN, -7, 0, i64::MAX];
        for key in [i64::MIN, i64::MIN + 1, -8, -7, -6, -1, 0, 1, i64::MAX - 1, i64::MAX] {
            assert_eq!(compare4_native(&probes, key), compare4_scalar(&probes, key), "key={key}");
        }
    }

    #[test]
    fn non_prefix_pattern_falls_back_to_reference() {
        // 64 elements: the first step probes 16, 32, 48 and 63. Planting a large
        // value at 32 makes key 100 produce lt = 0b0101.
        let mut values = evens(64);
        values[32] = 1000;
        let probes = [values[16], values[32], values[48], values[63]];
        assert_eq!(compare4_scalar(&probes, 100).lt, 0b0101);

        let expected = binary_search_reference(&values, 100);
        assert_eq!(expected, 50);
        for &(name, search) in QUATERNARY {
            assert_eq!(search(&values, 100), expected, "{name}");
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let values = evens(4096);
        for key in [-1, 0, 1, 2048, 4095, 8190, 8191] {
            for &(_, search) in QUATERNARY {
                let first = search(&values, key);
                for _ in 0..4 {
                    assert_eq!(search(&values, key), first);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn variants_match_reference(mut values in prop::collection::vec(any::<i64>(), 0..2048), key in any::<i64>()) {
            values.sort_unstable();
            values.dedup();

            let expected = binary_search_reference(&values, key);
            for &(_, search) in QUATERNARY {
                prop_assert_eq!(search(&values, key), expected);
            }
        }

        #[test]
        fn present_keys_return_their_index(
            mut values in prop::collection::vec(-1_000_000i64..1_000_000, 1..4096),
            pick in any::<prop::sample::Index>(),
        ) {
            values.sort_unstable();
            values.dedup();

            let idx = pick.index(values.len());
            for &(_, search) in QUATERNARY {
                prop_assert_eq!(search(&values, values[idx]), idx as i64);
                prop_assert_eq!(search(&values, values[idx] + 1), binary_search_reference(&values, values[idx] + 1));
            }
        }

        #[test]
        fn unsorted_input_never_reports_a_wrong_match(
            values in prop::collection::vec(-64i64..64, 0..512),
            key in -64i64..64,
        ) {
            for &(_, search) in QUATERNARY {
                let got = search(&values, key);
                prop_assert!(got == NOT_FOUND || values[got as usize] == key);
            }
        }
    }
}
