//! Differential verification of search variants against the reference search.
//!
//! No variant is checked against hand-written expectations. Every answer is
//! compared with [`binary_search_reference`] on the same input, across five
//! kinds of keys:
//!
//! | Category | Keys | Notes |
//! |----------|------|-------|
//! | [`Category::ExistingKeys`] | every element | scan stops after more than 10 mismatches |
//! | [`Category::MissingKeys`] | first 1000 gap keys | must be `NOT_FOUND` |
//! | [`Category::Boundary`] | `min - 1`, `max + 100`, `[42]` with 42 and 43 | |
//! | [`Category::SizeSweep`] | sizes around powers of two, dense key range | independent of the configured sequence |
//! | [`Category::KeyBatch`] | prefix of the benchmark key batch | |
//!
//! A mismatch never stops verification of other categories or other
//! variants. A variant with any mismatch fails.

use serde::Serialize;
use tracing::{debug, warn};

use crate::data::SortedSequence;
use crate::scalar::{NOT_FOUND, binary_search_reference};
use crate::variant::{Registry, SearchVariant};

/// The existing-key scan stops once the mismatch count exceeds this.
pub const MAX_EXISTING_KEY_MISMATCHES: usize = 10;

/// Number of gap keys probed by the missing-key check.
pub const MISSING_KEY_LIMIT: usize = 1000;

/// Number of key-batch entries verified before a variant is timed.
pub const KEY_BATCH_PREFIX: usize = 100;

/// Sequence lengths covered by the size sweep: powers of two, their
/// neighbours, and a few large sizes.
pub const SWEEP_SIZES: &[usize] = &[
    1, 2, 3, 7, 8, 9, 15, 16, 17, 31, 32, 33, 63, 64, 65, 127, 128, 129, 1000, 10_000, 100_000,
];

/// Upper bound of the dense key range `[-1, bound]` in the size sweep.
pub const SWEEP_DENSE_KEY_LIMIT: i64 = 2048;

/// Mismatches kept per variant; further ones are only counted.
const MAX_RECORDED_MISMATCHES: usize = 32;

/// Where a key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ExistingKeys,
    MissingKeys,
    Boundary,
    SizeSweep,
    KeyBatch,
}

/// One disagreement with the reference search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub category: Category,
    /// Length of the sequence that was searched.
    pub size: usize,
    pub key: i64,
    /// The reference result.
    pub expected: i64,
    /// The variant's result.
    pub actual: i64,
}

/// Verification outcome for one variant.
#[derive(Clone, Debug, Serialize)]
pub struct Verdict {
    pub name: String,
    /// Keys compared against the reference.
    pub checked: usize,
    /// Total mismatches, including those not recorded.
    pub mismatch_count: usize,
    /// The first mismatches, in discovery order.
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checked: 0,
            mismatch_count: 0,
            mismatches: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }

    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }

    /// Compares one answer with the reference. Returns true on agreement.
    fn check(&mut self, category: Category, values: &[i64], key: i64, expected: i64, actual: i64) -> bool {
        self.checked += 1;
        if actual == expected {
            return true;
        }

        self.mismatch_count += 1;
        if self.mismatches.len() < MAX_RECORDED_MISMATCHES {
            warn!(
                variant = %self.name,
                ?category,
                size = values.len(),
                key,
                expected,
                actual,
                "search mismatch"
            );
            self.mismatches.push(Mismatch {
                category,
                size: values.len(),
                key,
                expected,
                actual,
            });
        }
        false
    }

    fn absorb(&mut self, other: Verdict) {
        self.checked += other.checked;
        self.mismatch_count += other.mismatch_count;
        let room = MAX_RECORDED_MISMATCHES.saturating_sub(self.mismatches.len());
        self.mismatches.extend(other.mismatches.into_iter().take(room));
    }
}

/// Verdicts for every registered variant, in registration order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerificationReport {
    pub verdicts: Vec<Verdict>,
}

impl VerificationReport {
    pub fn get(&self, name: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|verdict| verdict.name == name)
    }

    /// True when `name` was verified and had no mismatches.
    pub fn passed(&self, name: &str) -> bool {
        self.get(name).is_some_and(Verdict::passed)
    }

    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(Verdict::passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|verdict| !verdict.passed())
    }

    /// Folds `other` into this report, matching verdicts by name.
    pub fn merge(&mut self, other: VerificationReport) {
        for verdict in other.verdicts {
            match self.verdicts.iter_mut().find(|v| v.name == verdict.name) {
                Some(existing) => existing.absorb(verdict),
                None => self.verdicts.push(verdict),
            }
        }
    }
}

/// How much of the battery to run per configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    /// Only the key-batch prefix.
    Quick,
    /// Existing, missing, boundary and key-batch checks.
    Full,
}

/// Every element must be found at its own index.
pub fn verify_existing_keys(variant: &dyn SearchVariant, sequence: &SortedSequence, verdict: &mut Verdict) {
    let values = sequence.as_slice();
    let start = verdict.mismatch_count;
    for &key in values {
        let expected = binary_search_reference(values, key);
        let actual = variant.search(values, key);
        if !verdict.check(Category::ExistingKeys, values, key, expected, actual)
            && verdict.mismatch_count - start > MAX_EXISTING_KEY_MISMATCHES
        {
            debug!(variant = variant.name(), "existing-key scan stopped early");
            break;
        }
    }
}

/// The first [`MISSING_KEY_LIMIT`] gap keys must all be reported absent.
pub fn verify_missing_keys(variant: &dyn SearchVariant, sequence: &SortedSequence, verdict: &mut Verdict) {
    let values = sequence.as_slice();
    for key in sequence.gap_keys().take(MISSING_KEY_LIMIT) {
        let expected = binary_search_reference(values, key);
        debug_assert_eq!(expected, NOT_FOUND);
        verdict.check(Category::MissingKeys, values, key, expected, variant.search(values, key));
    }
}

/// Keys just outside the sequence, and both answers on a one-element sequence.
pub fn verify_boundaries(variant: &dyn SearchVariant, sequence: &SortedSequence, verdict: &mut Verdict) {
    let values = sequence.as_slice();
    let below = sequence.first().and_then(|min| min.checked_sub(1));
    let above = sequence.last().and_then(|max| max.checked_add(100));
    for key in below.into_iter().chain(above) {
        let expected = binary_search_reference(values, key);
        verdict.check(Category::Boundary, values, key, expected, variant.search(values, key));
    }

    let single = [42];
    for key in [42, 43] {
        let expected = binary_search_reference(&single, key);
        verdict.check(Category::Boundary, &single, key, expected, variant.search(&single, key));
    }
}

/// Checks the first [`KEY_BATCH_PREFIX`] keys of a benchmark key batch.
pub fn verify_key_batch(variant: &dyn SearchVariant, sequence: &SortedSequence, keys: &[i64], verdict: &mut Verdict) {
    let values = sequence.as_slice();
    for &key in keys.iter().take(KEY_BATCH_PREFIX) {
        let expected = binary_search_reference(values, key);
        verdict.check(Category::KeyBatch, values, key, expected, variant.search(values, key));
    }
}

/// Runs every sweep size in `sizes` against the reference generator.
///
/// Per size: every key in `[-1, min(2 * size, SWEEP_DENSE_KEY_LIMIT)]`, then a
/// sample of present keys spread over the whole sequence.
pub fn verify_size_sweep(variant: &dyn SearchVariant, sizes: &[usize], verdict: &mut Verdict) {
    for &size in sizes {
        // Sweep sizes are small and fixed; failure here is not a configuration resource.
        let Ok(sequence) = SortedSequence::evens(size) else {
            warn!(size, "skipping sweep size: allocation failed");
            continue;
        };
        let values = sequence.as_slice();

        let dense_bound = (size as i64 * 2).min(SWEEP_DENSE_KEY_LIMIT);
        for key in -1..=dense_bound {
            let expected = binary_search_reference(values, key);
            verdict.check(Category::SizeSweep, values, key, expected, variant.search(values, key));
        }

        for &key in values.iter().step_by(size / 10 + 1) {
            let expected = binary_search_reference(values, key);
            verdict.check(Category::SizeSweep, values, key, expected, variant.search(values, key));
        }
    }
}

/// Runs the per-configuration battery over every variant in `registry`.
pub fn verify_configuration(
    registry: &Registry,
    sequence: &SortedSequence,
    keys: &[i64],
    depth: Depth,
) -> VerificationReport {
    let mut report = VerificationReport::default();
    for variant in registry.iter() {
        let mut verdict = Verdict::new(variant.name());
        if depth == Depth::Full {
            verify_existing_keys(variant, sequence, &mut verdict);
            verify_missing_keys(variant, sequence, &mut verdict);
            verify_boundaries(variant, sequence, &mut verdict);
        }
        verify_key_batch(variant, sequence, keys, &mut verdict);

        debug!(
            variant = variant.name(),
            size = sequence.len(),
            checked = verdict.checked,
            mismatches = verdict.mismatch_count,
            "verified"
        );
        report.verdicts.push(verdict);
    }
    report
}

/// Runs the size sweep over every variant in `registry`.
pub fn verify_sweep(registry: &Registry, sizes: &[usize]) -> VerificationReport {
    let mut report = VerificationReport::default();
    for variant in registry.iter() {
        let mut verdict = Verdict::new(variant.name());
        verify_size_sweep(variant, sizes, &mut verdict);
        report.verdicts.push(verdict);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::FnVariant;

    /// Off by one above a fixed index, the classic broken search.
    fn broken_above(values: &[i64], key: i64) -> i64 {
        let idx = binary_search_reference(values, key);
        if idx >= 50 { idx + 1 } else { idx }
    }

    /// Claims every odd key lives at index 0.
    fn finds_ghosts(values: &[i64], key: i64) -> i64 {
        if key % 2 != 0 && !values.is_empty() {
            0
        } else {
            binary_search_reference(values, key)
        }
    }

    #[test]
    fn reference_passes_everything() {
        let mut registry = Registry::new();
        registry.register(FnVariant::new("reference", binary_search_reference));

        let sequence = SortedSequence::evens(500).unwrap();
        let keys: Vec<i64> = (0..200).collect();
        let report = verify_configuration(&registry, &sequence, &keys, Depth::Full);
        assert!(report.all_passed());
        assert!(report.passed("reference"));

        let verdict = report.get("reference").unwrap();
        // 500 existing, 500 gap keys, 2 outside, 2 single-element, 100 batch keys.
        assert_eq!(verdict.checked, 500 + 500 + 2 + 2 + 100);
    }

    #[test]
    fn existing_key_scan_stops_after_too_many_mismatches() {
        let variant = FnVariant::new("broken", broken_above);
        let sequence = SortedSequence::evens(200).unwrap();
        let mut verdict = Verdict::new("broken");

        verify_existing_keys(&variant, &sequence, &mut verdict);

        assert_eq!(verdict.mismatch_count, MAX_EXISTING_KEY_MISMATCHES + 1);
        assert_eq!(verdict.checked, 50 + MAX_EXISTING_KEY_MISMATCHES + 1);
        let first = verdict.first_mismatch().unwrap();
        assert_eq!(first.category, Category::ExistingKeys);
        assert_eq!((first.key, first.expected, first.actual), (100, 50, 51));
    }

    #[test]
    fn failures_do_not_stop_other_categories() {
        let mut registry = Registry::new();
        registry.register(FnVariant::new("broken", broken_above));
        registry.register(FnVariant::new("ghosts", finds_ghosts));
        registry.register(FnVariant::new("reference", binary_search_reference));

        let sequence = SortedSequence::evens(200).unwrap();
        let report = verify_configuration(&registry, &sequence, &[1, 3, 4], Depth::Full);

        assert!(!report.passed("broken"));
        assert!(!report.passed("ghosts"));
        assert!(report.passed("reference"));
        assert_eq!(report.failed().count(), 2);

        let ghosts = report.get("ghosts").unwrap();
        assert!(ghosts.mismatches.iter().all(|m| m.category == Category::MissingKeys));
        // 200 gap keys + min-1 + [42] miss + 2 odd batch keys.
        assert_eq!(ghosts.mismatch_count, 200 + 1 + 1 + 2);
        assert_eq!(ghosts.mismatches.len(), MAX_RECORDED_MISMATCHES);

        let mut boundary = Verdict::new("ghosts");
        verify_boundaries(&FnVariant::new("ghosts", finds_ghosts), &sequence, &mut boundary);
        let keys: Vec<i64> = boundary.mismatches.iter().map(|m| m.key).collect();
        assert_eq!(keys, [-1, 43]);
        assert_eq!(boundary.mismatches[1].size, 1);
    }

    #[test]
    fn boundary_skips_overflowing_keys() {
        let variant = FnVariant::new("reference", binary_search_reference);
        let sequence = SortedSequence::new(vec![i64::MIN, 0, i64::MAX]).unwrap();
        let mut verdict = Verdict::new("reference");
        verify_boundaries(&variant, &sequence, &mut verdict);
        assert_eq!(verdict.checked, 2);
        assert!(verdict.passed());
    }

    #[test]
    fn quick_depth_only_checks_key_batch() {
        let registry = Registry::with_builtins();
        let sequence = SortedSequence::evens(1000).unwrap();
        let keys: Vec<i64> = (0..500).collect();
        let report = verify_configuration(&registry, &sequence, &keys, Depth::Quick);
        for verdict in &report.verdicts {
            assert_eq!(verdict.checked, KEY_BATCH_PREFIX, "{}", verdict.name);
        }
    }

    #[test]
    fn sweep_catches_breakage_only_past_the_broken_index() {
        let mut registry = Registry::new();
        registry.register(FnVariant::new("broken", broken_above));
        let report = verify_sweep(&registry, &[1, 2, 3, 33, 64]);
        let verdict = report.get("broken").unwrap();
        assert!(!verdict.passed());
        assert!(verdict.mismatches.iter().all(|m| m.size == 64));
    }

    #[test]
    fn builtins_pass_full_battery_and_sweep() {
        let registry = Registry::with_builtins();
        let sequence = SortedSequence::evens(10_000).unwrap();
        let keys: Vec<i64> = (-10..190).collect();

        let mut report = verify_configuration(&registry, &sequence, &keys, Depth::Full);
        report.merge(verify_sweep(&registry, SWEEP_SIZES));

        for verdict in &report.verdicts {
            assert!(verdict.passed(), "{} failed: {:?}", verdict.name, verdict.first_mismatch());
        }
        assert_eq!(report.verdicts.len(), registry.len());
    }

    #[test]
    fn merge_accumulates_by_name() {
        let mut a = VerificationReport::default();
        let mut v = Verdict::new("x");
        v.checked = 3;
        a.verdicts.push(v);

        let mut b = VerificationReport::default();
        let mut w = Verdict::new("x");
        w.checked = 4;
        w.mismatch_count = 1;
        b.verdicts.push(w);
        b.verdicts.push(Verdict::new("y"));

        a.merge(b);
        assert_eq!(a.verdicts.len(), 2);
        assert_eq!(a.get("x").unwrap().checked, 7);
        assert!(!a.passed("x"));
        assert!(a.passed("y"));
        assert!(!a.passed("missing"));
    }
}
