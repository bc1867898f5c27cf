//! Mean per-search latency of one variant over a fixed key batch.
//!
//! A warmup pass of `iterations / 10` untimed rounds runs first. Each timed
//! round then searches every key once; the mean is the total timed duration
//! divided by `iterations * keys`. No variance or percentiles are kept.

use std::hint::black_box;

use serde::Serialize;
use tracing::debug;

use crate::timer::Clock;
use crate::variant::SearchVariant;

/// Timed result for one variant in one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "mean_ns", rename_all = "snake_case")]
pub enum Outcome {
    /// Mean nanoseconds per search.
    Measured(f64),
    /// The variant disagreed with the reference and was not timed.
    Failed,
}

impl Outcome {
    pub fn mean_ns(self) -> Option<f64> {
        match self {
            Outcome::Measured(ns) => Some(ns),
            Outcome::Failed => None,
        }
    }
}

/// Untimed warmup rounds for a run of `iterations` timed rounds.
pub fn warmup_rounds(iterations: usize) -> usize {
    iterations / 10
}

/// Times `variant` over `keys` and returns the mean nanoseconds per search.
///
/// Returns `0.0` when there is nothing to time.
pub fn benchmark_search<C, V>(clock: &C, variant: &V, values: &[i64], keys: &[i64], iterations: usize) -> f64
where
    C: Clock + ?Sized,
    V: SearchVariant + ?Sized,
{
    let searches = iterations * keys.len();
    if searches == 0 {
        return 0.0;
    }

    let mut acc = 0i64;
    for _ in 0..warmup_rounds(iterations) {
        let haystack = black_box(values);
        for &key in keys {
            acc ^= variant.search(haystack, black_box(key));
        }
    }

    let mut total_ns = 0.0;
    for _ in 0..iterations {
        let haystack = black_box(values);
        let start = clock.now_ns();
        for &key in keys {
            acc ^= variant.search(haystack, black_box(key));
        }
        total_ns += clock.now_ns() - start;
    }
    black_box(acc);

    let mean = total_ns / searches as f64;
    debug!(
        variant = variant.name(),
        size = values.len(),
        keys = keys.len(),
        iterations,
        mean_ns = mean,
        "benchmarked"
    );
    mean
}
