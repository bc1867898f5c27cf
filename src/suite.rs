//! Drives verification and timing across sequence-size configurations.
//!
//! Per configuration: build the sequence and key batch, verify every variant,
//! time the ones that passed, hand the row to every reporter, then drop the
//! buffers before the next size. The size sweep does not depend on the
//! configured size, so it runs once up front; a variant that fails it is
//! reported as failed in every configuration.

use tracing::{info, warn};

use crate::bench::{Outcome, benchmark_search};
use crate::data::{DEFAULT_SEED, KeyBatch, SortedSequence};
use crate::error::{HarnessError, Result};
use crate::report::{Reporter, ResultRow, VariantResult};
use crate::timer::Clock;
use crate::variant::Registry;
use crate::verify::{Depth, SWEEP_SIZES, VerificationReport, verify_configuration, verify_sweep};

/// Sequence sizes benchmarked when none are given.
pub const DEFAULT_SIZES: &[usize] = &[10_000, 100_000, 1_000_000, 10_000_000];

/// Key count for a configuration: large arrays use fewer keys per round.
pub fn default_keys(size: usize) -> usize {
    if size < 100_000 { 10_000 } else { 1_000 }
}

/// Timed rounds for a configuration.
pub fn default_iterations(size: usize) -> usize {
    if size < 1_000_000 { 1_000 } else { 500 }
}

/// Settings for one harness run.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    pub sizes: Vec<usize>,
    /// Overrides [`default_keys`] for every size.
    pub keys: Option<usize>,
    /// Overrides [`default_iterations`] for every size.
    pub iterations: Option<usize>,
    pub seed: u64,
    pub depth: Depth,
    /// Run the cross-size sweep before the first configuration.
    pub sweep: bool,
    /// Verify only; every passing variant is reported with a zero latency.
    pub verify_only: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            keys: None,
            iterations: None,
            seed: DEFAULT_SEED,
            depth: Depth::Full,
            sweep: true,
            verify_only: false,
        }
    }
}

impl SuiteConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sizes.is_empty() {
            return Err(HarnessError::Config("at least one size is required".into()));
        }
        if self.sizes.contains(&0) {
            return Err(HarnessError::Config("sizes must be positive".into()));
        }
        if self.keys == Some(0) {
            return Err(HarnessError::Config("key count must be positive".into()));
        }
        if self.iterations == Some(0) {
            return Err(HarnessError::Config("iteration count must be positive".into()));
        }
        Ok(())
    }

    pub fn keys_for(&self, size: usize) -> usize {
        self.keys.unwrap_or_else(|| default_keys(size))
    }

    pub fn iterations_for(&self, size: usize) -> usize {
        self.iterations.unwrap_or_else(|| default_iterations(size))
    }
}

/// What a run produced, for callers that want more than the reporters saw.
#[derive(Debug, Default)]
pub struct SuiteSummary {
    pub rows: Vec<ResultRow>,
    /// Verification per configuration, in the order of `SuiteConfig::sizes`.
    pub verification: Vec<(usize, VerificationReport)>,
}

impl SuiteSummary {
    /// True when every variant passed in every configuration.
    pub fn all_passed(&self) -> bool {
        self.verification.iter().all(|(_, report)| report.all_passed())
    }
}

/// Runs every configuration in `config` over `registry`.
///
/// Stops at the first resource failure (allocation or report I/O). Variant
/// mismatches never stop the run.
pub fn run_suite<C: Clock + ?Sized>(
    config: &SuiteConfig,
    registry: &Registry,
    clock: &C,
    reporters: &mut [Box<dyn Reporter>],
) -> Result<SuiteSummary> {
    config.validate()?;

    let names = registry.names();
    for reporter in reporters.iter_mut() {
        reporter.begin(&names)?;
    }

    let sweep = if config.sweep {
        let report = verify_sweep(registry, SWEEP_SIZES);
        for verdict in report.failed() {
            warn!(
                variant = %verdict.name,
                mismatches = verdict.mismatch_count,
                "variant failed the size sweep"
            );
        }
        Some(report)
    } else {
        None
    };

    let mut summary = SuiteSummary::default();
    for &size in &config.sizes {
        let (row, mut verification) = run_configuration(config, registry, clock, size, sweep.as_ref())?;
        if let Some(sweep) = &sweep {
            verification.merge(sweep.clone());
        }

        for reporter in reporters.iter_mut() {
            reporter.record(&row, &verification)?;
        }
        summary.rows.push(row);
        summary.verification.push((size, verification));
    }

    for reporter in reporters.iter_mut() {
        reporter.finish()?;
    }
    Ok(summary)
}

fn run_configuration<C: Clock + ?Sized>(
    config: &SuiteConfig,
    registry: &Registry,
    clock: &C,
    size: usize,
    sweep: Option<&VerificationReport>,
) -> Result<(ResultRow, VerificationReport)> {
    let keys_len = config.keys_for(size);
    let iterations = config.iterations_for(size);

    let sequence = SortedSequence::evens(size)?;
    let keys = KeyBatch::generate(&sequence, keys_len, config.seed)?;
    info!(
        size,
        mib = sequence.size_mib(),
        keys = keys_len,
        iterations,
        "running configuration"
    );

    let verification = verify_configuration(registry, &sequence, keys.as_slice(), config.depth);

    let mut results = Vec::with_capacity(registry.len());
    for variant in registry.iter() {
        let name = variant.name();
        let passed = verification.passed(name) && sweep.is_none_or(|report| report.passed(name));

        let outcome = if !passed {
            warn!(variant = name, size, "variant failed verification; not timed");
            Outcome::Failed
        } else if config.verify_only {
            Outcome::Measured(0.0)
        } else {
            let mean = benchmark_search(clock, variant, sequence.as_slice(), keys.as_slice(), iterations);
            info!(variant = name, size, mean_ns = mean, "measured");
            Outcome::Measured(mean)
        };

        results.push(VariantResult {
            variant: name.to_string(),
            outcome,
        });
    }

    let row = ResultRow {
        size,
        elements: sequence.len(),
        keys: keys_len,
        iterations,
        results,
    };
    Ok((row, verification))
}
