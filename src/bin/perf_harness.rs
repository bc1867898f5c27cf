use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hpc_search::{
    ConsoleReporter, CsvReporter, DEFAULT_SEED, DEFAULT_SIZES, Depth, JsonLinesReporter,
    MonotonicClock, Registry, Reporter, SuiteConfig, calibration, compare_backend, run_suite,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

/// Verifies every search variant against the reference search, then times them.
#[derive(Parser, Debug)]
#[command(name = "perf_harness")]
#[command(version)]
struct Args {
    /// Sequence sizes to benchmark
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SIZES.to_vec())]
    sizes: Vec<usize>,

    /// Keys per configuration (default: 10000 below 100000 elements, else 1000)
    #[arg(long)]
    keys: Option<usize>,

    /// Timed iterations per configuration (default: 1000 below 1000000 elements, else 500)
    #[arg(long)]
    iterations: Option<usize>,

    /// Seed for the key generator
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Report destination
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Only run the named variants (repeatable; see --list)
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// List registered variants and exit
    #[arg(long)]
    list: bool,

    /// Verify only; skip timing
    #[arg(long)]
    verify_only: bool,

    /// Check only the key-batch prefix instead of the full battery
    #[arg(long)]
    quick_verify: bool,

    /// Skip the cross-size sweep
    #[arg(long)]
    no_sweep: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut registry = Registry::with_builtins();
    if args.list {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if !args.variants.is_empty() {
        if let Some(unknown) = args.variants.iter().find(|name| registry.get(name).is_none()) {
            bail!("unknown variant: {unknown} (see --list)");
        }
        registry.retain_named(&args.variants);
    }

    let config = SuiteConfig {
        sizes: args.sizes,
        keys: args.keys,
        iterations: args.iterations,
        seed: args.seed,
        depth: if args.quick_verify { Depth::Quick } else { Depth::Full },
        sweep: !args.no_sweep,
        verify_only: args.verify_only,
    };

    info!(
        backend = compare_backend(),
        clock_read_ns = calibration().read_overhead_ns(),
        variants = registry.len(),
        "starting"
    );

    let file: Box<dyn Reporter> = match args.format {
        Format::Csv => Box::new(CsvReporter::create(&args.output)?),
        Format::Json => Box::new(JsonLinesReporter::create(&args.output)?),
    };
    let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(ConsoleReporter::new(io::stdout())), file];

    let summary = run_suite(&config, &registry, &MonotonicClock, &mut reporters)
        .context("benchmark run aborted")?;

    println!("Results saved to: {}", args.output.display());
    if !summary.all_passed() {
        info!("one or more variants failed verification");
    }
    Ok(())
}
