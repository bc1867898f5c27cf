//! Result rows and the sinks that write them.
//!
//! | Reporter | Output |
//! |----------|--------|
//! | [`CsvReporter`] | `Array Size,Elements,<variant> (ns),...`, one row per configuration |
//! | [`JsonLinesReporter`] | one JSON object per configuration, with verification verdicts |
//! | [`ConsoleReporter`] | human-readable table per configuration |
//!
//! Every reporter flushes after each row so an interrupted run leaves a
//! usable file behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::bench::Outcome;
use crate::error::{HarnessError, Result};
use crate::verify::VerificationReport;

/// Literal written in place of a latency for a variant that failed verification.
pub const FAILED_MARKER: &str = "FAILED";

/// One variant's cell in a [`ResultRow`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VariantResult {
    pub variant: String,
    pub outcome: Outcome,
}

/// Everything measured for one sequence size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRow {
    pub size: usize,
    pub elements: usize,
    pub keys: usize,
    pub iterations: usize,
    /// One entry per registered variant, in registration order.
    pub results: Vec<VariantResult>,
}

/// A destination for benchmark results.
pub trait Reporter {
    /// Called once before any row, with the variant names in column order.
    fn begin(&mut self, variants: &[&str]) -> Result<()>;

    fn record(&mut self, row: &ResultRow, verification: &VerificationReport) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens `path` for writing, truncating it.
pub fn create_report_file(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| HarnessError::ReportOpen {
            path: path.to_path_buf(),
            source,
        })
}

/// Delimited text report.
pub struct CsvReporter<W: Write> {
    out: W,
}

impl<W: Write> CsvReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvReporter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        create_report_file(path).map(Self::new)
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn begin(&mut self, variants: &[&str]) -> Result<()> {
        let columns: Vec<String> = variants.iter().map(|name| format!("{name} (ns)")).collect();
        writeln!(self.out, "Array Size,Elements,{}", columns.join(","))?;
        self.out.flush()?;
        Ok(())
    }

    fn record(&mut self, row: &ResultRow, _verification: &VerificationReport) -> Result<()> {
        let cells: Vec<String> = row
            .results
            .iter()
            .map(|result| match result.outcome {
                Outcome::Measured(ns) => format!("{ns:.2}"),
                Outcome::Failed => FAILED_MARKER.to_string(),
            })
            .collect();
        writeln!(self.out, "{},{},{}", row.size, row.elements, cells.join(","))?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Newline-delimited JSON report.
pub struct JsonLinesReporter<W: Write> {
    out: W,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    row: &'a ResultRow,
    verification: &'a VerificationReport,
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesReporter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        create_report_file(path).map(Self::new)
    }
}

impl<W: Write> Reporter for JsonLinesReporter<W> {
    fn begin(&mut self, _variants: &[&str]) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, row: &ResultRow, verification: &VerificationReport) -> Result<()> {
        serde_json::to_writer(&mut self.out, &JsonLine { row, verification })?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Per-configuration table for a terminal.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

const RULE: &str = "========================================";

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn begin(&mut self, variants: &[&str]) -> Result<()> {
        writeln!(self.out, "Search benchmark suite")?;
        writeln!(self.out, "Variants: {}", variants.join(", "))?;
        Ok(())
    }

    fn record(&mut self, row: &ResultRow, verification: &VerificationReport) -> Result<()> {
        let mib = (row.size * std::mem::size_of::<i64>()) as f64 / (1024.0 * 1024.0);
        writeln!(self.out)?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Array Size: {} elements ({mib:.2} MB)", row.size)?;
        writeln!(self.out, "Test keys: {}, Iterations: {}", row.keys, row.iterations)?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out)?;
        writeln!(self.out, "{:<22} {:>15} {:>8}", "Function", "Time (ns)", "Correct")?;
        writeln!(self.out, "{}", "-".repeat(47))?;

        for result in &row.results {
            match result.outcome {
                Outcome::Measured(ns) => {
                    writeln!(self.out, "{:<22} {:>15.2} {:>8}", result.variant, ns, "ok")?;
                }
                Outcome::Failed => {
                    writeln!(self.out, "{:<22} {:>15} {:>8}", result.variant, FAILED_MARKER, "FAIL")?;
                    if let Some(mismatch) = verification
                        .get(&result.variant)
                        .and_then(|verdict| verdict.first_mismatch())
                    {
                        writeln!(
                            self.out,
                            "    first mismatch: key {} (size {}) got {}, expected {}",
                            mismatch.key, mismatch.size, mismatch.actual, mismatch.expected
                        )?;
                    }
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Benchmark completed!")?;
        writeln!(self.out, "{RULE}")?;
        self.out.flush()?;
        Ok(())
    }
}
