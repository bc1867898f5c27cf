//! Error type shared by the data generators, the suite driver and the reporters.
//!
//! Only resource failures and invalid input surface here. A variant that
//! disagrees with the oracle is not an error: it is recorded in a
//! [`VerificationReport`](crate::VerificationReport) and demoted to `FAILED`.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a harness run.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("memory allocation failed for {what} ({len} elements)")]
    Allocation {
        what: &'static str,
        len: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to open report destination {}", path.display())]
    ReportOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("report write failed: {0}")]
    Report(#[from] io::Error),

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sequence is not strictly ascending at index {index}: {previous} >= {next}")]
    Unsorted { index: usize, previous: i64, next: i64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Allocates an empty vector with room for exactly `len` elements,
/// reporting allocator failure instead of aborting the process.
pub(crate) fn try_vec<T>(what: &'static str, len: usize) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|source| HarnessError::Allocation { what, len, source })?;
    Ok(out)
}
