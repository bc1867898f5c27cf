//! Quaternary SIMD search over sorted `i64` arrays, verified against a scalar oracle.
//!
//! Every search in this crate answers the same question: where is `key` in a
//! strictly ascending slice, or is it absent (`-1`)? The interesting one is the
//! quaternary search, which narrows the range four ways per step using vector
//! compares. The rest of the crate exists to prove it is right and to measure
//! whether it is fast.
//!
//! # Searches
//!
//! - **Reference** ([`binary_search_reference`]) — classic halving loop, the oracle
//! - **Backends** ([`branching_search`], [`branchless_search`],
//!   [`branchless_prefetch_search`]) — lower-bound loops
//! - **Quaternary** ([`quaternary_search`], [`quaternary_search_pipelined`],
//!   [`quaternary_search_portable`]) — four-way narrowing with AVX2/NEON compares
//!
//! # Harness
//!
//! - [`verify`] — differential verification of every [`SearchVariant`] against the oracle
//! - [`benchmark_search`] — mean per-search latency with warmup
//! - [`run_suite`] — verification, timing and reporting per sequence size
//!
//! # References
//!
//! - [Binary search chapter](https://en.algorithmica.org/hpc/data-structures/binary-search/)

mod backends;
mod bench;
mod data;
mod error;
mod prefetch;
mod quaternary;
mod report;
mod scalar;
mod suite;
mod timer;
mod variant;
pub mod verify;

pub use backends::*;
pub use bench::*;
pub use data::*;
pub use error::{HarnessError, Result};
pub use quaternary::*;
pub use report::*;
pub use scalar::*;
pub use suite::*;
pub use timer::*;
pub use variant::*;
pub use verify::{Depth, VerificationReport, Verdict};
