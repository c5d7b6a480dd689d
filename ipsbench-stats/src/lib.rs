#![warn(missing_docs)]
//! ipsbench Statistics
//!
//! Reductions applied to the per-batch throughput estimates of a run:
//! - Arithmetic mean
//! - Standard deviation (divide by `n`)
//! - Small summary record with coefficient of variation

mod summary;

pub use summary::{Summary, compute_summary, mean, stddev};
