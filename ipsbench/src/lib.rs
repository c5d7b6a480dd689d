#![warn(missing_docs)]
//! # ipsbench
//!
//! Iterations-per-second micro-benchmarks for Rust.
//!
//! Each registered item is warmed up, the warmup is used to pick a batch
//! size that takes about 100ms, and the item is then timed in batches of
//! that size. The result is a rate with a relative error:
//!
//! ```text
//!             addition  52345678.0 (±1.2%) i/s -  261728390 in   4.993021s (cycle=5234567)
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use ipsbench::prelude::*;
//!
//! let reports = ips(IpsConfig::default(), |job| {
//!     job.report("sort", || data.clone().sort());
//!     job.report("sort_unstable", || data.clone().sort_unstable());
//!     job.compare();
//! })?;
//! ```
//!
//! ## Batch-aware items
//!
//! An item that takes the iteration count runs its own loop, so the harness
//! adds no per-call overhead:
//!
//! ```ignore
//! job.report_counted("push", |n| {
//!     let mut v = Vec::new();
//!     for i in 0..n {
//!         v.push(i);
//!     }
//! });
//! job.report_source("sum", source!(data.iter().sum::<u64>()))?;
//! ```
//!
//! ## Benchmark binaries
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     Harness::new()
//!         .group("sorting", |job| { /* ... */ })
//!         .run()
//! }
//! ```

// Re-export core types
pub use ipsbench_core::{
    Action, ActionResult, AutoFlush, BATCH_TARGET_MICROS, BenchmarkJob, CountedFn,
    DEFAULT_TIME, DEFAULT_WARMUP, Engine, EnvCleaner, Instant, IpsConfig, IpsError, NoopCleaner,
    NullObserver, Observer, Phase, Progress, SimpleFn, Source, SourceCompiler, Suite, TrimCleaner,
    UserError, WorkItem, calibrate_cycles, ips, ips_with, pin_to_cpu, run_job,
};

// Re-export macros
pub use ipsbench_core::source;

// Re-export report types
pub use ipsbench_report::{
    IpsReport, OutputFormat, RunOutcome, RunSummary, SuiteSummary, format_comparison,
    format_suite, generate_json_report,
};

// Re-export stats
pub use ipsbench_stats::{Summary, compute_summary, mean, stddev};

// Re-export CLI
pub use ipsbench_cli::{Cli, Harness, HarnessOutcome, IpsConfigFile, Settings};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkJob, Harness, IpsConfig, IpsReport, Source, Suite, ips, ips_with, source,
    };
}
