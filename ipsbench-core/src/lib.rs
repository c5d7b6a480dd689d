#![warn(missing_docs)]
//! ipsbench Core - Measurement Runtime
//!
//! This crate measures how many times per second a piece of code runs:
//! - `BenchmarkJob` for registering labelled work items
//! - `Engine` for warmup, batch size calibration and timed batches
//! - `Suite` for collecting reports across named runs
//! - `ips` as the one-call entry point with console progress

mod action;
mod console;
mod engine;
mod error;
mod ips;
mod job;
mod measure;
mod suite;

pub use action::{Action, ActionResult, CountedFn, SimpleFn, Source, SourceCompiler, WorkItem};
pub use console::{AutoFlush, Progress, auto_flush};
pub use engine::{
    BATCH_TARGET_MICROS, DEFAULT_TIME, DEFAULT_WARMUP, Engine, IpsConfig, NullObserver, Observer,
    calibrate_cycles, reduce_measurements,
};
pub use error::{IpsError, Phase, UserError};
pub use ips::{ips, ips_with, run_job};
pub use job::BenchmarkJob;
pub use measure::{EnvCleaner, Instant, NoopCleaner, TrimCleaner, pin_to_cpu};
pub use suite::{Suite, UNKNOWN_LOCATION};

pub use ipsbench_report::IpsReport;
