//! Entry points
//!
//! `ips` measures a job with console progress and records the reports into
//! the current suite.
//!
//! ```ignore
//! let reports = ipsbench_core::ips(IpsConfig::default(), |job| {
//!     job.report("sort", || data.clone().sort());
//!     job.report("sort_unstable", || data.clone().sort_unstable());
//!     job.compare();
//! })?;
//! ```

use crate::console::{AutoFlush, Progress};
use crate::engine::{Engine, IpsConfig};
use crate::error::IpsError;
use crate::job::BenchmarkJob;
use crate::suite::Suite;
use ipsbench_report::IpsReport;
use std::panic::Location;

/// Build a job with `build` and measure it, recording into
/// [`Suite::current`] if there is one.
#[track_caller]
pub fn ips<'a>(
    config: IpsConfig,
    build: impl FnOnce(&mut BenchmarkJob<'a>),
) -> Result<Vec<IpsReport>, IpsError> {
    let suite = Suite::current();
    ips_with(config, suite.as_ref(), build)
}

/// [`ips`] with an explicit suite instead of the current one
#[track_caller]
pub fn ips_with<'a>(
    config: IpsConfig,
    suite: Option<&Suite>,
    build: impl FnOnce(&mut BenchmarkJob<'a>),
) -> Result<Vec<IpsReport>, IpsError> {
    let mut job = BenchmarkJob::new();
    build(&mut job);
    run_job(&mut job, &mut Engine::new(config), suite)
}

/// Measure an already built job with `engine`
#[track_caller]
pub fn run_job(
    job: &mut BenchmarkJob<'_>,
    engine: &mut Engine,
    suite: Option<&Suite>,
) -> Result<Vec<IpsReport>, IpsError> {
    let location = Location::caller().file().to_string();
    let _flush = AutoFlush::enable();

    let mut progress = Progress::new(std::io::stdout(), suite.cloned(), Some(location));
    engine.run(job, &mut progress)
}
