//! Measurement Engine
//!
//! Runs the ips protocol over every item of a [`BenchmarkJob`]:
//!
//! ```text
//! pre-warmup   each item for warmup/2, timing discarded
//!      │
//!      ▼
//! warmup       single calls for `warmup`, count them
//!      │       → batch size ≈ calls per 100ms
//!      ▼
//! measurement  timed batches of that size for `time`
//!      │       → per-batch ips, mean, stddev
//!      ▼
//! IpsReport
//! ```
//!
//! Timing one batch instead of every call keeps timer overhead out of the
//! numbers for fast code, and the spread over batches gives the relative
//! error shown next to each result.

use crate::action::WorkItem;
use crate::error::{IpsError, Phase, UserError};
use crate::job::BenchmarkJob;
use crate::measure::{EnvCleaner, Instant, NoopCleaner};
use ipsbench_report::IpsReport;
use ipsbench_stats::compute_summary;
use std::time::Duration;
use tracing::{debug, warn};

/// Default measurement duration
pub const DEFAULT_TIME: Duration = Duration::from_secs(5);

/// Default warmup duration
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(2);

/// Wall time each measured batch should take, in microseconds
pub const BATCH_TARGET_MICROS: u64 = 100_000;

/// Durations of one engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpsConfig {
    /// How long to take timed batches per item
    pub time: Duration,
    /// How long to warm up and calibrate per item
    pub warmup: Duration,
}

impl IpsConfig {
    /// Config with explicit durations
    pub fn new(time: Duration, warmup: Duration) -> Self {
        Self { time, warmup }
    }

    /// Config from durations in seconds; negative values count as zero
    pub fn from_secs(time: f64, warmup: f64) -> Self {
        Self {
            time: Duration::from_secs_f64(time.max(0.0)),
            warmup: Duration::from_secs_f64(warmup.max(0.0)),
        }
    }
}

impl Default for IpsConfig {
    fn default() -> Self {
        Self {
            time: DEFAULT_TIME,
            warmup: DEFAULT_WARMUP,
        }
    }
}

/// Receives progress while the engine runs.
///
/// Every method defaults to doing nothing.
pub trait Observer {
    /// An item starts its warmup
    fn warming(&mut self, _label: &str, _warmup: Duration) {}

    /// Warmup finished with this elapsed time and batch size
    fn warmup_stats(&mut self, _warmup_time_us: u64, _cycles: u64) {}

    /// An item starts its timed batches
    fn running(&mut self, _label: &str, _time: Duration) {}

    /// An item finished measuring
    fn measured(&mut self, _report: &IpsReport) {}

    /// All items finished and a comparison was requested
    fn compare(&mut self, _reports: &[IpsReport]) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Number of calls expected to take about [`BATCH_TARGET_MICROS`].
///
/// Never returns less than 1, also when the warmup measured no time.
pub fn calibrate_cycles(warmup_time_us: u64, warmup_iter: u64) -> u64 {
    if warmup_time_us == 0 {
        return 1;
    }
    let cycles = (BATCH_TARGET_MICROS as f64 / warmup_time_us as f64) * warmup_iter as f64;
    (cycles as u64).max(1)
}

/// Per-batch coefficient of variation (percent) above which a run is logged
/// as noisy
const STABLE_CV_PERCENT: f64 = 5.0;

/// Reduce timed batches of `cycles` calls each into a report.
///
/// Batches that read 0µs are counted as 1µs so every per-batch rate is
/// finite.
pub fn reduce_measurements(
    label: &str,
    measurements: &[u64],
    cycles: u64,
    iterations: u64,
) -> IpsReport {
    let measured_us: u64 = measurements.iter().sum();

    let all_ips: Vec<f64> = measurements
        .iter()
        .map(|&us| cycles as f64 / (us.max(1) as f64 / 1_000_000.0))
        .collect();

    let summary = compute_summary(&all_ips);
    debug!(
        label,
        batches = summary.sample_count,
        min_ips = summary.min,
        max_ips = summary.max,
        cv = summary.coefficient_of_variation(),
        stable = summary.is_stable(STABLE_CV_PERCENT),
        "per-batch spread"
    );

    IpsReport::new(
        label,
        measured_us,
        iterations,
        summary.mean,
        summary.std_dev.round(),
        cycles,
    )
}

/// Drives calibration and measurement for a job
pub struct Engine {
    config: IpsConfig,
    cleaner: Box<dyn EnvCleaner>,
}

impl Engine {
    /// Engine with a no-op environment cleaner
    pub fn new(config: IpsConfig) -> Self {
        Self {
            config,
            cleaner: Box::new(NoopCleaner),
        }
    }

    /// Replace the environment cleaner run before each timed phase
    pub fn with_cleaner(mut self, cleaner: impl EnvCleaner + 'static) -> Self {
        self.cleaner = Box::new(cleaner);
        self
    }

    /// Durations used by this engine
    pub fn config(&self) -> IpsConfig {
        self.config
    }

    /// Measure every item of `job` in registration order.
    ///
    /// Items run one after another on the calling thread. The first failing
    /// item aborts the run; reports of earlier items were already handed to
    /// `observer`.
    pub fn run(
        &mut self,
        job: &mut BenchmarkJob<'_>,
        observer: &mut dyn Observer,
    ) -> Result<Vec<IpsReport>, IpsError> {
        let half_warmup = self.config.warmup / 2;
        debug!(items = job.len(), ?half_warmup, "pre-warmup");

        for item in job.items_mut() {
            self.cleaner.clean();
            warm(item, half_warmup, Phase::Prewarm)?;
        }

        let mut reports = Vec::with_capacity(job.len());

        for item in job.items_mut() {
            let report = self.measure_item(item, observer)?;
            observer.measured(&report);
            reports.push(report);
        }

        if job.compare_requested() {
            observer.compare(&reports);
        }

        Ok(reports)
    }

    fn measure_item(
        &mut self,
        item: &mut WorkItem<'_>,
        observer: &mut dyn Observer,
    ) -> Result<IpsReport, IpsError> {
        let IpsConfig { time, warmup } = self.config;

        observer.warming(item.label(), warmup);
        self.cleaner.clean();

        let (warmup_iter, warmup_time) = warm(item, warmup, Phase::Warmup)?;

        if warmup_time == 0 && warmup_iter > 0 {
            warn!(label = item.label(), warmup_iter, "warmup measured 0us, batch size clamped to 1");
        }
        let cycles = calibrate_cycles(warmup_time, warmup_iter);
        debug!(label = item.label(), warmup_iter, warmup_time, cycles, "calibrated batch size");

        observer.warmup_stats(warmup_time, cycles);
        self.cleaner.clean();
        observer.running(item.label(), time);

        let start = Instant::now();
        let mut cur = start;
        let mut before = start;
        let mut after = start;
        let mut iterations: u64 = 0;
        let mut measurements = Vec::new();

        while !start.elapsed(&cur, time) {
            before.update();
            item.call_times(cycles)
                .map_err(|source| user_failure(item.label(), Phase::Measurement, source))?;
            after.update();

            iterations = iterations.saturating_add(cycles);
            cur.update();

            measurements.push(before.diff(&after));
        }

        if !measurements.is_empty() && measurements.iter().all(|&us| us == 0) {
            warn!(
                label = item.label(),
                batches = measurements.len(),
                cycles,
                "every batch read 0us, rate counts them as 1us"
            );
        }

        debug!(label = item.label(), batches = measurements.len(), iterations, "measured");
        Ok(reduce_measurements(item.label(), &measurements, cycles, iterations))
    }
}

/// Call `item` once at a time until `duration` has passed.
///
/// Returns the number of calls and the elapsed microseconds.
fn warm(item: &mut WorkItem<'_>, duration: Duration, phase: Phase) -> Result<(u64, u64), IpsError> {
    let before = Instant::now();
    let start = before;
    let mut cur = start;
    let mut iterations: u64 = 0;

    while !start.elapsed(&cur, duration) {
        item.call_times(1)
            .map_err(|source| user_failure(item.label(), phase, source))?;
        iterations += 1;
        cur.update();
    }

    let after = Instant::now();
    Ok((iterations, before.diff(&after)))
}

fn user_failure(label: &str, phase: Phase, source: UserError) -> IpsError {
    IpsError::UserAction {
        label: label.to_string(),
        phase,
        source,
    }
}
