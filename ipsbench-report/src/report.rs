//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the label column in rendered lines
pub const LABEL_WIDTH: usize = 20;

/// Result of measuring one labeled work item.
///
/// Immutable once built; the derived metrics are computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpsReport {
    label: String,
    microseconds: u64,
    iterations: u64,
    ips: f64,
    ips_stddev: f64,
    cycles_per_batch: u64,
}

impl IpsReport {
    /// Build a report from the raw measurement values
    pub fn new(
        label: impl Into<String>,
        microseconds: u64,
        iterations: u64,
        ips: f64,
        ips_stddev: f64,
        cycles_per_batch: u64,
    ) -> Self {
        Self {
            label: label.into(),
            microseconds,
            iterations,
            ips,
            ips_stddev,
            cycles_per_batch,
        }
    }

    /// Label of the measured item
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sum of all timed batches, in microseconds
    pub fn microseconds(&self) -> u64 {
        self.microseconds
    }

    /// Total iterations executed while measuring
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Mean iterations per second over all batches
    pub fn ips(&self) -> f64 {
        self.ips
    }

    /// Standard deviation of the per-batch ips estimates
    pub fn ips_stddev(&self) -> f64 {
        self.ips_stddev
    }

    /// Batch size chosen during calibration
    pub fn cycles_per_batch(&self) -> u64 {
        self.cycles_per_batch
    }

    /// Measured time in seconds
    pub fn seconds(&self) -> f64 {
        self.microseconds as f64 / 1_000_000.0
    }

    /// Relative standard deviation in percent.
    ///
    /// Returns `0.0` when `ips` is zero; check [`IpsReport::is_degenerate`]
    /// to tell that case apart from a perfectly stable run.
    pub fn stddev_percentage(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            100.0 * (self.ips_stddev / self.ips)
        }
    }

    /// True when no throughput could be derived (`ips == 0`)
    pub fn is_degenerate(&self) -> bool {
        self.ips == 0.0
    }

    /// Label right-justified to the label column
    pub fn header(&self) -> String {
        format!("{:>width$}", self.label, width = LABEL_WIDTH)
    }

    /// Throughput, relative error, iterations, time and batch size
    pub fn body(&self) -> String {
        let left = format!("{:10.1} (±{:.1}%) i/s", self.ips, self.stddev_percentage());
        format!(
            "{:<width$} - {:10} in {:10.6}s (cycle={})",
            left,
            self.iterations,
            self.seconds(),
            self.cycles_per_batch,
            width = LABEL_WIDTH
        )
    }
}

impl fmt::Display for IpsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.header(), self.body())
    }
}

/// Serializable view of a whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// When the summary was taken
    pub generated_at: DateTime<Utc>,
    /// Runs in completion order
    pub runs: Vec<RunSummary>,
}

/// One completed run inside a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identity (group name, source location, ...)
    pub id: String,
    /// What the run produced
    pub outcome: RunOutcome,
}

/// What a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RunOutcome {
    /// Reports in measurement order
    Reports {
        /// Recorded reports
        reports: Vec<IpsReport>,
    },
    /// The run completed without measuring anything
    Simple {
        /// Run start
        start: DateTime<Utc>,
        /// Run end
        end: DateTime<Utc>,
    },
}

impl RunOutcome {
    /// Reports of this run; empty for a simple run
    pub fn reports(&self) -> &[IpsReport] {
        match self {
            RunOutcome::Reports { reports } => reports,
            RunOutcome::Simple { .. } => &[],
        }
    }
}
