#![warn(missing_docs)]
//! ipsbench Report - Results and Rendering
//!
//! - `IpsReport`: immutable per-item result with derived metrics
//! - Fixed-width report lines, comparison tables and suite listings
//! - JSON export of a suite summary

mod format;
mod json;
mod report;

pub use format::{NO_REPORTS, format_comparison, format_suite};
pub use json::{ReportSchema, SCHEMA_ID, SCHEMA_VERSION, generate_json_report};
pub use report::{IpsReport, LABEL_WIDTH, RunOutcome, RunSummary, SuiteSummary};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Human,
    /// JSON with schema envelope
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
