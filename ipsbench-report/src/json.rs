//! JSON Output

use crate::report::SuiteSummary;
use serde::{Deserialize, Serialize};

/// Schema identifier written into JSON reports
pub const SCHEMA_ID: &str = "ipsbench-suite";

/// Schema version written into JSON reports
pub const SCHEMA_VERSION: u32 = 1;

/// Envelope around a suite summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchema {
    /// Schema identifier
    pub schema: String,
    /// Schema version
    pub version: u32,
    /// The suite contents
    pub suite: SuiteSummary,
}

/// Generate a prettified JSON report.
pub fn generate_json_report(summary: &SuiteSummary) -> Result<String, serde_json::Error> {
    let envelope = ReportSchema {
        schema: SCHEMA_ID.to_string(),
        version: SCHEMA_VERSION,
        suite: summary.clone(),
    };
    serde_json::to_string_pretty(&envelope)
}
