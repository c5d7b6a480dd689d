//! Output Formatting
//!
//! Human-readable rendering of comparisons and suite summaries.

use crate::report::{IpsReport, LABEL_WIDTH, RunOutcome, SuiteSummary};

/// Marker printed for a run that recorded nothing
pub const NO_REPORTS: &str = "NO REPORTS FOUND";

/// Format a relative-speed comparison of `reports`.
///
/// Entries are sorted fastest first; every other entry shows how many times
/// slower it is than the fastest one.
pub fn format_comparison(reports: &[IpsReport]) -> String {
    let mut sorted: Vec<&IpsReport> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        b.ips()
            .partial_cmp(&a.ips())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut output = String::from("\nComparison:\n");
    let Some(best) = sorted.first() else {
        return output;
    };

    output.push_str(&format!(
        "{:>width$}: {:10.1} i/s\n",
        best.label(),
        best.ips(),
        width = LABEL_WIDTH
    ));

    for rep in sorted.iter().skip(1) {
        let slowdown = if rep.is_degenerate() {
            "n/a".to_string()
        } else {
            format!("{:.2}x", best.ips() / rep.ips())
        };
        output.push_str(&format!(
            "{:>width$}: {:10.1} i/s - {} slower\n",
            rep.label(),
            rep.ips(),
            slowdown,
            width = LABEL_WIDTH
        ));
    }

    output.push('\n');
    output
}

/// Format a suite summary for terminal display.
///
/// Each run is printed as `<id>:` followed by its indented report lines.
pub fn format_suite(summary: &SuiteSummary) -> String {
    let mut output = String::new();

    for run in &summary.runs {
        output.push_str(&format!("{}:\n", run.id));

        match &run.outcome {
            RunOutcome::Reports { reports } if !reports.is_empty() => {
                for rep in reports {
                    output.push_str(&format!("  {}\n", rep));
                }
            }
            _ => {
                output.push_str(&format!("  {}\n", NO_REPORTS));
            }
        }
    }

    output
}
