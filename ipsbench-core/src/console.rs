//! Console Progress
//!
//! Prints each item's label when its warmup starts and the report body once
//! it is measured, so a slow item is visible while it runs.

use crate::engine::Observer;
use crate::suite::Suite;
use ipsbench_report::{IpsReport, LABEL_WIDTH, format_comparison};
use std::cell::Cell;
use std::io::Write;
use std::time::Duration;

thread_local! {
    static AUTO_FLUSH: Cell<bool> = const { Cell::new(false) };
}

/// Whether progress output on this thread is flushed after every write
pub fn auto_flush() -> bool {
    AUTO_FLUSH.with(Cell::get)
}

/// Forces flush-after-write on the current thread while alive; restores the
/// previous mode on drop
#[derive(Debug)]
pub struct AutoFlush {
    previous: bool,
}

impl AutoFlush {
    /// Turn auto-flush on
    pub fn enable() -> Self {
        Self {
            previous: AUTO_FLUSH.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for AutoFlush {
    fn drop(&mut self) {
        AUTO_FLUSH.with(|flag| flag.set(self.previous));
    }
}

/// [`Observer`] writing progress lines and recording reports into a suite
pub struct Progress<W: Write> {
    out: W,
    suite: Option<Suite>,
    location: Option<String>,
}

impl<W: Write> Progress<W> {
    /// Write to `out`; reports go to `suite` tagged with `location`
    pub fn new(out: W, suite: Option<Suite>, location: Option<String>) -> Self {
        Self {
            out,
            suite,
            location,
        }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn quiet(&self) -> bool {
        self.suite.as_ref().is_some_and(Suite::is_quiet)
    }

    fn flush(&mut self) {
        if auto_flush() {
            let _ = self.out.flush();
        }
    }
}

impl<W: Write> Observer for Progress<W> {
    fn warming(&mut self, label: &str, warmup: Duration) {
        if let Some(suite) = &self.suite {
            suite.warming(&mut self.out, label, warmup);
        }

        if !self.quiet() {
            // long labels get their own line so the columns stay aligned
            let _ = if label.chars().count() > LABEL_WIDTH {
                write!(self.out, "{}\n{:width$}", label, "", width = LABEL_WIDTH)
            } else {
                write!(self.out, "{:>width$}", label, width = LABEL_WIDTH)
            };
        }
        self.flush();
    }

    fn warmup_stats(&mut self, warmup_time_us: u64, cycles: u64) {
        if let Some(suite) = &self.suite {
            suite.warmup_stats(&mut self.out, warmup_time_us, cycles);
            self.flush();
        }
    }

    fn running(&mut self, label: &str, time: Duration) {
        if let Some(suite) = &self.suite {
            suite.running(&mut self.out, label, time);
            self.flush();
        }
    }

    fn measured(&mut self, report: &IpsReport) {
        if !self.quiet() {
            let _ = writeln!(self.out, " {}", report.body());
            self.flush();
        }

        if let Some(suite) = &self.suite {
            suite.add_report(report.clone(), self.location.as_deref());
        }
    }

    fn compare(&mut self, reports: &[IpsReport]) {
        let _ = self.out.write_all(format_comparison(reports).as_bytes());
        self.flush();
    }
}
