//! Suite
//!
//! Collects reports across runs. A run is one named unit of benchmarking
//! work (a group, a file, ...). Reports recorded while a run executes stay
//! pending until the run completes, then move under the run's id.
//!
//! One suite per thread can be *current*. [`crate::ips()`] records into it
//! when no suite is passed explicitly.

use chrono::{DateTime, Utc};
use fxhash::FxHashMap;
use ipsbench_report::{IpsReport, RunOutcome, RunSummary, SuiteSummary, format_suite};
use std::cell::RefCell;
use std::error::Error;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

/// Run id used for pending reports without a recorded location
pub const UNKNOWN_LOCATION: &str = "<unknown>";

thread_local! {
    static CURRENT: RefCell<Option<Suite>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone)]
enum RunRecord {
    Reports(Vec<IpsReport>),
    Simple {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
struct SuiteState {
    runs: FxHashMap<String, RunRecord>,
    order: Vec<String>,
    pending: Option<Vec<IpsReport>>,
    pending_location: Option<String>,
    quiet: bool,
    verbose: bool,
}

impl SuiteState {
    fn record(&mut self, id: String, record: RunRecord) {
        let replacement = match (self.runs.get_mut(&id), record) {
            (Some(RunRecord::Reports(existing)), RunRecord::Reports(more)) => {
                existing.extend(more);
                None
            }
            // an empty repeat keeps the reports already stored
            (Some(RunRecord::Reports(_)), RunRecord::Simple { .. }) => None,
            (_, record) => Some(record),
        };
        if let Some(record) = replacement {
            self.runs.insert(id.clone(), record);
        }

        if !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    fn flush_pending(&mut self) {
        if let Some(reports) = self.pending.take() {
            let id = self
                .pending_location
                .take()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
            self.record(id, RunRecord::Reports(reports));
        }
    }
}

/// Shared handle to a report aggregator.
///
/// Clones refer to the same suite.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    state: Rc<RefCell<SuiteState>>,
}

/// Puts the previous current suite back when dropped
struct Restore(Option<Suite>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

impl Suite {
    /// Create an empty suite
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with a fresh suite as the current one.
    ///
    /// The previous current suite is restored afterwards, also when `f`
    /// panics.
    pub fn create<R>(f: impl FnOnce(&Suite) -> R) -> (Suite, R) {
        let suite = Suite::new();
        let previous = CURRENT.with(|current| current.replace(Some(suite.clone())));
        let _restore = Restore(previous);

        let result = f(&suite);
        (suite, result)
    }

    /// Make `suite` current for the rest of the thread; returns the one it
    /// replaced
    pub fn install(suite: Suite) -> Option<Suite> {
        CURRENT.with(|current| current.replace(Some(suite)))
    }

    /// Clear the current suite; returns the one removed
    pub fn uninstall() -> Option<Suite> {
        CURRENT.with(|current| current.borrow_mut().take())
    }

    /// The current suite of this thread, if any
    pub fn current() -> Option<Suite> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Whether two handles refer to the same suite
    pub fn same(&self, other: &Suite) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Suppress per-item progress output
    pub fn quiet(&self) -> &Self {
        self.state.borrow_mut().quiet = true;
        self
    }

    /// Whether progress output is suppressed
    pub fn is_quiet(&self) -> bool {
        self.state.borrow().quiet
    }

    /// Print warmup and batch size diagnostics
    pub fn verbose(&self) -> &Self {
        self.state.borrow_mut().verbose = true;
        self
    }

    /// Whether diagnostics are printed
    pub fn is_verbose(&self) -> bool {
        self.state.borrow().verbose
    }

    pub(crate) fn warming(&self, out: &mut dyn Write, label: &str, warmup: Duration) {
        if self.is_verbose() {
            let _ = write!(out, "{:>20} warmup: {}s", label, warmup.as_secs_f64());
        }
    }

    pub(crate) fn warmup_stats(&self, out: &mut dyn Write, warmup_time_us: u64, cycles: u64) {
        if self.is_verbose() {
            let _ = write!(out, " time={}us, cycles={}.", warmup_time_us, cycles);
        }
    }

    pub(crate) fn running(&self, out: &mut dyn Write, _label: &str, time: Duration) {
        if self.is_verbose() {
            let _ = writeln!(out, " running: {}s...", time.as_secs_f64());
        }
    }

    /// Append `report` to the pending run.
    ///
    /// `location` names where the recording call was made; it becomes the
    /// run id if the reports are still pending at display time.
    pub fn add_report(&self, report: IpsReport, location: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.pending.get_or_insert_with(Vec::new).push(report);
        if let Some(location) = location {
            state.pending_location = Some(location.to_string());
        }
    }

    /// Reports recorded since the last completed run
    pub fn pending_reports(&self) -> Vec<IpsReport> {
        self.state.borrow().pending.clone().unwrap_or_default()
    }

    /// Execute one run.
    ///
    /// On failure the error and its causes are printed to stdout, the run is
    /// not recorded and `false` is returned.
    pub fn run<E, F>(&self, run_id: &str, f: F) -> bool
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<crate::UserError>,
    {
        self.run_to(&mut std::io::stdout(), run_id, f)
    }

    /// [`Suite::run`] with errors written to `out`
    pub fn run_to<E, F>(&self, out: &mut dyn Write, run_id: &str, f: F) -> bool
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<crate::UserError>,
    {
        let start = Utc::now();

        if let Err(err) = f() {
            let err: crate::UserError = err.into();
            let _ = writeln!(out, "\nError in {}:", run_id);
            let _ = writeln!(out, "  {}", err);

            let mut source = err.source();
            while let Some(cause) = source {
                let _ = writeln!(out, "  caused by: {}", cause);
                source = cause.source();
            }
            return false;
        }

        self.complete_run_between(run_id, start, Utc::now());
        true
    }

    /// Close the run `run_id`, taking over pending reports.
    ///
    /// A run without reports is stored with its start and end time.
    pub fn complete_run(&self, run_id: &str, start: DateTime<Utc>) {
        self.complete_run_between(run_id, start, Utc::now());
    }

    fn complete_run_between(&self, run_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        let mut state = self.state.borrow_mut();
        state.pending_location = None;

        let record = match state.pending.take() {
            Some(reports) => RunRecord::Reports(reports),
            None => RunRecord::Simple { start, end },
        };
        state.record(run_id.to_string(), record);
    }

    /// Completed run ids in completion order
    pub fn run_ids(&self) -> Vec<String> {
        self.state.borrow().order.clone()
    }

    /// Reports stored under `run_id`
    pub fn reports(&self, run_id: &str) -> Option<Vec<IpsReport>> {
        match self.state.borrow().runs.get(run_id)? {
            RunRecord::Reports(reports) => Some(reports.clone()),
            RunRecord::Simple { .. } => Some(Vec::new()),
        }
    }

    /// Serializable snapshot of every run.
    ///
    /// Pending reports are first stored under their recording location.
    pub fn summary(&self) -> SuiteSummary {
        let mut state = self.state.borrow_mut();
        state.flush_pending();

        let runs = state
            .order
            .iter()
            .filter_map(|id| {
                let outcome = match state.runs.get(id)? {
                    RunRecord::Reports(reports) => RunOutcome::Reports {
                        reports: reports.clone(),
                    },
                    RunRecord::Simple { start, end } => RunOutcome::Simple {
                        start: *start,
                        end: *end,
                    },
                };
                Some(RunSummary {
                    id: id.clone(),
                    outcome,
                })
            })
            .collect();

        SuiteSummary {
            generated_at: Utc::now(),
            runs,
        }
    }

    /// Human-readable listing of every run and its reports
    pub fn render(&self) -> String {
        format_suite(&self.summary())
    }

    /// Print [`Suite::render`] to stdout
    pub fn display(&self) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(self.render().as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(label: &str) -> IpsReport {
        IpsReport::new(label, 1_000_000, 10, 10.0, 1.0, 1)
    }

    #[test]
    fn test_create_sets_and_restores_current() {
        assert!(Suite::current().is_none());

        let (outer, inner) = Suite::create(|outer| {
            assert!(Suite::current().is_some_and(|s| s.same(outer)));

            let (inner, _) = Suite::create(|inner| {
                assert!(Suite::current().is_some_and(|s| s.same(inner)));
            });

            assert!(Suite::current().is_some_and(|s| s.same(outer)));
            inner
        });

        assert!(!outer.same(&inner));
        assert!(Suite::current().is_none());
    }

    #[test]
    fn test_create_restores_on_panic() {
        let (outer, _) = Suite::create(|outer| {
            let result = std::panic::catch_unwind(|| {
                let _: (Suite, ()) = Suite::create(|_| panic!("boom"));
            });
            assert!(result.is_err());
            assert!(Suite::current().is_some_and(|s| s.same(outer)));
        });

        drop(outer);
        assert!(Suite::current().is_none());
    }

    #[test]
    fn test_install_and_uninstall() {
        let suite = Suite::new();
        assert!(Suite::install(suite.clone()).is_none());
        assert!(Suite::current().is_some_and(|s| s.same(&suite)));
        assert!(Suite::uninstall().is_some());
        assert!(Suite::current().is_none());
    }

    #[test]
    fn test_run_moves_pending_reports() {
        let suite = Suite::new();
        let ok = suite.run("group_a", || -> Result<(), String> {
            suite.add_report(report("x"), Some("benches/a.rs"));
            suite.add_report(report("y"), Some("benches/a.rs"));
            Ok(())
        });

        assert!(ok);
        assert!(suite.pending_reports().is_empty());
        assert_eq!(suite.run_ids(), vec!["group_a"]);

        let labels: Vec<String> = suite
            .reports("group_a")
            .unwrap()
            .iter()
            .map(|r| r.label().to_string())
            .collect();
        assert_eq!(labels, vec!["x", "y"]);
    }

    #[test]
    fn test_run_without_reports_is_simple() {
        let suite = Suite::new();
        assert!(suite.run("empty", || -> Result<(), String> { Ok(()) }));

        let summary = suite.summary();
        assert_eq!(summary.runs.len(), 1);
        match &summary.runs[0].outcome {
            RunOutcome::Simple { start, end } => assert!(start <= end),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(suite.render(), "empty:\n  NO REPORTS FOUND\n");
    }

    #[test]
    fn test_failed_run_prints_and_is_not_recorded() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let suite = Suite::new();
        let mut out = Vec::new();
        let ok = suite.run_to(&mut out, "broken", || {
            Err(Outer(std::io::Error::other("inner")))
        });

        assert!(!ok);
        assert!(suite.run_ids().is_empty());
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "\nError in broken:\n  outer\n  caused by: inner\n");
    }

    #[test]
    fn test_pending_reports_flush_under_location() {
        let suite = Suite::new();
        suite.add_report(report("loose"), Some("src/main.rs"));

        assert_eq!(suite.pending_reports().len(), 1);
        let rendered = suite.render();
        assert!(rendered.starts_with("src/main.rs:\n  "));
        assert!(rendered.contains("loose"));
        assert!(suite.pending_reports().is_empty());
    }

    #[test]
    fn test_pending_reports_without_location() {
        let suite = Suite::new();
        suite.add_report(report("anon"), None);
        assert_eq!(suite.run_ids(), Vec::<String>::new());
        suite.summary();
        assert_eq!(suite.run_ids(), vec![UNKNOWN_LOCATION]);
    }

    #[test]
    fn test_repeated_run_id_appends() {
        let suite = Suite::new();
        for label in ["first", "second"] {
            suite.run("same", || -> Result<(), String> {
                suite.add_report(report(label), None);
                Ok(())
            });
        }

        assert_eq!(suite.run_ids(), vec!["same"]);
        assert_eq!(suite.reports("same").unwrap().len(), 2);
    }

    #[test]
    fn test_empty_repeat_keeps_reports() {
        let suite = Suite::new();
        suite.run("same", || -> Result<(), String> {
            suite.add_report(report("kept"), None);
            Ok(())
        });
        suite.run("same", || -> Result<(), String> { Ok(()) });

        assert_eq!(suite.run_ids(), vec!["same"]);
        let reports = suite.reports("same").unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].label(), "kept");
        assert!(!suite.render().contains("NO REPORTS FOUND"));
    }

    #[test]
    fn test_reports_after_empty_run_replace_it() {
        let suite = Suite::new();
        suite.run("same", || -> Result<(), String> { Ok(()) });
        suite.run("same", || -> Result<(), String> {
            suite.add_report(report("later"), None);
            Ok(())
        });

        assert_eq!(suite.reports("same").unwrap().len(), 1);
        assert!(suite.render().starts_with("same:\n  "));
        assert!(!suite.render().contains("NO REPORTS FOUND"));
    }

    #[test]
    fn test_verbose_diagnostics() {
        let suite = Suite::new();
        let mut out = Vec::new();

        suite.warming(&mut out, "quiet", Duration::from_secs(2));
        assert!(out.is_empty());

        suite.verbose();
        suite.warming(&mut out, "sort", Duration::from_secs(2));
        suite.warmup_stats(&mut out, 2_000_000, 50);
        suite.running(&mut out, "sort", Duration::from_millis(500));

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "                sort warmup: 2s time=2000000us, cycles=50. running: 0.5s...\n"
        );
    }

    #[test]
    fn test_flags() {
        let suite = Suite::new();
        assert!(!suite.is_quiet());
        suite.quiet().verbose();
        assert!(suite.is_quiet());
        assert!(suite.is_verbose());
    }
}
