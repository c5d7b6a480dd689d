//! Integration tests for ipsbench
//!
//! These tests verify the end-to-end behavior of calibration, measurement and
//! suite aggregation.

use ipsbench::prelude::*;
use ipsbench::{
    Action, Engine, IpsError, NullObserver, Observer, Phase, RunOutcome, SourceCompiler,
    CountedFn, WorkItem, format_comparison, generate_json_report, mean, stddev,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

fn quick() -> IpsConfig {
    IpsConfig::new(Duration::from_millis(30), Duration::from_millis(20))
}

/// A 250ms body measured for 1s after a 1s warmup runs about four times
#[test]
fn test_sleep_calibration() {
    let (suite, reports) = Suite::create(|s| {
        s.quiet();

        ips(IpsConfig::from_secs(1.0, 1.0), |job| {
            job.report("sleep", || std::thread::sleep(Duration::from_millis(250)));
        })
    });

    let reports = reports.unwrap();
    assert_eq!(reports.len(), 1);

    let rep = &suite.pending_reports()[0];
    assert_eq!(rep.label(), "sleep");
    assert!(
        (3..=5).contains(&rep.iterations()),
        "iterations = {}",
        rep.iterations()
    );
    assert!((rep.ips() - 4.0).abs() < 0.2, "ips = {}", rep.ips());
    assert_eq!(rep.cycles_per_batch(), 1);
    assert_eq!(rep.label(), reports[0].label());
}

/// Fast bodies get batches large enough that timer reads are negligible
#[test]
fn test_batch_size_scales_with_speed() {
    let mut job = BenchmarkJob::new();
    job.report("tiny", || 1u64 + 1)
        .report("slow", || std::thread::sleep(Duration::from_millis(5)));

    let config = IpsConfig::new(Duration::from_millis(200), Duration::from_millis(100));
    let reports = Engine::new(config).run(&mut job, &mut NullObserver).unwrap();

    assert!(reports[0].cycles_per_batch() > 1_000);
    assert!(reports[1].cycles_per_batch() >= 1);
    assert!(reports[1].cycles_per_batch() < 100);
    assert!(reports[0].ips() > reports[1].ips());
}

/// Every shape of item is measured and runs at least as often as reported
#[test]
fn test_iteration_accounting_across_item_shapes() {
    let simple = Cell::new(0u64);
    let counted = Cell::new(0u64);
    let sourced = &Cell::new(0u64);

    struct Counting {
        events: Vec<(String, u64)>,
    }

    impl Observer for Counting {
        fn measured(&mut self, report: &IpsReport) {
            self.events
                .push((report.label().to_string(), report.iterations()));
        }
    }

    let mut job = BenchmarkJob::new();
    job.report("simple", || simple.set(simple.get() + 1))
        .report_counted("counted", |n| counted.set(counted.get() + n))
        .report_source("source", source!(sourced.set(sourced.get() + 1)))
        .unwrap();

    let mut observer = Counting { events: Vec::new() };
    let engine_runs = Engine::new(quick()).run(&mut job, &mut observer).unwrap();
    assert_eq!(engine_runs.len(), 3);

    // measured iterations are a lower bound of all calls (warmups add more)
    for ((label, iterations), calls) in observer
        .events
        .iter()
        .zip([simple.get(), counted.get(), sourced.get()])
    {
        assert!(calls >= *iterations, "{}: {} < {}", label, calls, iterations);
        assert!(*iterations > 0, "{} never measured", label);
    }
}

#[test]
fn test_source_macro_counter_starts_at_zero() {
    let seen = &RefCell::new(Vec::new());
    let mut item = WorkItem::new("push", Some(source!(|i| seen.borrow_mut().push(i))), None, None)
        .unwrap();

    item.call_times(4).unwrap();
    item.call_times(2).unwrap();

    assert!(item.source_text().is_some_and(|text| text.contains("push")));
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 0, 1]);
}

#[test]
fn test_text_source_with_compiler() {
    struct Spin;

    impl SourceCompiler for Spin {
        fn compile(&self, text: &str) -> Result<CountedFn<'static>, String> {
            let rounds: u64 = text
                .strip_prefix("spin ")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| format!("cannot compile '{}'", text))?;
            Ok(Box::new(move |times: u64| -> ipsbench::ActionResult {
                for _ in 0..times * rounds {
                    std::hint::black_box(());
                }
                Ok(())
            }))
        }
    }

    let mut job = BenchmarkJob::new().with_compiler(Spin);
    job.report_source("spin", "spin 10").unwrap();

    let err = job.report_source("bad", "jump 10").unwrap_err();
    assert!(matches!(err, IpsError::InvalidAction { ref label, .. } if label == "bad"));

    let err = job.report_source("blank", "   ").unwrap_err();
    assert!(matches!(err, IpsError::InvalidAction { .. }));

    assert_eq!(job.len(), 1);
    let reports = Engine::new(quick()).run(&mut job, &mut NullObserver).unwrap();
    assert!(reports[0].ips() > 0.0);
}

#[test]
fn test_registration_rejects_ambiguous_and_empty() {
    let mut job = BenchmarkJob::new();

    let err = job
        .item("both", Some(source!(1)), Some(Action::simple(|| 1)))
        .unwrap_err();
    assert!(matches!(err, IpsError::AmbiguousSpecification { .. }));
    assert_eq!(err.label(), "both");

    let err = job.item("neither", None, None).unwrap_err();
    assert!(matches!(err, IpsError::InvalidAction { .. }));

    let err = job.report_source("no compiler", "a + b").unwrap_err();
    assert!(matches!(err, IpsError::InvalidAction { .. }));

    assert!(job.is_empty());
}

#[test]
fn test_compare_output_in_order_of_speed() {
    let mut job = BenchmarkJob::new();
    job.report("slow", || std::thread::sleep(Duration::from_micros(500)))
        .report("fast", || 1 + 1)
        .compare();

    let reports = Engine::new(quick()).run(&mut job, &mut NullObserver).unwrap();
    let text = format_comparison(&reports);

    let fast = text.find("fast:").unwrap();
    let slow = text.find("slow:").unwrap();
    assert!(fast < slow);
    assert!(text.contains("x slower"));
    assert!(!text[..slow].contains("slower"));
}

#[test]
fn test_error_reports_label_and_phase() {
    let mut job = BenchmarkJob::new();
    job.try_report("io", || -> Result<(), std::io::Error> {
        Err(std::io::Error::other("disk gone"))
    });

    let err = Engine::new(quick()).run(&mut job, &mut NullObserver).unwrap_err();
    assert_eq!(err.to_string(), "'io' failed during pre-warmup");
    match err {
        IpsError::UserAction { phase, source, .. } => {
            assert_eq!(phase, Phase::Prewarm);
            assert_eq!(source.to_string(), "disk gone");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_suite_across_runs_and_json() {
    let (suite, ()) = Suite::create(|s| {
        s.quiet();

        let ok = s.run("arith", || {
            ips(quick(), |job| {
                job.report("add", || 2 + 2).report("mul", || 2 * 2);
            })
            .map(|_| ())
        });
        assert!(ok);

        assert!(s.run("nothing", || -> Result<(), IpsError> { Ok(()) }));

        let failed = s.run("broken", || {
            ips(quick(), |job| {
                job.try_report("boom", || -> Result<(), &str> { Err("no") });
            })
            .map(|_| ())
        });
        assert!(!failed);
    });

    assert_eq!(suite.run_ids(), vec!["arith", "nothing"]);

    let rendered = suite.render();
    assert!(rendered.starts_with("arith:\n  "));
    assert!(rendered.contains("nothing:\n  NO REPORTS FOUND\n"));

    let json = generate_json_report(&suite.summary()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["schema"], "ipsbench-suite");
    let runs = value["suite"]["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["outcome"]["kind"], "reports");
    assert_eq!(runs[0]["outcome"]["reports"][1]["label"], "mul");
    assert_eq!(runs[1]["outcome"]["kind"], "simple");

    let summary = suite.summary();
    assert!(matches!(summary.runs[1].outcome, RunOutcome::Simple { .. }));
}

#[test]
fn test_stats_helpers() {
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    assert_eq!(stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
}
