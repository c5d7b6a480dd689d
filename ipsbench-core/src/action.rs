//! Work Items
//!
//! A work item is a labeled unit of work that can be run exactly `n` times.
//! Three shapes are supported:
//! - simple actions, called once per iteration in a counted loop
//! - counted (batch-aware) actions, called once with the iteration count
//! - source bodies, counted loops built from inline code by [`source!`]
//!   or from text by a [`SourceCompiler`]
//!
//! The shape is resolved at registration and never re-checked per call.

use crate::error::{IpsError, UserError};
use std::fmt;
use std::hint::black_box;

/// Outcome of one invocation of a user action
pub type ActionResult = Result<(), UserError>;

/// Single-iteration callable
pub type SimpleFn<'a> = Box<dyn FnMut() -> ActionResult + 'a>;

/// Callable that runs its work the given number of times
pub type CountedFn<'a> = Box<dyn FnMut(u64) -> ActionResult + 'a>;

/// A callable registered for measurement
pub enum Action<'a> {
    /// Runs one iteration per call
    Simple(SimpleFn<'a>),
    /// Runs `n` iterations per call
    Counted(CountedFn<'a>),
}

impl<'a> Action<'a> {
    /// Wrap an infallible single-iteration closure
    pub fn simple<T, F>(mut f: F) -> Self
    where
        F: FnMut() -> T + 'a,
    {
        Action::Simple(Box::new(move || -> ActionResult {
            black_box(f());
            Ok(())
        }))
    }

    /// Wrap a fallible single-iteration closure
    pub fn try_simple<T, E, F>(mut f: F) -> Self
    where
        F: FnMut() -> Result<T, E> + 'a,
        E: Into<UserError>,
    {
        Action::Simple(Box::new(move || -> ActionResult {
            match f() {
                Ok(value) => {
                    black_box(value);
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        }))
    }

    /// Wrap an infallible batch-aware closure
    pub fn counted<F>(mut f: F) -> Self
    where
        F: FnMut(u64) + 'a,
    {
        Action::Counted(Box::new(move |times| -> ActionResult {
            f(times);
            Ok(())
        }))
    }

    /// Wrap a fallible batch-aware closure
    pub fn try_counted<E, F>(mut f: F) -> Self
    where
        F: FnMut(u64) -> Result<(), E> + 'a,
        E: Into<UserError>,
    {
        Action::Counted(Box::new(move |times| -> ActionResult {
            f(times).map_err(Into::into)
        }))
    }

    /// Whether the action takes the iteration count itself
    pub fn is_batch_aware(&self) -> bool {
        matches!(self, Action::Counted(_))
    }
}

impl fmt::Debug for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Simple(_) => f.write_str("Action::Simple"),
            Action::Counted(_) => f.write_str("Action::Counted"),
        }
    }
}

/// Benchmark body given as source text.
///
/// Built either by [`source!`](crate::source), which also carries the
/// compiled loop, or from plain text that a [`SourceCompiler`] turns into a
/// counted loop at registration.
pub struct Source<'a> {
    text: String,
    body: Option<CountedFn<'a>>,
}

impl<'a> Source<'a> {
    /// Source text that still needs a [`SourceCompiler`]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            body: None,
        }
    }

    /// Source text together with its counted loop
    pub fn compiled<F>(text: impl Into<String>, mut body: F) -> Self
    where
        F: FnMut(u64) + 'a,
    {
        Self {
            text: text.into(),
            body: Some(Box::new(move |times| -> ActionResult {
                body(times);
                Ok(())
            })),
        }
    }

    /// The source text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the counted loop is already available
    pub fn is_compiled(&self) -> bool {
        self.body.is_some()
    }
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("text", &self.text)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

impl From<&str> for Source<'_> {
    fn from(text: &str) -> Self {
        Source::text(text)
    }
}

impl From<String> for Source<'_> {
    fn from(text: String) -> Self {
        Source::text(text)
    }
}

/// Turns source text into a counted loop.
///
/// The returned callable must run the body exactly `n` times per call with
/// a loop counter starting at 0.
pub trait SourceCompiler {
    /// Compile `text`; the error string explains why it was rejected
    fn compile(&self, text: &str) -> Result<CountedFn<'static>, String>;
}

/// Build a [`Source`] from inline code.
///
/// The body runs in a counted loop; `source!(|i| ...)` binds the loop
/// counter, which starts at 0. Captured variables are moved into the loop,
/// so borrow explicitly to keep using them.
///
/// ```ignore
/// job.report_source("push", source!(|i| v.push(i)))?;
/// job.report_source("sum", source!(data.iter().sum::<u64>()))?;
/// ```
#[macro_export]
macro_rules! source {
    (|$i:ident| $($body:tt)*) => {
        $crate::Source::compiled(stringify!($($body)*), move |__ips_total: u64| {
            for $i in 0..__ips_total {
                let _ = ::std::hint::black_box({ $($body)* });
            }
        })
    };
    ($($body:tt)*) => {
        $crate::source!(|__ips_i| $($body)*)
    };
}

enum Body<'a> {
    Simple(SimpleFn<'a>),
    Counted(CountedFn<'a>),
    Source { text: String, body: CountedFn<'a> },
}

/// A named unit of work owned by a [`BenchmarkJob`](crate::BenchmarkJob)
pub struct WorkItem<'a> {
    label: String,
    body: Body<'a>,
}

impl<'a> WorkItem<'a> {
    /// Validate and build a work item.
    ///
    /// Exactly one of `source` and `action` must be given. Source text must
    /// be non-empty and either carry its compiled loop or be compiled by
    /// `compiler`.
    pub fn new(
        label: impl Into<String>,
        source: Option<Source<'a>>,
        action: Option<Action<'a>>,
        compiler: Option<&dyn SourceCompiler>,
    ) -> Result<Self, IpsError> {
        let label = label.into();

        let body = match (source, action) {
            (Some(_), Some(_)) => return Err(IpsError::AmbiguousSpecification { label }),
            (None, None) => {
                return Err(IpsError::InvalidAction {
                    label,
                    reason: "no callable or source text given".to_string(),
                });
            }
            (None, Some(action)) => return Ok(Self::from_action(label, action)),
            (Some(source), None) => Self::compile_source(&label, source, compiler)?,
        };

        Ok(Self { label, body })
    }

    pub(crate) fn from_action(label: String, action: Action<'a>) -> Self {
        let body = match action {
            Action::Simple(f) => Body::Simple(f),
            Action::Counted(f) => Body::Counted(f),
        };
        Self { label, body }
    }

    fn compile_source(
        label: &str,
        source: Source<'a>,
        compiler: Option<&dyn SourceCompiler>,
    ) -> Result<Body<'a>, IpsError> {
        let invalid = |reason: String| IpsError::InvalidAction {
            label: label.to_string(),
            reason,
        };

        if source.text.trim().is_empty() {
            return Err(invalid("source text is empty".to_string()));
        }

        let body = match (source.body, compiler) {
            (Some(body), _) => body,
            (None, Some(compiler)) => compiler.compile(&source.text).map_err(invalid)?,
            (None, None) => {
                return Err(invalid(
                    "source text needs a compiler; use source! or configure one".to_string(),
                ));
            }
        };

        Ok(Body::Source {
            text: source.text,
            body,
        })
    }

    /// Label of the item
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the action loops internally over the iteration count
    pub fn is_batch_aware(&self) -> bool {
        !matches!(self.body, Body::Simple(_))
    }

    /// Source text, if the item was registered from source
    pub fn source_text(&self) -> Option<&str> {
        match &self.body {
            Body::Source { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Run the user's work exactly `times` times.
    ///
    /// Stops at the first failure and returns it.
    #[inline]
    pub fn call_times(&mut self, times: u64) -> ActionResult {
        match &mut self.body {
            Body::Simple(f) => {
                let mut i = 0;
                while i < times {
                    f()?;
                    i += 1;
                }
                Ok(())
            }
            Body::Counted(f) | Body::Source { body: f, .. } => f(times),
        }
    }
}

impl fmt::Debug for WorkItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("label", &self.label)
            .field("batch_aware", &self.is_batch_aware())
            .field("source", &self.source_text())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct RepeatCompiler;

    impl SourceCompiler for RepeatCompiler {
        fn compile(&self, text: &str) -> Result<CountedFn<'static>, String> {
            if text == "nop" {
                Ok(Box::new(|times| -> ActionResult {
                    for i in 0..times {
                        black_box(i);
                    }
                    Ok(())
                }))
            } else {
                Err(format!("unknown snippet `{}`", text))
            }
        }
    }

    #[test]
    fn test_simple_runs_exactly_n_times() {
        let calls = Cell::new(0u64);
        let mut item = WorkItem::new(
            "count",
            None,
            Some(Action::simple(|| calls.set(calls.get() + 1))),
            None,
        )
        .unwrap();

        assert!(!item.is_batch_aware());
        item.call_times(7).unwrap();
        assert_eq!(calls.get(), 7);
        item.call_times(0).unwrap();
        assert_eq!(calls.get(), 7);
    }

    #[test]
    fn test_counted_called_once_with_n() {
        let seen = Cell::new(Vec::new());
        let mut item = WorkItem::new(
            "batch",
            None,
            Some(Action::counted(|n| {
                let mut v = seen.take();
                v.push(n);
                seen.set(v);
            })),
            None,
        )
        .unwrap();

        assert!(item.is_batch_aware());
        item.call_times(250).unwrap();
        assert_eq!(seen.take(), vec![250]);
    }

    #[test]
    fn test_source_macro_counter_starts_at_zero() {
        let seen = &std::cell::RefCell::new(Vec::new());
        let source = crate::source!(|i| seen.borrow_mut().push(i));
        assert!(source.is_compiled());
        assert!(source.as_str().contains("push"));

        let mut item = WorkItem::new("src", Some(source), None, None).unwrap();
        item.call_times(4).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
        assert!(item.source_text().is_some());
    }

    #[test]
    fn test_source_macro_without_counter() {
        let total = &Cell::new(0u64);
        let mut item = WorkItem::new(
            "plain",
            Some(crate::source!(total.set(total.get() + 2))),
            None,
            None,
        )
        .unwrap();

        item.call_times(5).unwrap();
        assert_eq!(total.get(), 10);
    }

    #[test]
    fn test_both_is_ambiguous() {
        let result = WorkItem::new(
            "both",
            Some(Source::text("1 + 1")),
            Some(Action::simple(|| 2)),
            None,
        );
        assert!(matches!(
            result,
            Err(IpsError::AmbiguousSpecification { ref label }) if label == "both"
        ));
    }

    #[test]
    fn test_neither_is_invalid() {
        let result = WorkItem::new("none", None, None, None);
        assert!(matches!(result, Err(IpsError::InvalidAction { .. })));
    }

    #[test]
    fn test_empty_source_is_invalid() {
        let result = WorkItem::new("blank", Some(Source::text("   ")), None, Some(&RepeatCompiler));
        assert!(matches!(result, Err(IpsError::InvalidAction { .. })));
    }

    #[test]
    fn test_text_source_needs_compiler() {
        let result = WorkItem::new("text", Some(Source::text("nop")), None, None);
        assert!(matches!(result, Err(IpsError::InvalidAction { .. })));

        let mut item =
            WorkItem::new("text", Some(Source::text("nop")), None, Some(&RepeatCompiler)).unwrap();
        assert!(item.is_batch_aware());
        item.call_times(3).unwrap();
    }

    #[test]
    fn test_compiler_rejection_is_invalid() {
        let result = WorkItem::new("bad", Some("launch()".into()), None, Some(&RepeatCompiler));
        match result {
            Err(IpsError::InvalidAction { reason, .. }) => assert!(reason.contains("launch()")),
            other => panic!("expected InvalidAction, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_failure_stops_loop() {
        let calls = Cell::new(0u32);
        let mut item = WorkItem::new(
            "flaky",
            None,
            Some(Action::try_simple(|| {
                calls.set(calls.get() + 1);
                if calls.get() == 3 { Err("boom") } else { Ok(()) }
            })),
            None,
        )
        .unwrap();

        let err = item.call_times(10).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(calls.get(), 3);
    }
}
