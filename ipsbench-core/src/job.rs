//! Benchmark Job
//!
//! Ordered registry of work items handed to the engine. Registration order
//! is measurement order and report order.

use crate::action::{Action, Source, SourceCompiler, WorkItem};
use crate::error::{IpsError, UserError};

/// Work items to measure, plus the comparison flag
#[derive(Default)]
pub struct BenchmarkJob<'a> {
    items: Vec<WorkItem<'a>>,
    compare: bool,
    compiler: Option<Box<dyn SourceCompiler + 'a>>,
}

impl<'a> BenchmarkJob<'a> {
    /// Create an empty job
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `compiler` for items registered from plain source text
    pub fn with_compiler(mut self, compiler: impl SourceCompiler + 'a) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }

    /// Register a single-iteration closure
    pub fn report<T, F>(&mut self, label: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut() -> T + 'a,
    {
        self.push(label, Action::simple(f))
    }

    /// Register a fallible single-iteration closure
    pub fn try_report<T, E, F>(&mut self, label: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut() -> Result<T, E> + 'a,
        E: Into<UserError>,
    {
        self.push(label, Action::try_simple(f))
    }

    /// Register a closure that runs its work `n` times per call
    pub fn report_counted<F>(&mut self, label: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(u64) + 'a,
    {
        self.push(label, Action::counted(f))
    }

    /// Register a fallible closure that runs its work `n` times per call
    pub fn try_report_counted<E, F>(&mut self, label: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(u64) -> Result<(), E> + 'a,
        E: Into<UserError>,
    {
        self.push(label, Action::try_counted(f))
    }

    /// Register a source body
    pub fn report_source(
        &mut self,
        label: impl Into<String>,
        source: impl Into<Source<'a>>,
    ) -> Result<&mut Self, IpsError> {
        self.item(label, Some(source.into()), None)
    }

    /// Register an item from source text and/or a callable.
    ///
    /// Exactly one must be given; see [`WorkItem::new`].
    pub fn item(
        &mut self,
        label: impl Into<String>,
        source: Option<Source<'a>>,
        action: Option<Action<'a>>,
    ) -> Result<&mut Self, IpsError> {
        let item = WorkItem::new(label, source, action, self.compiler.as_deref())?;
        self.items.push(item);
        Ok(self)
    }

    fn push(&mut self, label: impl Into<String>, action: Action<'a>) -> &mut Self {
        let label = label.into();
        self.items.push(WorkItem::from_action(label, action));
        self
    }

    /// Ask for a relative-speed comparison once every item is measured
    pub fn compare(&mut self) -> &mut Self {
        self.compare = true;
        self
    }

    /// Whether [`BenchmarkJob::compare`] was called
    pub fn compare_requested(&self) -> bool {
        self.compare
    }

    /// Registered items in order
    pub fn items(&self) -> &[WorkItem<'a>] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [WorkItem<'a>] {
        &mut self.items
    }

    /// Labels in registration order
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(WorkItem::label).collect()
    }

    /// Keep only the items whose label satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.items.retain(|item| keep(item.label()));
    }

    /// Number of registered items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for BenchmarkJob<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkJob")
            .field("items", &self.items)
            .field("compare", &self.compare)
            .field("compiler", &self.compiler.is_some())
            .finish()
    }
}
