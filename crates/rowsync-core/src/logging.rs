//! Logging facilities for rowsync.
//!
//! rowsync uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the host installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("rowsync=debug,rowsync_core=info")
//!     .init();
//! ```
//!
//! Every event is emitted under one of the [`targets`], so a filter can
//! isolate a single stage of the pipeline (for example
//! `rowsync::translator=warn` to see only malformed change events).

/// Span names used throughout rowsync for tracing.
pub mod span_names {
    /// Applying one translated batch to the presentation.
    pub const APPLY_BATCH: &str = "rowsync::apply_batch";
    /// Full reload of the presentation.
    pub const RELOAD: &str = "rowsync::reload";
    /// A store query issued for a filter change.
    pub const REFETCH: &str = "rowsync::refetch";
}

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "rowsync_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "rowsync_core::signal";
    /// Cross-thread dispatch target.
    pub const DISPATCH: &str = "rowsync_core::dispatch";
    /// Background worker target.
    pub const WORKER: &str = "rowsync_core::worker";
    /// Performance spans.
    pub const PERF: &str = "rowsync::perf";
}

/// A guard that keeps a tracing span entered until it is dropped.
///
/// Used to time an operation such as applying a batch.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
