//! Applying a batch to a presentation layer.

use rowsync_core::PerfSpan;
use rowsync_core::logging::span_names;

use super::{BatchSummary, ChangeBatch, Position, PresentationLayer, RowSource};

const TARGET: &str = "rowsync::applier";

/// Applies a [`ChangeBatch`] in one update pass.
///
/// Order inside the scope is fixed: all deletes, then all inserts, then
/// refreshes. A batch without deletes or inserts opens no scope; if it only
/// carries refreshes they are applied on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchApplier;

impl BatchApplier {
    /// Create an applier.
    pub fn new() -> Self {
        Self
    }

    /// Apply `batch` to `presentation`, pulling inserted and refreshed
    /// content from `rows` (the post-transaction rows).
    pub fn apply<T, P>(
        &self,
        batch: &ChangeBatch,
        presentation: &mut P,
        rows: &dyn RowSource<T>,
    ) -> BatchSummary
    where
        P: PresentationLayer<T> + ?Sized,
    {
        let summary = batch.summary();
        if batch.is_empty() {
            return summary;
        }

        let _perf = PerfSpan::new(span_names::APPLY_BATCH);
        let refreshes: Vec<Position> = batch
            .refreshes()
            .filter_map(|old| batch.post_position(old))
            .collect();

        if !batch.is_structural() {
            tracing::debug!(target: TARGET, refreshed = refreshes.len(), "refreshing rows in place");
            presentation.refresh_rows(&refreshes, rows);
            return summary;
        }

        let deletes: Vec<Position> = batch.deletes().collect();
        let inserts: Vec<Position> = batch.inserts().collect();
        tracing::debug!(
            target: TARGET,
            deleted = deletes.len(),
            inserted = inserts.len(),
            refreshed = refreshes.len(),
            "applying batch"
        );

        presentation.begin_update_scope();
        if !deletes.is_empty() {
            presentation.delete_rows(&deletes);
        }
        if !inserts.is_empty() {
            presentation.insert_rows(&inserts, rows);
        }
        if !refreshes.is_empty() {
            presentation.refresh_rows(&refreshes, rows);
        }
        presentation.end_update_scope();

        summary
    }
}
