//! A headless presentation layer that mirrors rows in memory.

use rowsync_core::ThreadAffinity;

use super::{Position, PresentationLayer, RecordId, Row, RowSource};

const TARGET: &str = "rowsync::mirror";

/// One call received by a [`MirrorView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    /// Full reload with the given row count.
    Reload(usize),
    /// An update scope opened.
    BeginUpdates,
    /// An update scope closed.
    EndUpdates,
    /// Rows deleted.
    Delete(Vec<Position>),
    /// Rows inserted.
    Insert(Vec<Position>),
    /// Rows refreshed in place.
    Refresh(Vec<Position>),
}

/// A presentation layer that keeps a copy of section 0 and a log of every
/// operation it receives.
///
/// Deletes are applied in descending order and inserts in ascending order,
/// which reproduces a table view's batch semantics. Operations outside an
/// update scope are applied immediately.
#[derive(Debug)]
pub struct MirrorView<T> {
    rows: Vec<Row<T>>,
    ops: Vec<ViewOp>,
    scope_depth: usize,
    update_passes: usize,
    reloads: usize,
    in_place_refresh: bool,
    affinity: ThreadAffinity,
}

impl<T: Clone> Default for MirrorView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MirrorView<T> {
    /// Create an empty mirror bound to the current thread.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            ops: Vec::new(),
            scope_depth: 0,
            update_passes: 0,
            reloads: 0,
            in_place_refresh: false,
            affinity: ThreadAffinity::current(),
        }
    }

    /// Advertise in-place refresh support.
    pub fn with_in_place_refresh(mut self, enabled: bool) -> Self {
        self.in_place_refresh = enabled;
        self
    }

    /// Rows currently displayed.
    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    /// Number of rows displayed, including the affordance row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the displayed records, in order, skipping the affordance row.
    pub fn values(&self) -> Vec<&T> {
        self.rows
            .iter()
            .filter_map(|row| row.item().map(|item| item.value()))
            .collect()
    }

    /// Identities of the displayed records, in order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.rows
            .iter()
            .filter_map(|row| row.item().map(|item| item.id()))
            .collect()
    }

    /// Row index of the affordance row, if displayed.
    pub fn affordance_row(&self) -> Option<usize> {
        self.rows.iter().position(Row::is_affordance)
    }

    /// Operation log since creation or the last [`clear_ops`](Self::clear_ops).
    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    /// Clear the operation log.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of completed update scopes.
    pub fn update_passes(&self) -> usize {
        self.update_passes
    }

    /// Number of full reloads.
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// True while an update scope is open.
    pub fn in_update_scope(&self) -> bool {
        self.scope_depth > 0
    }

    fn section_zero(positions: &[Position]) -> impl Iterator<Item = usize> + '_ {
        positions.iter().filter_map(|position| {
            if position.section == 0 {
                Some(position.row)
            } else {
                tracing::warn!(target: TARGET, %position, "mirror only displays section 0");
                None
            }
        })
    }
}

impl<T: Clone> PresentationLayer<T> for MirrorView<T> {
    fn reload_all(&mut self, rows: &dyn RowSource<T>) {
        self.affinity.debug_assert_same_thread();
        let count = rows.row_count(0);
        self.rows = (0..count)
            .filter_map(|row| rows.row_at(Position::row(row)))
            .collect();
        self.reloads += 1;
        self.ops.push(ViewOp::Reload(self.rows.len()));
    }

    fn begin_update_scope(&mut self) {
        self.affinity.debug_assert_same_thread();
        self.scope_depth += 1;
        self.ops.push(ViewOp::BeginUpdates);
    }

    fn end_update_scope(&mut self) {
        self.affinity.debug_assert_same_thread();
        match self.scope_depth {
            0 => tracing::warn!(target: TARGET, "end_update_scope without a matching begin"),
            1 => {
                self.scope_depth = 0;
                self.update_passes += 1;
            }
            _ => self.scope_depth -= 1,
        }
        self.ops.push(ViewOp::EndUpdates);
    }

    fn delete_rows(&mut self, positions: &[Position]) {
        self.affinity.debug_assert_same_thread();
        let mut rows: Vec<usize> = Self::section_zero(positions).collect();
        rows.sort_unstable();
        rows.dedup();
        for row in rows.into_iter().rev() {
            if row < self.rows.len() {
                self.rows.remove(row);
            } else {
                tracing::warn!(target: TARGET, row, len = self.rows.len(), "delete out of range");
            }
        }
        self.ops.push(ViewOp::Delete(positions.to_vec()));
    }

    fn insert_rows(&mut self, positions: &[Position], rows: &dyn RowSource<T>) {
        self.affinity.debug_assert_same_thread();
        let mut targets: Vec<usize> = Self::section_zero(positions).collect();
        targets.sort_unstable();
        targets.dedup();
        for row in targets {
            match rows.row_at(Position::row(row)) {
                Some(content) if row <= self.rows.len() => self.rows.insert(row, content),
                Some(_) => {
                    tracing::warn!(target: TARGET, row, len = self.rows.len(), "insert out of range")
                }
                None => tracing::warn!(target: TARGET, row, "no content for inserted row"),
            }
        }
        self.ops.push(ViewOp::Insert(positions.to_vec()));
    }

    fn refresh_rows(&mut self, positions: &[Position], rows: &dyn RowSource<T>) {
        self.affinity.debug_assert_same_thread();
        for row in Self::section_zero(positions) {
            match (self.rows.get_mut(row), rows.row_at(Position::row(row))) {
                (Some(slot), Some(content)) => *slot = content,
                _ => tracing::warn!(target: TARGET, row, "refresh out of range"),
            }
        }
        self.ops.push(ViewOp::Refresh(positions.to_vec()));
    }

    fn supports_in_place_refresh(&self) -> bool {
        self.in_place_refresh
    }
}
