//! The presentation layer interface and the rows it pulls.

use super::{Position, ResultItem, ResultSet};

/// A row as the presentation sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Row<T> {
    /// A record from the backing result set.
    Item(ResultItem<T>),
    /// The synthetic "add new item" row.
    Affordance,
}

impl<T> Row<T> {
    /// The backing record, if this is not the affordance row.
    pub fn item(&self) -> Option<&ResultItem<T>> {
        match self {
            Self::Item(item) => Some(item),
            Self::Affordance => None,
        }
    }

    /// True for the synthetic row.
    pub fn is_affordance(&self) -> bool {
        matches!(self, Self::Affordance)
    }
}

/// Read access to the rows a presentation should display.
pub trait RowSource<T> {
    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of rows in `section`.
    fn row_count(&self, section: usize) -> usize;

    /// The row at `position`, or `None` if out of range.
    fn row_at(&self, position: Position) -> Option<Row<T>>;
}

/// A rendering target that can apply row operations.
///
/// Inside an update scope, delete positions refer to the list as it was when
/// the scope opened and insert positions to the list as it will be when the
/// scope closes. Deletes are always issued before inserts. Refresh positions
/// are post-scope positions.
pub trait PresentationLayer<T> {
    /// Discard all rows and rebuild from `rows`.
    fn reload_all(&mut self, rows: &dyn RowSource<T>);

    /// Open an update scope.
    fn begin_update_scope(&mut self);

    /// Close the update scope opened by [`begin_update_scope`](Self::begin_update_scope).
    fn end_update_scope(&mut self);

    /// Remove the rows at `positions` (ascending).
    fn delete_rows(&mut self, positions: &[Position]);

    /// Insert rows at `positions` (ascending), pulling content from `rows`.
    fn insert_rows(&mut self, positions: &[Position], rows: &dyn RowSource<T>);

    /// Reload the content of rows at `positions` without moving them.
    fn refresh_rows(&mut self, positions: &[Position], rows: &dyn RowSource<T>);

    /// Whether [`refresh_rows`](Self::refresh_rows) is meaningful.
    fn supports_in_place_refresh(&self) -> bool {
        false
    }
}

/// The rows of a result set, optionally followed by the affordance row.
#[derive(Debug)]
pub struct SnapshotRows<'a, T> {
    snapshot: &'a ResultSet<T>,
    affordance_visible: bool,
}

impl<'a, T> SnapshotRows<'a, T> {
    /// View `snapshot` with or without a trailing affordance row.
    pub fn new(snapshot: &'a ResultSet<T>, affordance_visible: bool) -> Self {
        Self {
            snapshot,
            affordance_visible,
        }
    }
}

impl<T: Clone> RowSource<T> for SnapshotRows<'_, T> {
    fn section_count(&self) -> usize {
        1
    }

    fn row_count(&self, section: usize) -> usize {
        if section != 0 {
            return 0;
        }
        self.snapshot.len() + usize::from(self.affordance_visible)
    }

    fn row_at(&self, position: Position) -> Option<Row<T>> {
        if position.section != 0 {
            return None;
        }
        match self.snapshot.get(position.row) {
            Some(item) => Some(Row::Item(item.clone())),
            None if self.affordance_visible && position.row == self.snapshot.len() => {
                Some(Row::Affordance)
            }
            None => None,
        }
    }
}
