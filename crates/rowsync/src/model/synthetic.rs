//! The trailing "add new item" row.

use super::{Position, PresentationLayer, RowSource};

const TARGET: &str = "rowsync::synthetic";

/// Tracks the visibility and position of the synthetic affordance row.
///
/// The row is visible iff the affordance is enabled and not suppressed by
/// search. When visible it always sits at `(0, real_row_count)`. It is never
/// part of a [`ChangeBatch`](super::ChangeBatch); it moves with the real rows
/// because it trails them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticRowController {
    affordance_enabled: bool,
    suppressed_by_search: bool,
    real_row_count: usize,
}

/// The presentation operations needed after a visibility change.
///
/// `removed` is computed under the old state and `inserted` under the new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntheticRowChange {
    /// Where the row was removed from, if it was visible before.
    pub removed: Option<Position>,
    /// Where the row was inserted, if it is visible now.
    pub inserted: Option<Position>,
}

impl SyntheticRowChange {
    /// True when the presentation does not need to change.
    pub fn is_noop(&self) -> bool {
        self.removed.is_none() && self.inserted.is_none()
    }

    /// Apply the change inside its own update scope.
    ///
    /// `rows` must already reflect the new visibility.
    pub fn apply<T, P>(&self, presentation: &mut P, rows: &dyn RowSource<T>)
    where
        P: PresentationLayer<T> + ?Sized,
    {
        if self.is_noop() {
            return;
        }

        presentation.begin_update_scope();
        if let Some(removed) = self.removed {
            presentation.delete_rows(&[removed]);
        }
        if let Some(inserted) = self.inserted {
            presentation.insert_rows(&[inserted], rows);
        }
        presentation.end_update_scope();
    }
}

impl SyntheticRowController {
    /// Create a controller for a list with `real_row_count` backed rows.
    pub fn new(affordance_enabled: bool, real_row_count: usize) -> Self {
        Self {
            affordance_enabled,
            suppressed_by_search: false,
            real_row_count,
        }
    }

    /// Whether the affordance is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.affordance_enabled
    }

    /// Whether search currently hides the row.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed_by_search
    }

    /// Whether the row is displayed.
    pub fn is_visible(&self) -> bool {
        self.affordance_enabled && !self.suppressed_by_search
    }

    /// Number of backed rows.
    pub fn real_row_count(&self) -> usize {
        self.real_row_count
    }

    /// The row's position, if visible.
    pub fn position(&self) -> Option<Position> {
        self.is_visible().then(|| Position::row(self.real_row_count))
    }

    /// True if `position` addresses the visible synthetic row.
    pub fn is_synthetic(&self, position: Position) -> bool {
        self.position() == Some(position)
    }

    /// Record the backed row count after a batch or reload.
    pub fn set_real_row_count(&mut self, count: usize) {
        self.real_row_count = count;
    }

    /// Change search suppression and return the operations to apply.
    pub fn set_suppressed(&mut self, suppressed: bool) -> SyntheticRowChange {
        let before = self.position();
        self.suppressed_by_search = suppressed;
        let after = self.position();

        if before == after {
            return SyntheticRowChange::default();
        }

        tracing::debug!(target: TARGET, suppressed, ?before, ?after, "affordance row visibility changed");
        SyntheticRowChange {
            removed: before,
            inserted: after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracks_real_rows() {
        let mut synthetic = SyntheticRowController::new(true, 3);
        assert_eq!(synthetic.position(), Some(Position::row(3)));

        synthetic.set_real_row_count(5);
        assert_eq!(synthetic.position(), Some(Position::row(5)));
        assert!(synthetic.is_synthetic(Position::row(5)));
        assert!(!synthetic.is_synthetic(Position::row(4)));
    }

    #[test]
    fn test_disabled_affordance_is_never_visible() {
        let mut synthetic = SyntheticRowController::new(false, 2);
        assert_eq!(synthetic.position(), None);
        assert!(synthetic.set_suppressed(true).is_noop());
        assert!(synthetic.set_suppressed(false).is_noop());
    }

    #[test]
    fn test_suppress_then_restore() {
        let mut synthetic = SyntheticRowController::new(true, 2);

        let hide = synthetic.set_suppressed(true);
        assert_eq!(hide.removed, Some(Position::row(2)));
        assert_eq!(hide.inserted, None);
        assert!(!synthetic.is_visible());

        let show = synthetic.set_suppressed(false);
        assert_eq!(show.removed, None);
        assert_eq!(show.inserted, Some(Position::row(2)));
    }

    #[test]
    fn test_repeated_suppression_is_noop() {
        let mut synthetic = SyntheticRowController::new(true, 0);
        assert!(!synthetic.set_suppressed(true).is_noop());
        assert!(synthetic.set_suppressed(true).is_noop());
    }
}
