//! The normalized batch produced for one store transaction.

use std::collections::BTreeSet;

use super::Position;

/// Structural operations accumulated for exactly one transaction.
///
/// Delete and refresh positions are against the pre-transaction list;
/// insert positions are against the post-transaction list. All three sets are
/// ordered ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    deletes: BTreeSet<Position>,
    inserts: BTreeSet<Position>,
    refreshes: BTreeSet<Position>,
}

/// Operation counts for an applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows deleted.
    pub deleted: usize,
    /// Rows inserted.
    pub inserted: usize,
    /// Rows refreshed in place.
    pub refreshed: usize,
}

impl BatchSummary {
    /// Whether the batch changed the number of rows or their order.
    pub fn is_structural(&self) -> bool {
        self.deleted > 0 || self.inserted > 0
    }
}

impl ChangeBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pre-transaction position to delete.
    pub fn delete(&mut self, position: Position) {
        self.deletes.insert(position);
    }

    /// Record a post-transaction position to insert.
    pub fn insert(&mut self, position: Position) {
        self.inserts.insert(position);
    }

    /// Record a pre-transaction position to refresh in place.
    pub fn refresh(&mut self, position: Position) {
        self.refreshes.insert(position);
    }

    /// Delete positions, ascending.
    pub fn deletes(&self) -> impl DoubleEndedIterator<Item = Position> + '_ {
        self.deletes.iter().copied()
    }

    /// Insert positions, ascending.
    pub fn inserts(&self) -> impl DoubleEndedIterator<Item = Position> + '_ {
        self.inserts.iter().copied()
    }

    /// Refresh positions (pre-transaction), ascending.
    pub fn refreshes(&self) -> impl DoubleEndedIterator<Item = Position> + '_ {
        self.refreshes.iter().copied()
    }

    /// True when the batch carries no operation at all.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty() && self.refreshes.is_empty()
    }

    /// True when the batch has at least one delete or insert.
    pub fn is_structural(&self) -> bool {
        !self.deletes.is_empty() || !self.inserts.is_empty()
    }

    /// Operation counts.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            deleted: self.deletes.len(),
            inserted: self.inserts.len(),
            refreshed: self.refreshes.len(),
        }
    }

    /// Map a pre-transaction position to where that row sits once the
    /// deletes and inserts of this batch have been applied.
    ///
    /// Returns `None` if the row itself is deleted.
    pub fn post_position(&self, old: Position) -> Option<Position> {
        if self.deletes.contains(&old) {
            return None;
        }

        let section_start = Position::new(old.section, 0);
        let section_end = Position::new(old.section, usize::MAX);

        let removed_before = self.deletes.range(section_start..old).count();
        let mut row = old.row - removed_before;

        for insert in self.inserts.range(section_start..=section_end) {
            if insert.row <= row {
                row += 1;
            } else {
                break;
            }
        }

        Some(Position::new(old.section, row))
    }
}
