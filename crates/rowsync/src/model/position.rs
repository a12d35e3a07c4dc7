//! Addressing rows in a sectioned list.

use std::fmt;

/// A `(section, row)` address in a list.
///
/// Positions are plain coordinates. Whether one refers to the list before or
/// after a transaction depends on where it is used: delete and refresh
/// positions in a [`ChangeBatch`](super::ChangeBatch) are pre-transaction,
/// insert positions are post-transaction.
///
/// Ordering is section-major, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    /// Zero-based section index.
    pub section: usize,
    /// Zero-based row index within the section.
    pub row: usize,
}

impl Position {
    /// Create a position from a section and row.
    #[inline]
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }

    /// Create a position in section 0.
    #[inline]
    pub const fn row(row: usize) -> Self {
        Self { section: 0, row }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.section, self.row)
    }
}

impl From<(usize, usize)> for Position {
    fn from((section, row): (usize, usize)) -> Self {
        Self { section, row }
    }
}
