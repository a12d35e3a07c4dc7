//! Per-item change notifications reported by a backing store.

use std::fmt;

use super::Position;

/// The kind of change a store reports for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The record entered the result set.
    Insert,
    /// The record left the result set.
    Delete,
    /// The record changed position within the result set.
    Move,
    /// The record's content changed but its position did not.
    Update,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Update => "update",
        };
        f.write_str(name)
    }
}

/// One atomic change notification.
///
/// - Insert carries only `new_position` (post-transaction).
/// - Delete carries only `old_position` (pre-transaction).
/// - Move carries both.
/// - Update carries both; only `old_position` is consumed.
///
/// The fields are public because stores are external collaborators and may
/// report events with a position missing. Such events are rejected by the
/// [`DiffTranslator`](super::DiffTranslator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    /// What happened to the record.
    pub kind: ChangeKind,
    /// Position before the transaction.
    pub old_position: Option<Position>,
    /// Position after the transaction.
    pub new_position: Option<Position>,
}

impl ChangeEvent {
    /// A record was inserted at `new_position`.
    pub const fn insert(new_position: Position) -> Self {
        Self {
            kind: ChangeKind::Insert,
            old_position: None,
            new_position: Some(new_position),
        }
    }

    /// The record at `old_position` was deleted.
    pub const fn delete(old_position: Position) -> Self {
        Self {
            kind: ChangeKind::Delete,
            old_position: Some(old_position),
            new_position: None,
        }
    }

    /// The record at `old_position` moved to `new_position`.
    pub const fn moved(old_position: Position, new_position: Position) -> Self {
        Self {
            kind: ChangeKind::Move,
            old_position: Some(old_position),
            new_position: Some(new_position),
        }
    }

    /// The record at `old_position` changed in place.
    pub const fn update(old_position: Position, new_position: Position) -> Self {
        Self {
            kind: ChangeKind::Update,
            old_position: Some(old_position),
            new_position: Some(new_position),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(old) = self.old_position {
            write!(f, " from {old}")?;
        }
        if let Some(new) = self.new_position {
            write!(f, " to {new}")?;
        }
        Ok(())
    }
}
