//! The backing store interface.
//!
//! A backing store executes queries and reports, per transaction, which
//! records of the current result set were inserted, deleted, moved or
//! updated. rowsync never compares snapshots itself; it relies entirely on
//! these notifications.

use std::fmt;
use std::sync::Arc;

use rowsync_core::Signal;
use slotmap::new_key_type;

use crate::error::StoreError;

use super::ChangeEvent;

new_key_type! {
    /// Store-assigned identity of a record.
    pub struct RecordId;
}

/// One record of a result set: its identity plus its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem<T> {
    id: RecordId,
    value: T,
}

impl<T> ResultItem<T> {
    /// Create an item.
    pub fn new(id: RecordId, value: T) -> Self {
        Self { id, value }
    }

    /// The record's identity.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The record's value.
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// An immutable, cheaply cloned snapshot of a query result.
///
/// A result set has exactly one section. `revision` increases by one every
/// time the store's visible result set changes (a transaction that emits
/// events, or a new query), which lets consumers tell whether a snapshot
/// directly follows the one they hold.
pub struct ResultSet<T> {
    items: Arc<[ResultItem<T>]>,
    revision: u64,
}

impl<T> Clone for ResultSet<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            revision: self.revision,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResultSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("revision", &self.revision)
            .field("items", &self.items)
            .finish()
    }
}

impl<T> Default for ResultSet<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl<T> ResultSet<T> {
    /// Create a snapshot.
    pub fn new(items: Vec<ResultItem<T>>, revision: u64) -> Self {
        Self {
            items: items.into(),
            revision,
        }
    }

    /// The snapshot's revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The record at `row`.
    pub fn get(&self, row: usize) -> Option<&ResultItem<T>> {
        self.items.get(row)
    }

    /// Iterate records in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResultItem<T>> {
        self.items.iter()
    }

    /// Row of the record with identity `id`.
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// Notifications a store emits while its result set changes.
///
/// `ResultSetWillChange` and `ResultSetDidChange` bracket exactly one
/// transaction; every `Changed` in between belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// A transaction is about to report changes.
    ResultSetWillChange,
    /// One record changed.
    Changed(ChangeEvent),
    /// The transaction has reported all of its changes.
    ResultSetDidChange,
}

/// A live, ordered, queryable data source.
pub trait BackingStore: Send + Sync + 'static {
    /// The record type.
    type Item: Clone + Send + Sync + 'static;
    /// The store-level filter type.
    type Predicate: Clone + Send + Sync + fmt::Debug + 'static;

    /// Replace the active predicate and execute the query.
    ///
    /// `None` means unfiltered. On success the returned snapshot becomes the
    /// store's current result set and subsequent change events are relative
    /// to it.
    fn run_query(
        &self,
        predicate: Option<&Self::Predicate>,
    ) -> Result<ResultSet<Self::Item>, StoreError>;

    /// The current result set.
    fn current(&self) -> ResultSet<Self::Item>;

    /// The signal on which change notifications are emitted.
    fn events(&self) -> &Signal<StoreEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_result_set_lookup() {
        let mut ids = SlotMap::<RecordId, ()>::with_key();
        let a = ids.insert(());
        let b = ids.insert(());

        let set = ResultSet::new(vec![ResultItem::new(a, "A"), ResultItem::new(b, "B")], 7);
        assert_eq!(set.len(), 2);
        assert_eq!(set.revision(), 7);
        assert_eq!(set.get(1).map(|item| *item.value()), Some("B"));
        assert_eq!(set.position_of(a), Some(0));
        assert_eq!(set.get(2), None);

        let cloned = set.clone();
        assert_eq!(cloned.iter().map(ResultItem::id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_default_result_set_is_empty() {
        let set = ResultSet::<u8>::default();
        assert!(set.is_empty());
        assert_eq!(set.revision(), 0);
    }
}
