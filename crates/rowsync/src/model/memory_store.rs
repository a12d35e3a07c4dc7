//! An in-memory backing store.
//!
//! [`MemoryStore`] keeps records in a slot map, orders them with a
//! comparator and filters them with an optional [`MemoryPredicate`]. Each
//! [`transaction`](MemoryStore::transaction) reports its effect on the
//! visible result set as a bracketed run of [`StoreEvent`]s.
//!
//! # Example
//!
//! ```
//! use rowsync::model::{BackingStore, MemoryPredicate, MemoryStore, StoreEvent};
//!
//! let store = MemoryStore::<String>::new(|a, b| a.cmp(b));
//! store.events().connect(|event| {
//!     if let StoreEvent::Changed(change) = event {
//!         println!("{change}");
//!     }
//! });
//!
//! store
//!     .transaction(|tx| {
//!         tx.insert("Sugar".to_string());
//!         tx.insert("Flour".to_string());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let only_f = MemoryPredicate::new("starts with F", |name: &String| name.starts_with('F'));
//! let filtered = store.run_query(Some(&only_f)).unwrap();
//! assert_eq!(filtered.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use rowsync_core::Signal;
use slotmap::SlotMap;

use crate::error::StoreError;

use super::{BackingStore, ChangeEvent, Position, RecordId, ResultItem, ResultSet, StoreEvent};

const TARGET: &str = "rowsync::store";

type Compare<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A labelled record filter for [`MemoryStore`].
pub struct MemoryPredicate<T> {
    label: String,
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> MemoryPredicate<T> {
    /// Create a predicate. `label` is used for logging.
    pub fn new<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            test: Arc::new(test),
        }
    }

    /// The predicate's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluate the predicate.
    pub fn matches(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T> Clone for MemoryPredicate<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            test: self.test.clone(),
        }
    }
}

impl<T> fmt::Debug for MemoryPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemoryPredicate").field(&self.label).finish()
    }
}

/// Staged mutations of one [`MemoryStore::transaction`].
///
/// Changes become visible, and are reported, only if the closure returns
/// `Ok`.
pub struct Transaction<'a, T> {
    records: &'a mut SlotMap<RecordId, T>,
    modified: &'a mut HashSet<RecordId>,
}

impl<T> Transaction<'_, T> {
    /// Add a record.
    pub fn insert(&mut self, value: T) -> RecordId {
        self.records.insert(value)
    }

    /// Replace a record's value.
    pub fn update(&mut self, id: RecordId, value: T) -> Result<(), StoreError> {
        let slot = self.records.get_mut(id).ok_or(StoreError::UnknownRecord(id))?;
        *slot = value;
        self.modified.insert(id);
        Ok(())
    }

    /// Modify a record in place.
    pub fn modify<F>(&mut self, id: RecordId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut T),
    {
        let slot = self.records.get_mut(id).ok_or(StoreError::UnknownRecord(id))?;
        f(slot);
        self.modified.insert(id);
        Ok(())
    }

    /// Remove a record, returning its value.
    pub fn delete(&mut self, id: RecordId) -> Result<T, StoreError> {
        self.records.remove(id).ok_or(StoreError::UnknownRecord(id))
    }

    /// Read a record as staged so far.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.get(id)
    }
}

struct Inner<T> {
    records: SlotMap<RecordId, T>,
    predicate: Option<MemoryPredicate<T>>,
    current: ResultSet<T>,
}

/// An ordered, filterable in-memory store that reports per-transaction
/// changes.
///
/// Records are ordered by the comparator, with ties broken by record id.
/// Notifications are emitted after internal locks are released, so slots may
/// read the store. Emission is serialized: the `current()` snapshot seen by a
/// slot during a transaction's `ResultSetDidChange` is exactly that
/// transaction's result.
pub struct MemoryStore<T> {
    inner: Mutex<Inner<T>>,
    emit_lock: ReentrantMutex<()>,
    compare: Compare<T>,
    events: Signal<StoreEvent>,
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty store ordered by `compare`.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            inner: Mutex::new(Inner {
                records: SlotMap::with_key(),
                predicate: None,
                current: ResultSet::default(),
            }),
            emit_lock: ReentrantMutex::new(()),
            compare: Arc::new(compare),
            events: Signal::new(),
        }
    }

    /// Create an empty store ordered by a key.
    pub fn sorted_by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| key(a).cmp(&key(b)))
    }

    /// Total number of records, regardless of the predicate.
    pub fn record_count(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Read a record, regardless of the predicate.
    pub fn get(&self, id: RecordId) -> Option<T> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Label of the active predicate.
    pub fn predicate_label(&self) -> Option<String> {
        self.inner
            .lock()
            .predicate
            .as_ref()
            .map(|predicate| predicate.label().to_owned())
    }

    /// Run `f` against a staged copy of the records and commit it if `f`
    /// returns `Ok`.
    ///
    /// On commit, the effect on the visible result set is emitted as
    /// `ResultSetWillChange`, one `Changed` per affected record, then
    /// `ResultSetDidChange`. Nothing is emitted when the visible result set
    /// is unaffected.
    pub fn transaction<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Transaction<'_, T>) -> Result<R, StoreError>,
    {
        let _emitting = self.emit_lock.lock();

        let (result, events) = {
            let mut inner = self.inner.lock();
            let mut staged = inner.records.clone();
            let mut modified = HashSet::new();

            let result = f(&mut Transaction {
                records: &mut staged,
                modified: &mut modified,
            })?;

            let before = inner.current.clone();
            let after_ids = self.query_ids(&staged, inner.predicate.as_ref());
            let events = diff(&before, &after_ids, &modified);

            inner.records = staged;
            if !events.is_empty() {
                let revision = before.revision() + 1;
                inner.current = snapshot(&inner.records, &after_ids, revision);
            }
            (result, events)
        };

        if !events.is_empty() {
            tracing::debug!(target: TARGET, events = events.len(), "transaction committed");
            self.events.emit(StoreEvent::ResultSetWillChange);
            for event in events {
                self.events.emit(StoreEvent::Changed(event));
            }
            self.events.emit(StoreEvent::ResultSetDidChange);
        }

        Ok(result)
    }

    fn query_ids(
        &self,
        records: &SlotMap<RecordId, T>,
        predicate: Option<&MemoryPredicate<T>>,
    ) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = records
            .iter()
            .filter(|(_, value)| predicate.is_none_or(|predicate| predicate.matches(value)))
            .map(|(id, _)| id)
            .collect();
        ids.sort_by(|a, b| (self.compare)(&records[*a], &records[*b]).then_with(|| a.cmp(b)));
        ids
    }
}

fn snapshot<T: Clone>(
    records: &SlotMap<RecordId, T>,
    ids: &[RecordId],
    revision: u64,
) -> ResultSet<T> {
    let items = ids
        .iter()
        .map(|id| ResultItem::new(*id, records[*id].clone()))
        .collect();
    ResultSet::new(items, revision)
}

/// Describe the change from `before` to `after` as store events.
///
/// A survivor is reported as a move when the set of survivors preceding it
/// differs between the two orders; such rows are the only ones whose relative
/// order changed. Unmodified survivors that did not move report nothing.
fn diff<T>(
    before: &ResultSet<T>,
    after: &[RecordId],
    modified: &HashSet<RecordId>,
) -> Vec<ChangeEvent> {
    let old_rows: HashMap<RecordId, usize> = before
        .iter()
        .enumerate()
        .map(|(row, item)| (item.id(), row))
        .collect();
    let new_rows: HashMap<RecordId, usize> =
        after.iter().enumerate().map(|(row, id)| (*id, row)).collect();

    let mut events = Vec::new();

    for item in before.iter() {
        if !new_rows.contains_key(&item.id()) {
            events.push(ChangeEvent::delete(Position::row(old_rows[&item.id()])));
        }
    }

    let old_survivors: Vec<RecordId> = before
        .iter()
        .map(ResultItem::id)
        .filter(|id| new_rows.contains_key(id))
        .collect();
    let new_survivors: Vec<RecordId> = after
        .iter()
        .copied()
        .filter(|id| old_rows.contains_key(id))
        .collect();

    // balanced[i]: the first i survivors are the same set in both orders.
    let mut balanced = Vec::with_capacity(old_survivors.len() + 1);
    balanced.push(true);
    let mut unmatched = HashSet::new();
    for (old_id, new_id) in old_survivors.iter().zip(&new_survivors) {
        for id in [old_id, new_id] {
            if !unmatched.remove(id) {
                unmatched.insert(*id);
            }
        }
        balanced.push(unmatched.is_empty());
    }

    let new_survivor_index: HashMap<RecordId, usize> = new_survivors
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    for (index, id) in old_survivors.iter().enumerate() {
        let old = Position::row(old_rows[id]);
        let new = Position::row(new_rows[id]);
        let same_predecessors = new_survivor_index[id] == index && balanced[index];
        if !same_predecessors {
            events.push(ChangeEvent::moved(old, new));
        } else if modified.contains(id) {
            events.push(ChangeEvent::update(old, new));
        }
    }

    for (row, id) in after.iter().enumerate() {
        if !old_rows.contains_key(id) {
            events.push(ChangeEvent::insert(Position::row(row)));
        }
    }

    events
}

impl<T> BackingStore for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Predicate = MemoryPredicate<T>;

    fn run_query(&self, predicate: Option<&MemoryPredicate<T>>) -> Result<ResultSet<T>, StoreError> {
        let _emitting = self.emit_lock.lock();
        let mut inner = self.inner.lock();

        let ids = self.query_ids(&inner.records, predicate);
        let revision = inner.current.revision() + 1;
        inner.current = snapshot(&inner.records, &ids, revision);
        inner.predicate = predicate.cloned();

        tracing::debug!(
            target: TARGET,
            predicate = predicate.map(MemoryPredicate::label),
            rows = ids.len(),
            revision,
            "query executed"
        );
        Ok(inner.current.clone())
    }

    fn current(&self) -> ResultSet<T> {
        self.inner.lock().current.clone()
    }

    fn events(&self) -> &Signal<StoreEvent> {
        &self.events
    }
}

static_assertions::assert_impl_all!(MemoryStore<String>: Send, Sync);
