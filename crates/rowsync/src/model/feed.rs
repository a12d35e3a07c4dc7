//! Driving a [`ChangeCollector`] from store notifications.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rowsync_core::{ConnectionId, DispatchHandle};

use crate::error::StoreError;

use super::{BackingStore, ChangeBatch, ChangeCollector, DiffTranslator, ResultSet, StoreEvent};

const TARGET: &str = "rowsync::collector";

/// Work posted to the thread that owns the presentation.
#[derive(Debug)]
pub enum ControllerMessage<T> {
    /// A finished transaction and the result set it produced.
    Batch {
        /// The translated operations.
        batch: ChangeBatch,
        /// The post-transaction result set.
        snapshot: ResultSet<T>,
    },
    /// A refetch completed.
    Refetched {
        /// The generation of the ticket that was executed.
        generation: u64,
        /// The query outcome.
        result: Result<ResultSet<T>, StoreError>,
    },
}

/// A store subscription that turns each transaction into one
/// [`ControllerMessage::Batch`].
///
/// Every transaction is posted, including those that translate to no row
/// operations, so the controller's snapshot never falls behind the store's
/// revision. The collector runs on whichever thread the store notifies from; only the
/// finished batch crosses to the owner thread. Dropping the feed disconnects
/// it from the store.
pub struct ChangeFeed<S: BackingStore> {
    store: Weak<S>,
    connection: ConnectionId,
}

impl<S: BackingStore> ChangeFeed<S> {
    /// Subscribe to `store` and post finished batches through `handle`.
    pub fn connect(
        store: &Arc<S>,
        translator: DiffTranslator,
        handle: DispatchHandle<ControllerMessage<S::Item>>,
    ) -> Self {
        let collector = Mutex::new(ChangeCollector::new(translator));
        let weak_store = Arc::downgrade(store);

        let connection = store.events().connect(move |event| match event {
            StoreEvent::ResultSetWillChange => collector.lock().begin_transaction(),
            StoreEvent::Changed(change) => collector.lock().observe(*change),
            StoreEvent::ResultSetDidChange => {
                let batch = collector.lock().end_transaction();
                if batch.is_empty() {
                    tracing::trace!(target: TARGET, "no row operations, posting snapshot only");
                }
                let Some(store) = weak_store.upgrade() else {
                    return;
                };
                let snapshot = store.current();
                if handle.post(ControllerMessage::Batch { batch, snapshot }).is_err() {
                    tracing::debug!(target: TARGET, "controller gone, batch dropped");
                }
            }
        });

        Self {
            store: Arc::downgrade(store),
            connection,
        }
    }
}

impl<S: BackingStore> Drop for ChangeFeed<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.events().disconnect(self.connection);
        }
    }
}
