//! Shared fixtures for the rowsync integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rowsync::prelude::*;
use rowsync::model::StoreEvent;

/// Install a test-friendly subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A store of names ordered alphabetically.
pub fn name_store(names: &[&str]) -> Arc<MemoryStore<String>> {
    let store = Arc::new(MemoryStore::new(|a: &String, b: &String| a.cmp(b)));
    store
        .transaction(|tx| {
            for name in names {
                tx.insert((*name).to_string());
            }
            Ok(())
        })
        .unwrap();
    store
}

/// Case-insensitive substring predicate.
pub fn contains(text: &str) -> MemoryPredicate<String> {
    let needle = text.to_lowercase();
    MemoryPredicate::new(format!("name contains {needle:?}"), move |name: &String| {
        name.to_lowercase().contains(&needle)
    })
}

/// Row delegate that displays names and records host callbacks.
#[derive(Clone, Default)]
pub struct Names {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RowDelegate<String> for Names {
    fn configure_row(&self, item: &ResultItem<String>, cell: &mut RowCell) {
        cell.text = item.value().clone();
        cell.accessory = Accessory::DisclosureIndicator;
    }

    fn on_select(&self, item: &ResultItem<String>) {
        self.calls.lock().push(format!("select {}", item.value()));
    }

    fn can_edit(&self, _item: &ResultItem<String>) -> bool {
        true
    }

    fn edit_actions_for(&self, _item: &ResultItem<String>) -> Vec<EditAction> {
        vec![EditAction::update(), EditAction::delete()]
    }
}

impl CrudDelegate<String> for Names {
    fn wants_to_create(&self) {
        self.calls.lock().push("create".to_string());
    }

    fn wants_to_update(&self, item: &ResultItem<String>) {
        self.calls.lock().push(format!("update {}", item.value()));
    }

    fn wants_to_delete(&self, item: &ResultItem<String>) {
        self.calls.lock().push(format!("delete {}", item.value()));
    }
}

/// Collect every emission of `signal`.
pub fn record<A: Clone + Send + 'static>(signal: &Signal<A>) -> Arc<Mutex<Vec<A>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    signal.connect(move |args: &A| sink.lock().push(args.clone()));
    seen
}

/// A store whose queries can be made to fail.
pub struct FlakyStore {
    pub inner: MemoryStore<String>,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(names: &[&str]) -> Arc<Self> {
        let inner = MemoryStore::new(|a: &String, b: &String| a.cmp(b));
        inner
            .transaction(|tx| {
                for name in names {
                    tx.insert((*name).to_string());
                }
                Ok(())
            })
            .unwrap();
        Arc::new(Self {
            inner,
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl BackingStore for FlakyStore {
    type Item = String;
    type Predicate = MemoryPredicate<String>;

    fn run_query(
        &self,
        predicate: Option<&Self::Predicate>,
    ) -> Result<ResultSet<String>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Query("connection lost".to_string()));
        }
        self.inner.run_query(predicate)
    }

    fn current(&self) -> ResultSet<String> {
        self.inner.current()
    }

    fn events(&self) -> &Signal<StoreEvent> {
        self.inner.events()
    }
}

/// Values of a result set, in order.
pub fn values(snapshot: &ResultSet<String>) -> Vec<&String> {
    snapshot.iter().map(ResultItem::value).collect()
}
