//! rowsync - keeps a presentation list in step with a live store query.
//!
//! A [`BackingStore`](model::BackingStore) reports each transaction as a run
//! of per-record change events. rowsync collects those events, translates
//! them into one batch of row deletes, inserts and refreshes, and applies the
//! batch to a [`PresentationLayer`](model::PresentationLayer) inside a single
//! update scope. On top of that it manages a trailing "add new item" row and
//! filter-driven refetches.
//!
//! The low-level pieces live in [`model`]; most hosts only need
//! [`ListController`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rowsync::prelude::*;
//!
//! struct Plain;
//!
//! impl RowDelegate<u32> for Plain {
//!     fn configure_row(&self, item: &ResultItem<u32>, cell: &mut RowCell) {
//!         cell.text = item.value().to_string();
//!     }
//! }
//!
//! fn main() -> rowsync::Result<()> {
//!     let store = Arc::new(MemoryStore::sorted_by_key(|n: &u32| *n));
//!     let mut list = ListController::builder(store.clone(), MirrorView::new(), Plain)
//!         .config(ListConfig::new("Number").affordance(false))
//!         .build()?;
//!
//!     store.transaction(|tx| {
//!         tx.insert(3);
//!         tx.insert(1);
//!         Ok(())
//!     })?;
//!     list.process_pending();
//!
//!     assert_eq!(list.presentation().values(), vec![&1, &3]);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod delegate;
mod error;
pub mod model;
pub mod prelude;

pub use config::{AffordanceConfig, ListConfig, RefetchConfig, RefetchMode, UpdateConfig};
pub use controller::{ListController, ListControllerBuilder, ListSignals, Selection};
pub use delegate::{
    Accessory, CrudDelegate, EditAction, EditActionKind, RowCell, RowDelegate, SearchDelegate,
    SelectionStyle,
};
pub use error::{ConfigError, Error, MalformedChangeEvent, MissingPosition, Result, StoreError};

pub use rowsync_core;
