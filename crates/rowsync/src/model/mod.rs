//! The change-tracking model layer.
//!
//! This module turns the per-record notifications of a live result set into
//! batched row operations on a presentation list.
//!
//! # Core Types
//!
//! - `Position`: a `(section, row)` address
//! - `ChangeEvent`: one insert/delete/move/update reported by a store
//! - `ChangeBatch`: the deletes, inserts and refreshes of one transaction
//! - `BackingStore`: the store interface (`run_query`, `current`, `events`)
//! - `PresentationLayer` / `RowSource`: the rendering interface
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐  StoreEvent  ┌─────────────────┐  ChangeBatch  ┌──────────────┐
//! │ BackingStore │─────────────>│ ChangeCollector │──────────────>│ BatchApplier │
//! └──────────────┘              │ + DiffTranslator│               └──────┬───────┘
//!        ^                      └─────────────────┘                      │
//!        │ run_query                                                     v
//! ┌──────┴───────────┐                                       ┌───────────────────┐
//! │ SearchController │                                       │ PresentationLayer │
//! └──────────────────┘                                       └───────────────────┘
//!                       SyntheticRowController keeps the trailing
//!                       affordance row in step with both paths.
//! ```
//!
//! # Example
//!
//! ```
//! use rowsync::model::{
//!     BatchApplier, ChangeCollector, ChangeEvent, DiffTranslator, MirrorView, Position,
//!     PresentationLayer, ResultItem, ResultSet, SnapshotRows,
//! };
//!
//! # let mut ids = slotmap::SlotMap::<rowsync::model::RecordId, ()>::with_key();
//! # let (a, b, c, d) = (ids.insert(()), ids.insert(()), ids.insert(()), ids.insert(()));
//! let before = ResultSet::new(
//!     vec![ResultItem::new(a, "A"), ResultItem::new(b, "B"), ResultItem::new(c, "C")],
//!     1,
//! );
//! let after = ResultSet::new(
//!     vec![ResultItem::new(a, "A"), ResultItem::new(c, "C"), ResultItem::new(d, "D")],
//!     2,
//! );
//!
//! let mut view = MirrorView::new();
//! view.reload_all(&SnapshotRows::new(&before, false));
//!
//! let mut collector = ChangeCollector::new(DiffTranslator::new(false));
//! collector.begin_transaction();
//! collector.observe(ChangeEvent::delete(Position::row(1)));
//! collector.observe(ChangeEvent::insert(Position::row(2)));
//! let batch = collector.end_transaction();
//!
//! BatchApplier::new().apply(&batch, &mut view, &SnapshotRows::new(&after, false));
//! assert_eq!(view.values(), vec![&"A", &"C", &"D"]);
//! ```

mod applier;
mod batch;
mod collector;
mod event;
mod feed;
mod memory_store;
mod mirror;
mod position;
mod presentation;
mod search;
mod store;
mod synthetic;
mod translator;

pub use applier::BatchApplier;
pub use batch::{BatchSummary, ChangeBatch};
pub use collector::ChangeCollector;
pub use event::{ChangeEvent, ChangeKind};
pub use feed::{ChangeFeed, ControllerMessage};
pub use memory_store::{MemoryPredicate, MemoryStore, Transaction};
pub use mirror::{MirrorView, ViewOp};
pub use position::Position;
pub use presentation::{PresentationLayer, Row, RowSource, SnapshotRows};
pub use search::{RefetchTicket, SearchController, SearchState};
pub use store::{BackingStore, RecordId, ResultItem, ResultSet, StoreEvent};
pub use synthetic::{SyntheticRowChange, SyntheticRowController};
pub use translator::{DiffTranslator, Translation};
