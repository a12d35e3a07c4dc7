//! Prelude module for rowsync.
//!
//! ```
//! use rowsync::prelude::*;
//! ```
//!
//! This provides access to:
//! - The controller (`ListController`, `ListConfig`, `ListSignals`)
//! - Host delegates (`RowDelegate`, `CrudDelegate`, `SearchDelegate`)
//! - Store and presentation traits with their in-memory implementations

// ============================================================================
// Controller
// ============================================================================

pub use crate::config::{ListConfig, RefetchMode};
pub use crate::controller::{ListController, ListSignals, Selection};

// ============================================================================
// Delegates
// ============================================================================

pub use crate::delegate::{
    Accessory, CrudDelegate, EditAction, EditActionKind, RowCell, RowDelegate, SearchDelegate,
    SelectionStyle,
};

// ============================================================================
// Model
// ============================================================================

pub use crate::model::{
    BackingStore, BatchSummary, MemoryPredicate, MemoryStore, MirrorView, Position,
    PresentationLayer, RecordId, ResultItem, ResultSet, Row, RowSource, SearchState,
};

// ============================================================================
// Errors and core
// ============================================================================

pub use crate::error::{Error, StoreError};
pub use rowsync_core::Signal;
