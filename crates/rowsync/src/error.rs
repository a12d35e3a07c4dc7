//! Error types for rowsync.

use std::fmt;
use std::path::PathBuf;

use rowsync_core::WorkerError;

use crate::model::{ChangeEvent, RecordId};

/// Result type alias for rowsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by rowsync.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The background refetch worker could not be started or used.
    #[error("Refetch worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Errors from loading or validating a [`ListConfig`](crate::ListConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read list config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed into a config.
    #[error("Invalid list config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized.
    #[error("Failed to serialize list config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field holds an unusable value.
    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a validation error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Errors reported by a [`BackingStore`](crate::model::BackingStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The query could not be executed.
    #[error("Query failed: {0}")]
    Query(String),

    /// A transaction referenced a record that does not exist.
    #[error("Unknown record {0:?}")]
    UnknownRecord(RecordId),
}

/// Which position a malformed change event is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPosition {
    /// The pre-transaction position.
    Old,
    /// The post-transaction position.
    New,
}

impl fmt::Display for MissingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// A change event that lacks a position its kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{} change event is missing its {missing} position", .event.kind)]
pub struct MalformedChangeEvent {
    /// The offending event.
    pub event: ChangeEvent,
    /// The position that was required but absent.
    pub missing: MissingPosition,
}
