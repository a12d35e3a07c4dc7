//! Error types for rowsync core.

use std::fmt;

/// Dispatch-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The receiving side of the dispatcher has been dropped.
    Disconnected,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Dispatcher receiver has been dropped"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Worker-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker has been stopped and no longer accepts tasks.
    Stopped,
    /// The worker's task queue is full.
    QueueFull,
    /// The worker thread could not be spawned.
    Spawn(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Worker has been stopped"),
            Self::QueueFull => write!(f, "Worker task queue is full"),
            Self::Spawn(reason) => write!(f, "Failed to spawn worker thread: {reason}"),
        }
    }
}

impl std::error::Error for WorkerError {}
