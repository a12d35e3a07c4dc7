//! Core systems for rowsync.
//!
//! This crate provides the plumbing the list engine in `rowsync` is built on:
//!
//! - **Signal/Slot System**: Type-safe change notification between a backing
//!   store, the engine and its host
//! - **Dispatch**: Marshalling work from notifying threads to the thread that
//!   owns the presentation layer
//! - **Worker**: A dedicated background thread for blocking store queries
//! - **Thread Affinity**: Debug assertions that presentation mutations stay on
//!   their owner thread
//! - **Logging**: `tracing` targets, span names and perf spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use rowsync_core::Signal;
//!
//! let count_changed = Signal::<usize>::new();
//!
//! let conn_id = count_changed.connect(|count| {
//!     println!("Row count is now {}", count);
//! });
//!
//! count_changed.emit(3);
//! count_changed.disconnect(conn_id);
//! ```
//!
//! # Dispatch Example
//!
//! ```
//! use rowsync_core::Dispatcher;
//!
//! let dispatcher = Dispatcher::<u32>::new();
//! let handle = dispatcher.handle();
//!
//! std::thread::spawn(move || {
//!     let _ = handle.post(7);
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(dispatcher.drain(), vec![7]);
//! ```

pub mod dispatch;
mod error;
pub mod logging;
pub mod signal;
pub mod thread_check;
pub mod worker;

pub use dispatch::{DispatchHandle, Dispatcher};
pub use error::{DispatchError, WorkerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
pub use worker::{Worker, WorkerBuilder};
