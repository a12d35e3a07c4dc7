//! A dedicated background thread for blocking work.
//!
//! A [`Worker`] owns one thread and a bounded task queue. Tasks run
//! sequentially in submission order, which is what a store query needs: a
//! newer query is never overtaken by an older one on the worker itself.
//! Whether a completed result is still wanted is decided by the receiver.
//!
//! # Example
//!
//! ```
//! use rowsync_core::{Dispatcher, WorkerBuilder};
//!
//! let worker = WorkerBuilder::new().name("count").build::<usize>().unwrap();
//! let dispatcher = Dispatcher::new();
//! let handle = dispatcher.handle();
//!
//! worker
//!     .send_with_callback(|| 3, move |count| {
//!         let _ = handle.post(count);
//!     })
//!     .unwrap();
//!
//! let counts = dispatcher.drain_blocking(std::time::Duration::from_secs(5));
//! assert_eq!(counts, vec![3]);
//! worker.stop_and_join();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::{Condvar, Mutex};

use crate::error::WorkerError;

/// Default capacity for the worker's task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

const TARGET: &str = crate::logging::targets::WORKER;

/// Builder for creating Workers.
#[derive(Debug)]
pub struct WorkerBuilder {
    name: String,
    queue_capacity: usize,
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self {
            name: "rowsync-worker".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the task queue capacity. Zero is raised to one.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Spawn the worker thread.
    pub fn build<T: Send + 'static>(self) -> Result<Worker<T>, WorkerError> {
        let (sender, receiver) = bounded(self.queue_capacity.max(1));
        let state = Arc::new(WorkerState::new());

        let thread_state = state.clone();
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                worker_loop(receiver, &thread_state);
                thread_state.running.store(false, Ordering::Release);
            })
            .map_err(|err| WorkerError::Spawn(err.to_string()))?;

        tracing::debug!(
            target: TARGET,
            name = %self.name,
            queue_capacity = self.queue_capacity,
            "worker started"
        );

        Ok(Worker {
            task_sender: sender,
            handle: Mutex::new(Some(handle)),
            state,
        })
    }
}

/// State shared between the Worker handle and the worker thread.
struct WorkerState {
    running: AtomicBool,
    pending_tasks: AtomicUsize,
    idle_condvar: Condvar,
    idle_mutex: Mutex<()>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            pending_tasks: AtomicUsize::new(0),
            idle_condvar: Condvar::new(),
            idle_mutex: Mutex::new(()),
        }
    }

    fn task_finished(&self) {
        if self.pending_tasks.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = self.idle_mutex.lock();
            self.idle_condvar.notify_all();
        }
    }
}

enum WorkerTask<T> {
    /// Run the task and hand the result to a callback on the worker thread.
    Execute {
        task: Box<dyn FnOnce() -> T + Send>,
        callback: Box<dyn FnOnce(T) + Send>,
    },
    Shutdown,
}

/// A dedicated worker thread with its own task queue.
///
/// Results are handed to a per-task callback on the worker thread. Reaching
/// another thread is done by posting to a [`crate::Dispatcher`] from inside
/// the callback.
pub struct Worker<T: Send + 'static> {
    task_sender: Sender<WorkerTask<T>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<WorkerState>,
}

impl<T: Send + 'static> Worker<T> {
    /// Check if the worker is still accepting tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Get the number of queued or executing tasks.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Send a task whose result is handed to `callback` on the worker thread.
    pub fn send_with_callback<F, C>(&self, task: F, callback: C) -> Result<(), WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.enqueue(WorkerTask::Execute {
            task: Box::new(task),
            callback: Box::new(callback),
        })
    }

    /// Request the worker to stop after processing remaining tasks.
    ///
    /// Non-blocking. New tasks are rejected from this point on.
    pub fn stop(&self) {
        if self.state.running.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: TARGET, "worker stop requested");
        }
        let _ = self.task_sender.try_send(WorkerTask::Shutdown);
    }

    /// Wait for the worker thread to finish.
    ///
    /// Returns `true` if the worker was joined successfully, `false` if
    /// already joined or the thread panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }

    /// Block until no task is queued or executing, or the timeout elapses.
    ///
    /// Returns `true` if the worker went idle within the timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let mut guard = self.state.idle_mutex.lock();
        if self.pending_tasks() == 0 {
            return true;
        }
        let result = self
            .state
            .idle_condvar
            .wait_while_for(&mut guard, |_| self.pending_tasks() > 0, timeout);
        !result.timed_out() || self.pending_tasks() == 0
    }

    fn enqueue(&self, task: WorkerTask<T>) -> Result<(), WorkerError> {
        if !self.is_running() {
            return Err(WorkerError::Stopped);
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);

        match self.task_sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.state.task_finished();
                tracing::warn!(target: TARGET, "worker queue full, task rejected");
                Err(WorkerError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.state.task_finished();
                Err(WorkerError::Stopped)
            }
        }
    }
}

impl<T: Send + 'static> Drop for Worker<T> {
    fn drop(&mut self) {
        // Request shutdown only; dropping must not block.
        self.stop();
    }
}

static_assertions::assert_impl_all!(Worker<u32>: Send, Sync);

fn run_task<T>(task: WorkerTask<T>, state: &WorkerState) {
    if let WorkerTask::Execute { task, callback } = task {
        callback(task());
        state.task_finished();
    }
}

fn worker_loop<T>(receiver: Receiver<WorkerTask<T>>, state: &WorkerState) {
    loop {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerTask::Shutdown) => {
                // Drain what was queued before the stop request.
                while let Ok(task) = receiver.try_recv() {
                    run_task(task, state);
                }
                break;
            }
            Ok(task) => run_task(task, state),
            Err(RecvTimeoutError::Timeout) => {
                if !state.running.load(Ordering::Acquire)
                    && state.pending_tasks.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!(target: TARGET, "worker loop exited");
}
