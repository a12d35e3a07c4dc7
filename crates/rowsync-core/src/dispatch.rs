//! Cross-thread dispatch to the presentation-owning thread.
//!
//! Change notifications and refetch completions can arrive on any thread, but
//! the presentation layer may only be mutated on the thread that owns it. A
//! [`Dispatcher`] is owned by that thread; any number of [`DispatchHandle`]s
//! can post messages to it from elsewhere.
//!
//! # How It Works
//!
//! 1. A producer (store subscriber, refetch worker) posts a message through
//!    its handle. Posting never blocks.
//!
//! 2. The owner thread drains the dispatcher when it is ready to apply work,
//!    typically once per event-loop turn.
//!
//! Messages are delivered in the order they were posted from any single
//! producer.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::error::DispatchError;
use crate::logging::targets;

/// The receiving side of a dispatch channel, owned by one thread.
pub struct Dispatcher<M> {
    sender: Sender<M>,
    receiver: Receiver<M>,
}

/// A cloneable, thread-safe handle for posting messages to a [`Dispatcher`].
pub struct DispatchHandle<M> {
    sender: Sender<M>,
}

impl<M> Clone for DispatchHandle<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<M: Send> DispatchHandle<M> {
    /// Post a message to the owner thread.
    ///
    /// Fails only when the dispatcher has been dropped.
    pub fn post(&self, message: M) -> Result<(), DispatchError> {
        self.sender.send(message).map_err(|_| {
            tracing::warn!(target: targets::DISPATCH, "dispatcher dropped, message discarded");
            DispatchError::Disconnected
        })
    }
}

impl<M: Send> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send> Dispatcher<M> {
    /// Create a new dispatcher with an unbounded queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Create a new handle for posting to this dispatcher.
    pub fn handle(&self) -> DispatchHandle<M> {
        DispatchHandle {
            sender: self.sender.clone(),
        }
    }

    /// Number of messages waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Take every message currently queued, in posting order.
    pub fn drain(&self) -> Vec<M> {
        let messages: Vec<M> = self.receiver.try_iter().collect();
        if !messages.is_empty() {
            tracing::trace!(target: targets::DISPATCH, count = messages.len(), "drained messages");
        }
        messages
    }

    /// Block until at least one message is available or the timeout elapses,
    /// then take everything queued.
    ///
    /// Returns an empty vector on timeout.
    pub fn drain_blocking(&self, timeout: Duration) -> Vec<M> {
        let deadline = Instant::now() + timeout;
        match self
            .receiver
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
        {
            Ok(first) => {
                let mut messages = vec![first];
                messages.extend(self.receiver.try_iter());
                messages
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }
}

static_assertions::assert_impl_all!(DispatchHandle<u32>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_post_and_drain_in_order() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();

        handle.post(1).unwrap();
        handle.post(2).unwrap();
        handle.post(3).unwrap();

        assert_eq!(dispatcher.pending(), 3);
        assert_eq!(dispatcher.drain(), vec![1, 2, 3]);
        assert!(dispatcher.drain().is_empty());
    }

    #[test]
    fn test_post_from_other_thread() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();

        thread::spawn(move || {
            for i in 0..10 {
                handle.post(i).unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(dispatcher.drain(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_drain_blocking_waits_for_message() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.post("late").unwrap();
        });

        let messages = dispatcher.drain_blocking(Duration::from_secs(5));
        producer.join().unwrap();
        assert_eq!(messages, vec!["late"]);
    }

    #[test]
    fn test_drain_blocking_times_out() {
        let dispatcher = Dispatcher::<u8>::new();
        let messages = dispatcher.drain_blocking(Duration::from_millis(10));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_post_after_drop_fails() {
        let dispatcher = Dispatcher::<u8>::new();
        let handle = dispatcher.handle();
        drop(dispatcher);

        assert_eq!(handle.post(1), Err(DispatchError::Disconnected));
    }
}
