//! Thread affinity checks for presentation-owning objects.
//!
//! A presentation layer (a table view, a terminal list, a mirror used in
//! tests) is owned by exactly one thread. Change notifications may be produced
//! elsewhere, but every mutation of the presentation must happen on the owner.
//! [`ThreadAffinity`] records the owner at construction and verifies it later.
//!
//! # Example
//!
//! ```
//! use rowsync_core::thread_check::ThreadAffinity;
//!
//! struct RowTable {
//!     affinity: ThreadAffinity,
//!     rows: std::cell::RefCell<Vec<String>>,
//! }
//!
//! impl RowTable {
//!     fn new() -> Self {
//!         Self {
//!             affinity: ThreadAffinity::current(),
//!             rows: std::cell::RefCell::new(Vec::new()),
//!         }
//!     }
//!
//!     fn push(&self, row: String) {
//!         self.affinity.debug_assert_same_thread();
//!         self.rows.borrow_mut().push(row);
//!     }
//! }
//!
//! RowTable::new().push("Flour".into());
//! ```

use std::thread::ThreadId;

/// Thread affinity tracker.
///
/// Records the thread on which an object was created and verifies that
/// subsequent operations occur on the same thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Create a new thread affinity tracker for the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the same thread as the affinity.
    ///
    /// This always runs (debug and release builds).
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message if called from a different thread.
    #[inline]
    pub fn assert_same_thread(&self) {
        if !self.is_same_thread() {
            self.panic_wrong_thread();
        }
    }

    /// Debug-only assertion that we are on the same thread.
    ///
    /// This is a no-op in release builds.
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            THREAD AFFINITY VIOLATION: presentation accessed from wrong thread\n\
            \n\
            Owner thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            Presentation updates must run on the owner thread. Post the work\n\
            through a Dispatcher and drain it on the owner instead.",
            self.thread_id
        )
    }
}
