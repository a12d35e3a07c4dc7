//! Buffering change events for one transaction.

use super::{ChangeBatch, ChangeEvent, DiffTranslator};

const TARGET: &str = "rowsync::collector";

/// Accumulates raw change events between a transaction's begin and end.
///
/// Events are buffered in arrival order without interpretation and handed
/// to the [`DiffTranslator`] when the transaction ends. Transactions do not
/// nest.
#[derive(Debug, Default)]
pub struct ChangeCollector {
    translator: DiffTranslator,
    buffer: Vec<ChangeEvent>,
    open: bool,
}

impl ChangeCollector {
    /// Create a collector that translates with `translator`.
    pub fn new(translator: DiffTranslator) -> Self {
        Self {
            translator,
            buffer: Vec::new(),
            open: false,
        }
    }

    /// The translator used at transaction end.
    pub fn translator(&self) -> &DiffTranslator {
        &self.translator
    }

    /// Whether a transaction is currently open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of events buffered so far.
    pub fn pending_events(&self) -> usize {
        self.buffer.len()
    }

    /// Start a transaction, discarding anything left from an unfinished one.
    pub fn begin_transaction(&mut self) {
        if !self.buffer.is_empty() {
            tracing::warn!(
                target: TARGET,
                discarded = self.buffer.len(),
                "discarding events of an unfinished transaction"
            );
            self.buffer.clear();
        }
        self.open = true;
    }

    /// Buffer one event.
    pub fn observe(&mut self, event: ChangeEvent) {
        if !self.open {
            tracing::debug!(target: TARGET, ?event, "event observed outside a transaction");
        }
        self.buffer.push(event);
    }

    /// Finish the transaction and return its batch.
    ///
    /// With no buffered events this returns an empty batch.
    pub fn end_transaction(&mut self) -> ChangeBatch {
        self.open = false;
        if self.buffer.is_empty() {
            return ChangeBatch::new();
        }

        let translation = self.translator.translate(&self.buffer);
        tracing::trace!(
            target: TARGET,
            events = self.buffer.len(),
            malformed = translation.malformed.len(),
            "transaction finished"
        );
        self.buffer.clear();
        translation.batch
    }
}
