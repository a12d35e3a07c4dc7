//! The host-facing list controller.
//!
//! [`ListController`] binds a [`BackingStore`] to a [`PresentationLayer`]. It
//! owns the current result snapshot, the synthetic affordance row and the
//! filter state, and it is the only place where the presentation is mutated.
//!
//! # Threading
//!
//! The controller lives on the thread that owns the presentation. Store
//! transactions may happen on any thread: their batches are queued and
//! applied when the host calls [`ListController::process_pending`], typically
//! once per event-loop turn.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rowsync::delegate::{RowCell, RowDelegate};
//! use rowsync::model::{MemoryStore, MirrorView, Position, ResultItem, Row};
//! use rowsync::{ListConfig, ListController};
//!
//! struct Names;
//!
//! impl RowDelegate<String> for Names {
//!     fn configure_row(&self, item: &ResultItem<String>, cell: &mut RowCell) {
//!         cell.text = item.value().clone();
//!     }
//! }
//!
//! let store = Arc::new(MemoryStore::<String>::new(|a, b| a.cmp(b)));
//! let mut list = ListController::builder(store.clone(), MirrorView::new(), Names)
//!     .config(ListConfig::new("Ingredient"))
//!     .build()
//!     .unwrap();
//!
//! store.transaction(|tx| Ok(tx.insert("Flour".to_string()))).unwrap();
//! list.process_pending();
//!
//! assert_eq!(list.row_count(0), 2);
//! assert_eq!(list.current_row(Position::row(1)), Some(Row::Affordance));
//! assert_eq!(
//!     list.cell_for_row(Position::row(1)).map(|cell| cell.text),
//!     Some("Create new Ingredient".to_string())
//! );
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use rowsync_core::logging::span_names;
use rowsync_core::{Dispatcher, PerfSpan, Signal, ThreadAffinity, Worker, WorkerBuilder};

use crate::config::{ListConfig, RefetchMode};
use crate::delegate::{
    Accessory, CrudDelegate, EditAction, EditActionKind, RowCell, RowDelegate, SearchDelegate,
    SelectionStyle,
};
use crate::error::{Result, StoreError};
use crate::model::{
    BackingStore, BatchApplier, BatchSummary, ChangeBatch, ChangeFeed, ControllerMessage,
    DiffTranslator, Position, PresentationLayer, RefetchTicket, ResultItem, ResultSet, Row,
    RowSource, SearchController, SearchState, SnapshotRows, SyntheticRowController,
};

const TARGET: &str = "rowsync::controller";

type RefetchResult<T> = std::result::Result<ResultSet<T>, StoreError>;

/// Signals emitted by a [`ListController`].
pub struct ListSignals {
    /// An incremental batch was applied.
    pub batch_applied: Signal<BatchSummary>,
    /// The presentation was fully reloaded. Args: row count including the
    /// affordance row.
    pub reloaded: Signal<usize>,
    /// The affordance row appeared (`true`) or disappeared (`false`).
    pub affordance_toggled: Signal<bool>,
    /// A refetch failed. Args: the error message.
    pub refetch_failed: Signal<String>,
    /// A refetch completed after a newer one was requested. Args: its
    /// generation.
    pub refetch_discarded: Signal<u64>,
}

impl Default for ListSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSignals {
    /// Create a signal set with no connections.
    pub fn new() -> Self {
        Self {
            batch_applied: Signal::new(),
            reloaded: Signal::new(),
            affordance_toggled: Signal::new(),
            refetch_failed: Signal::new(),
            refetch_discarded: Signal::new(),
        }
    }
}

/// What a call to [`ListController::select_row`] hit.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<T> {
    /// Nothing at that position.
    None,
    /// The affordance row; the CRUD delegate was asked to create a record.
    Affordance,
    /// A record; the row delegate was notified.
    Item(ResultItem<T>),
}

/// Builder for [`ListController`].
pub struct ListControllerBuilder<S: BackingStore, V> {
    store: Arc<S>,
    presentation: V,
    config: ListConfig,
    row_delegate: Box<dyn RowDelegate<S::Item>>,
    crud_delegate: Option<Box<dyn CrudDelegate<S::Item>>>,
    search_delegate: Option<Box<dyn SearchDelegate<S::Predicate>>>,
}

impl<S, V> ListControllerBuilder<S, V>
where
    S: BackingStore,
    V: PresentationLayer<S::Item>,
{
    /// Use `config` instead of the default.
    pub fn config(mut self, config: ListConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle create, update and delete requests.
    pub fn crud_delegate(mut self, delegate: impl CrudDelegate<S::Item> + 'static) -> Self {
        self.crud_delegate = Some(Box::new(delegate));
        self
    }

    /// Build filter predicates from search text.
    pub fn search_delegate(mut self, delegate: impl SearchDelegate<S::Predicate> + 'static) -> Self {
        self.search_delegate = Some(Box::new(delegate));
        self
    }

    /// Validate the config, run the initial query and load the presentation.
    pub fn build(self) -> Result<ListController<S, V>> {
        self.config.validate()?;

        let affordance_enabled =
            self.config.affordance.enabled && self.row_delegate.should_show_affordance_row();
        let in_place_refresh =
            self.config.updates.in_place_refresh && self.presentation.supports_in_place_refresh();

        let dispatcher = Dispatcher::new();
        let feed = ChangeFeed::connect(
            &self.store,
            DiffTranslator::new(in_place_refresh),
            dispatcher.handle(),
        );

        let worker = match self.config.refetch.mode {
            RefetchMode::Inline => None,
            RefetchMode::Background => Some(
                WorkerBuilder::new()
                    .name(self.config.refetch.thread_name.clone())
                    .queue_capacity(self.config.refetch.queue_capacity)
                    .build()?,
            ),
        };

        let snapshot = self.store.run_query(None)?;

        tracing::debug!(
            target: TARGET,
            entity = %self.config.entity_name,
            rows = snapshot.len(),
            affordance_enabled,
            in_place_refresh,
            mode = ?self.config.refetch.mode,
            "list bound"
        );

        let mut controller = ListController {
            synthetic: SyntheticRowController::new(affordance_enabled, snapshot.len()),
            snapshot,
            newest_dropped: None,
            search: SearchController::new(),
            applier: BatchApplier::new(),
            dispatcher,
            worker,
            _feed: feed,
            store: self.store,
            presentation: self.presentation,
            config: self.config,
            row_delegate: self.row_delegate,
            crud_delegate: self.crud_delegate,
            search_delegate: self.search_delegate,
            signals: ListSignals::new(),
            affinity: ThreadAffinity::current(),
        };
        controller.reload_presentation();
        Ok(controller)
    }
}

/// Keeps a presentation list in step with a live store query.
pub struct ListController<S: BackingStore, V> {
    store: Arc<S>,
    presentation: V,
    config: ListConfig,
    snapshot: ResultSet<S::Item>,
    newest_dropped: Option<ResultSet<S::Item>>,
    synthetic: SyntheticRowController,
    search: SearchController<S::Predicate>,
    applier: BatchApplier,
    dispatcher: Dispatcher<ControllerMessage<S::Item>>,
    worker: Option<Worker<RefetchResult<S::Item>>>,
    _feed: ChangeFeed<S>,
    row_delegate: Box<dyn RowDelegate<S::Item>>,
    crud_delegate: Option<Box<dyn CrudDelegate<S::Item>>>,
    search_delegate: Option<Box<dyn SearchDelegate<S::Predicate>>>,
    signals: ListSignals,
    affinity: ThreadAffinity,
}

impl<S, V> ListController<S, V>
where
    S: BackingStore,
    V: PresentationLayer<S::Item>,
{
    /// Start building a controller.
    pub fn builder(
        store: Arc<S>,
        presentation: V,
        row_delegate: impl RowDelegate<S::Item> + 'static,
    ) -> ListControllerBuilder<S, V> {
        ListControllerBuilder {
            store,
            presentation,
            config: ListConfig::default(),
            row_delegate: Box::new(row_delegate),
            crud_delegate: None,
            search_delegate: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The presentation layer.
    pub fn presentation(&self) -> &V {
        &self.presentation
    }

    /// Mutable access to the presentation layer.
    pub fn presentation_mut(&mut self) -> &mut V {
        &mut self.presentation
    }

    /// The configuration the controller was built with.
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// Signals for observing the controller.
    pub fn signals(&self) -> &ListSignals {
        &self.signals
    }

    /// The result set currently displayed.
    pub fn snapshot(&self) -> &ResultSet<S::Item> {
        &self.snapshot
    }

    /// Filter state.
    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    /// Last filter text received.
    ///
    /// After a failed refetch this is the text that failed, not the one the
    /// displayed rows were queried with.
    pub fn filter_text(&self) -> &str {
        self.search.text()
    }

    /// The active filter predicate.
    ///
    /// A failed refetch keeps its predicate active, so
    /// [`reload_data`](Self::reload_data) retries it.
    pub fn predicate(&self) -> Option<&S::Predicate> {
        self.search.predicate()
    }

    /// True while a refetch has been requested but not applied.
    pub fn is_refetch_pending(&self) -> bool {
        self.search.is_refetch_pending()
    }

    /// True while the affordance row is displayed.
    pub fn is_affordance_visible(&self) -> bool {
        self.synthetic.is_visible()
    }

    fn rows(&self) -> SnapshotRows<'_, S::Item> {
        SnapshotRows::new(&self.snapshot, self.synthetic.is_visible())
    }

    // -------------------------------------------------------------------------
    // Row presentation
    // -------------------------------------------------------------------------

    /// Number of sections. A query has exactly one.
    pub fn section_count(&self) -> usize {
        self.rows().section_count()
    }

    /// Number of rows in `section`, including the affordance row in section 0.
    pub fn row_count(&self, section: usize) -> usize {
        self.rows().row_count(section)
    }

    /// The row at `position`.
    pub fn current_row(&self, position: Position) -> Option<Row<S::Item>> {
        self.rows().row_at(position)
    }

    /// The display content for the row at `position`.
    pub fn cell_for_row(&self, position: Position) -> Option<RowCell> {
        match self.current_row(position)? {
            Row::Affordance => Some(RowCell {
                text: self.config.affordance_label(),
                detail: None,
                accessory: Accessory::Add,
                selection_style: SelectionStyle::None,
            }),
            Row::Item(item) => {
                let mut cell = RowCell::default();
                self.row_delegate.configure_row(&item, &mut cell);
                Some(cell)
            }
        }
    }

    /// Handle a tap on the row at `position`.
    pub fn select_row(&self, position: Position) -> Selection<S::Item> {
        match self.current_row(position) {
            Some(Row::Affordance) => {
                self.request_create();
                Selection::Affordance
            }
            Some(Row::Item(item)) => {
                self.row_delegate.on_select(&item);
                Selection::Item(item)
            }
            None => Selection::None,
        }
    }

    /// Whether the row at `position` offers edit actions.
    pub fn can_edit_row(&self, position: Position) -> bool {
        match self.current_row(position) {
            Some(Row::Item(item)) => self.row_delegate.can_edit(&item),
            _ => false,
        }
    }

    /// The edit actions for the row at `position`.
    ///
    /// `None` for the affordance row and for rows that cannot be edited.
    pub fn edit_actions_for_row(&self, position: Position) -> Option<Vec<EditAction>> {
        match self.current_row(position) {
            Some(Row::Item(item)) if self.row_delegate.can_edit(&item) => {
                Some(self.row_delegate.edit_actions_for(&item))
            }
            _ => None,
        }
    }

    /// Route an edit action on the row at `position` to the CRUD delegate.
    ///
    /// Returns `true` if a delegate method was called.
    pub fn perform_edit_action(&self, position: Position, action: &EditAction) -> bool {
        let Some(Row::Item(item)) = self.current_row(position) else {
            return false;
        };
        if !self.row_delegate.can_edit(&item) {
            return false;
        }
        let Some(crud) = self.crud_delegate.as_deref() else {
            tracing::warn!(target: TARGET, "edit action without a CRUD delegate");
            return false;
        };
        match &action.kind {
            EditActionKind::Update => crud.wants_to_update(&item),
            EditActionKind::Delete => crud.wants_to_delete(&item),
            EditActionKind::Custom(name) => {
                tracing::debug!(target: TARGET, action = %name, "custom edit action left to the host");
                return false;
            }
        }
        true
    }

    /// Ask the CRUD delegate to create a record.
    pub fn request_create(&self) {
        match self.crud_delegate.as_deref() {
            Some(crud) => crud.wants_to_create(),
            None => tracing::warn!(target: TARGET, "create requested without a CRUD delegate"),
        }
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// The filter input gained focus. Hides the affordance row.
    pub fn begin_filter_interaction(&mut self) {
        self.affinity.debug_assert_same_thread();
        if self.search.begin_interaction() {
            self.set_affordance_suppressed(true);
        }
    }

    /// The filter text changed.
    ///
    /// Empty text returns to the unfiltered result set. Ignored outside a
    /// filter interaction.
    pub fn update_filter_text(&mut self, text: &str) {
        self.affinity.debug_assert_same_thread();
        let delegate = self.search_delegate.as_deref();
        let ticket = self
            .search
            .update_text(text, |text| delegate.map(|d| d.predicate_for_search(text)));
        if let Some(ticket) = ticket {
            self.refetch(ticket);
        }
    }

    /// The clear button was pressed: drop the predicate and refetch.
    pub fn clear_filter_text(&mut self) {
        self.affinity.debug_assert_same_thread();
        let ticket = self.search.clear();
        self.refetch(ticket);
    }

    /// The filter input lost focus: drop the predicate, refetch, and show the
    /// affordance row again.
    pub fn end_filter_interaction(&mut self) {
        self.affinity.debug_assert_same_thread();
        if let Some(ticket) = self.search.end_interaction() {
            self.refetch(ticket);
            self.set_affordance_suppressed(false);
        }
    }

    fn set_affordance_suppressed(&mut self, suppressed: bool) {
        let change = self.synthetic.set_suppressed(suppressed);
        if change.is_noop() {
            return;
        }
        let rows = SnapshotRows::new(&self.snapshot, self.synthetic.is_visible());
        change.apply(&mut self.presentation, &rows);
        self.signals.affordance_toggled.emit(self.synthetic.is_visible());
    }

    // -------------------------------------------------------------------------
    // Reloading
    // -------------------------------------------------------------------------

    /// Re-run the query with the current predicate and reload.
    ///
    /// A failed query leaves the displayed rows untouched.
    pub fn reload_data(&mut self) {
        self.affinity.debug_assert_same_thread();
        let ticket = self.search.issue();
        self.refetch(ticket);
    }

    /// Reload the presentation from the current snapshot without querying.
    pub fn reload_presentation(&mut self) {
        self.affinity.debug_assert_same_thread();
        let _perf = PerfSpan::new(span_names::RELOAD);
        let rows = SnapshotRows::new(&self.snapshot, self.synthetic.is_visible());
        self.presentation.reload_all(&rows);
        let count = rows.row_count(0);
        tracing::debug!(target: TARGET, rows = count, revision = self.snapshot.revision(), "presentation reloaded");
        self.signals.reloaded.emit(count);
    }

    fn refetch(&mut self, ticket: RefetchTicket<S::Predicate>) {
        let RefetchTicket {
            generation,
            predicate,
        } = ticket;

        if let Some(worker) = &self.worker {
            let store = self.store.clone();
            let handle = self.dispatcher.handle();
            let query_predicate = predicate.clone();
            let sent = worker.send_with_callback(
                move || {
                    let _perf = PerfSpan::new(span_names::REFETCH);
                    store.run_query(query_predicate.as_ref())
                },
                move |result| {
                    if handle.post(ControllerMessage::Refetched { generation, result }).is_err() {
                        tracing::debug!(target: TARGET, generation, "controller gone, refetch dropped");
                    }
                },
            );
            match sent {
                Ok(()) => return,
                Err(err) => {
                    tracing::warn!(target: TARGET, %err, generation, "background refetch unavailable, querying inline");
                }
            }
        }

        let result = {
            let _perf = PerfSpan::new(span_names::REFETCH);
            self.store.run_query(predicate.as_ref())
        };
        self.complete_refetch(generation, result);
    }

    /// Apply the outcome of refetch `generation`.
    ///
    /// Stale generations are discarded. A failure is reported and leaves the
    /// displayed rows untouched; the predicate that failed stays active until
    /// the next [`reload_data`](Self::reload_data) or filter change.
    pub fn complete_refetch(&mut self, generation: u64, result: RefetchResult<S::Item>) {
        self.affinity.debug_assert_same_thread();
        if !self.search.accept(generation) {
            tracing::debug!(
                target: TARGET,
                generation,
                latest = self.search.latest_generation(),
                "discarding stale refetch"
            );
            self.signals.refetch_discarded.emit(generation);
            return;
        }

        let dropped = self.newest_dropped.take();
        match result {
            Ok(snapshot) => {
                let snapshot = match dropped {
                    Some(newer) if newer.revision() > snapshot.revision() => newer,
                    _ => snapshot,
                };
                self.install_snapshot(snapshot);
                self.reload_presentation();
            }
            Err(err) => {
                tracing::warn!(target: TARGET, %err, generation, "refetch failed, keeping current rows");
                self.signals.refetch_failed.emit(err.to_string());
                if let Some(newer) = dropped.filter(|newer| newer.revision() > self.snapshot.revision()) {
                    self.install_snapshot(newer);
                    self.reload_presentation();
                }
            }
        }
    }

    fn install_snapshot(&mut self, snapshot: ResultSet<S::Item>) {
        self.synthetic.set_real_row_count(snapshot.len());
        self.snapshot = snapshot;
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Apply every queued batch and refetch completion.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&mut self) -> usize {
        self.affinity.debug_assert_same_thread();
        let messages = self.dispatcher.drain();
        let count = messages.len();
        for message in messages {
            self.handle_message(message);
        }
        count
    }

    /// Block until no refetch is pending, applying messages as they arrive.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        self.affinity.debug_assert_same_thread();
        let deadline = Instant::now() + timeout;
        while self.search.is_refetch_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            for message in self.dispatcher.drain_blocking(remaining) {
                self.handle_message(message);
            }
        }
        true
    }

    fn handle_message(&mut self, message: ControllerMessage<S::Item>) {
        match message {
            ControllerMessage::Batch { batch, snapshot } => self.apply_batch(batch, snapshot),
            ControllerMessage::Refetched { generation, result } => {
                self.complete_refetch(generation, result)
            }
        }
    }

    fn apply_batch(&mut self, batch: ChangeBatch, snapshot: ResultSet<S::Item>) {
        if self.search.is_refetch_pending() {
            tracing::trace!(
                target: TARGET,
                revision = snapshot.revision(),
                "refetch pending, dropping batch"
            );
            let newer = self
                .newest_dropped
                .as_ref()
                .is_none_or(|kept| snapshot.revision() > kept.revision());
            if newer {
                self.newest_dropped = Some(snapshot);
            }
            return;
        }

        let base = self.snapshot.revision();
        if snapshot.revision() <= base {
            tracing::trace!(
                target: TARGET,
                revision = snapshot.revision(),
                base,
                "batch already reflected, skipping"
            );
            return;
        }
        if snapshot.revision() != base + 1 {
            tracing::warn!(
                target: TARGET,
                revision = snapshot.revision(),
                base,
                "batch does not follow the displayed result set, reloading"
            );
            self.install_snapshot(snapshot);
            self.reload_presentation();
            return;
        }

        self.install_snapshot(snapshot);
        if batch.is_empty() {
            tracing::trace!(
                target: TARGET,
                revision = self.snapshot.revision(),
                "no row operations, snapshot advanced"
            );
            return;
        }
        let rows = SnapshotRows::new(&self.snapshot, self.synthetic.is_visible());
        let summary = self.applier.apply(&batch, &mut self.presentation, &rows);
        tracing::debug!(
            target: TARGET,
            deleted = summary.deleted,
            inserted = summary.inserted,
            refreshed = summary.refreshed,
            "batch applied"
        );
        self.signals.batch_applied.emit(summary);
    }
}
