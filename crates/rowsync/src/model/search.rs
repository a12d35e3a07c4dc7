//! Filter state and refetch sequencing.

const TARGET: &str = "rowsync::search";

/// Whether the user is interacting with the filter input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// Not filtering; the list is unfiltered and live-diffed.
    #[default]
    Idle,
    /// The filter input has focus.
    Filtering,
}

/// A request to re-run the store query under `predicate`.
///
/// Only the ticket with the latest generation is ever applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefetchTicket<P> {
    /// Monotonic request number.
    pub generation: u64,
    /// The predicate to query with; `None` is unfiltered.
    pub predicate: Option<P>,
}

/// Owns the active filter predicate and decides when a full refetch is due.
///
/// Every predicate change issues a [`RefetchTicket`]. Completions are
/// accepted only for the most recently issued generation, so a slow query
/// for an intermediate filter string can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct SearchController<P> {
    state: SearchState,
    predicate: Option<P>,
    text: String,
    latest_generation: u64,
    settled_generation: u64,
}

impl<P> Default for SearchController<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SearchController<P> {
    /// Create an idle, unfiltered controller.
    pub fn new() -> Self {
        Self {
            state: SearchState::Idle,
            predicate: None,
            text: String::new(),
            latest_generation: 0,
            settled_generation: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// True while filtering.
    pub fn is_filtering(&self) -> bool {
        self.state == SearchState::Filtering
    }

    /// The active predicate.
    pub fn predicate(&self) -> Option<&P> {
        self.predicate.as_ref()
    }

    /// The last filter text received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The generation of the newest ticket issued.
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// True while the newest ticket has not completed.
    pub fn is_refetch_pending(&self) -> bool {
        self.settled_generation < self.latest_generation
    }

    /// `Idle → Filtering`.
    ///
    /// Returns `true` if the state changed, in which case the caller
    /// suppresses the synthetic row. The predicate is untouched.
    pub fn begin_interaction(&mut self) -> bool {
        if self.is_filtering() {
            return false;
        }
        tracing::debug!(target: TARGET, "filter interaction began");
        self.state = SearchState::Filtering;
        true
    }

    /// `Filtering → Idle`: clears the predicate and requests an unfiltered
    /// refetch.
    ///
    /// Returns `None` when already idle.
    pub fn end_interaction(&mut self) -> Option<RefetchTicket<P>>
    where
        P: Clone,
    {
        if !self.is_filtering() {
            return None;
        }
        tracing::debug!(target: TARGET, "filter interaction ended");
        self.state = SearchState::Idle;
        self.text.clear();
        self.predicate = None;
        Some(self.issue())
    }

    /// Handle new filter text.
    ///
    /// Empty text clears the predicate; otherwise `predicate_for` builds one.
    /// Text received while idle, or for which no predicate can be built, is
    /// ignored.
    pub fn update_text<F>(&mut self, text: &str, predicate_for: F) -> Option<RefetchTicket<P>>
    where
        P: Clone,
        F: FnOnce(&str) -> Option<P>,
    {
        if !self.is_filtering() {
            tracing::warn!(target: TARGET, text, "filter text changed outside a filter interaction");
            return None;
        }

        let predicate = if text.is_empty() {
            None
        } else {
            let Some(predicate) = predicate_for(text) else {
                tracing::warn!(target: TARGET, text, "no predicate available for filter text");
                return None;
            };
            Some(predicate)
        };

        self.text = text.to_owned();
        self.predicate = predicate;
        Some(self.issue())
    }

    /// Clear the filter text and predicate in any state.
    pub fn clear(&mut self) -> RefetchTicket<P>
    where
        P: Clone,
    {
        self.text.clear();
        self.predicate = None;
        self.issue()
    }

    /// Request a refetch with the current predicate.
    pub fn issue(&mut self) -> RefetchTicket<P>
    where
        P: Clone,
    {
        self.latest_generation += 1;
        tracing::trace!(
            target: TARGET,
            generation = self.latest_generation,
            filtered = self.predicate.is_some(),
            "refetch requested"
        );
        RefetchTicket {
            generation: self.latest_generation,
            predicate: self.predicate.clone(),
        }
    }

    /// Settle a completed refetch.
    ///
    /// Returns `true` if `generation` is the newest issued, in which case the
    /// caller applies its outcome. Older generations are stale and must be
    /// discarded.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation != self.latest_generation {
            return false;
        }
        self.settled_generation = generation;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(text: &str) -> Option<String> {
        Some(format!("name CONTAINS[cd] {text:?}"))
    }

    #[test]
    fn test_begin_and_end_interaction() {
        let mut search = SearchController::<String>::new();
        assert!(search.begin_interaction());
        assert!(!search.begin_interaction());
        assert!(search.is_filtering());

        let ticket = search.end_interaction().unwrap();
        assert_eq!(ticket.predicate, None);
        assert_eq!(search.state(), SearchState::Idle);
        assert!(search.end_interaction().is_none());
    }

    #[test]
    fn test_text_sets_and_clears_predicate() {
        let mut search = SearchController::new();
        search.begin_interaction();

        let ticket = search.update_text("flo", contains).unwrap();
        assert_eq!(ticket.predicate.as_deref(), Some("name CONTAINS[cd] \"flo\""));
        assert_eq!(search.text(), "flo");

        let ticket = search.update_text("", contains).unwrap();
        assert_eq!(ticket.predicate, None);
        assert_eq!(search.predicate(), None);
    }

    #[test]
    fn test_text_while_idle_is_ignored() {
        let mut search = SearchController::new();
        assert!(search.update_text("x", contains).is_none());
        assert_eq!(search.latest_generation(), 0);
    }

    #[test]
    fn test_only_latest_generation_is_accepted() {
        let mut search = SearchController::new();
        search.begin_interaction();
        let first = search.update_text("x", contains).unwrap();
        let second = search.update_text("", contains).unwrap();
        assert!(search.is_refetch_pending());

        assert!(!search.accept(first.generation));
        assert!(search.is_refetch_pending());
        assert!(search.accept(second.generation));
        assert!(!search.is_refetch_pending());
    }

    #[test]
    fn test_text_without_predicate_is_ignored() {
        let mut search = SearchController::<String>::new();
        search.begin_interaction();
        assert!(search.update_text("x", |_| None).is_none());
        assert_eq!(search.text(), "");
        assert!(search.update_text("", |_| None).is_some());
    }

    #[test]
    fn test_clear_works_in_any_state() {
        let mut search = SearchController::<String>::new();
        let ticket = search.clear();
        assert_eq!(ticket.generation, 1);
        assert_eq!(search.state(), SearchState::Idle);
    }
}
