//! Normalizing store events into the operations a presentation supports.

use crate::error::{MalformedChangeEvent, MissingPosition};

use super::{ChangeBatch, ChangeEvent, ChangeKind};

const TARGET: &str = "rowsync::translator";

/// The output of translating one transaction's events.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    /// The normalized batch.
    pub batch: ChangeBatch,
    /// Events that were dropped for lacking a required position.
    pub malformed: Vec<MalformedChangeEvent>,
}

/// Maps the store's change vocabulary onto delete/insert/refresh.
///
/// Moves are always decomposed into a delete of the old position and an
/// insert of the new one, even when both are equal. Updates become in-place
/// refreshes only when the presentation layer supports them; otherwise they
/// are structural no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffTranslator {
    supports_in_place_refresh: bool,
}

impl DiffTranslator {
    /// Create a translator.
    pub fn new(supports_in_place_refresh: bool) -> Self {
        Self {
            supports_in_place_refresh,
        }
    }

    /// Whether updates are translated into refreshes.
    pub fn supports_in_place_refresh(&self) -> bool {
        self.supports_in_place_refresh
    }

    /// Record one event into `batch`.
    ///
    /// A malformed event leaves `batch` untouched.
    pub fn record(
        &self,
        event: &ChangeEvent,
        batch: &mut ChangeBatch,
    ) -> Result<(), MalformedChangeEvent> {
        let malformed = |missing| MalformedChangeEvent {
            event: *event,
            missing,
        };

        match event.kind {
            ChangeKind::Insert => {
                let new = event.new_position.ok_or_else(|| malformed(MissingPosition::New))?;
                batch.insert(new);
            }
            ChangeKind::Delete => {
                let old = event.old_position.ok_or_else(|| malformed(MissingPosition::Old))?;
                batch.delete(old);
            }
            ChangeKind::Move => {
                let old = event.old_position.ok_or_else(|| malformed(MissingPosition::Old))?;
                let new = event.new_position.ok_or_else(|| malformed(MissingPosition::New))?;
                batch.delete(old);
                batch.insert(new);
            }
            ChangeKind::Update => {
                let old = event.old_position.ok_or_else(|| malformed(MissingPosition::Old))?;
                if self.supports_in_place_refresh {
                    batch.refresh(old);
                }
            }
        }
        Ok(())
    }

    /// Translate a transaction's events, in arrival order, into a batch.
    ///
    /// Malformed events are dropped, logged and returned alongside the batch.
    pub fn translate<'a, I>(&self, events: I) -> Translation
    where
        I: IntoIterator<Item = &'a ChangeEvent>,
    {
        let mut translation = Translation::default();
        for event in events {
            if let Err(err) = self.record(event, &mut translation.batch) {
                tracing::warn!(target: TARGET, %err, ?event, "dropping malformed change event");
                translation.malformed.push(err);
            }
        }
        translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn p(row: usize) -> Position {
        Position::row(row)
    }

    #[test]
    fn test_move_is_delete_plus_insert() {
        let translation = DiffTranslator::new(false).translate(&[ChangeEvent::moved(p(0), p(2))]);
        assert_eq!(translation.batch.deletes().collect::<Vec<_>>(), vec![p(0)]);
        assert_eq!(translation.batch.inserts().collect::<Vec<_>>(), vec![p(2)]);
    }

    #[test]
    fn test_move_to_same_position_still_decomposes() {
        let translation = DiffTranslator::new(true).translate(&[ChangeEvent::moved(p(1), p(1))]);
        let summary = translation.batch.summary();
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.refreshed, 0);
    }

    #[test]
    fn test_update_depends_on_refresh_support() {
        let events = [ChangeEvent::update(p(3), p(3))];

        let without = DiffTranslator::new(false).translate(&events);
        assert!(without.batch.is_empty());

        let with = DiffTranslator::new(true).translate(&events);
        assert_eq!(with.batch.refreshes().collect::<Vec<_>>(), vec![p(3)]);
        assert!(!with.batch.is_structural());
    }

    #[test]
    fn test_update_consumes_old_position() {
        let translation = DiffTranslator::new(true).translate(&[ChangeEvent::update(p(4), p(2))]);
        assert_eq!(translation.batch.refreshes().collect::<Vec<_>>(), vec![p(4)]);
    }

    #[test]
    fn test_malformed_events_are_dropped() {
        let bad_insert = ChangeEvent {
            kind: ChangeKind::Insert,
            old_position: Some(p(0)),
            new_position: None,
        };
        let bad_move = ChangeEvent {
            kind: ChangeKind::Move,
            old_position: Some(p(1)),
            new_position: None,
        };
        let events = [bad_insert, ChangeEvent::delete(p(2)), bad_move];

        let translation = DiffTranslator::new(false).translate(&events);

        assert_eq!(translation.batch.deletes().collect::<Vec<_>>(), vec![p(2)]);
        assert_eq!(translation.batch.inserts().count(), 0);
        assert_eq!(translation.malformed.len(), 2);
        assert_eq!(translation.malformed[0].missing, MissingPosition::New);
        assert_eq!(
            translation.malformed[1].to_string(),
            "move change event is missing its new position"
        );
    }

    #[test]
    fn test_malformed_move_does_not_half_apply() {
        let bad_move = ChangeEvent {
            kind: ChangeKind::Move,
            old_position: None,
            new_position: Some(p(1)),
        };
        let mut batch = ChangeBatch::new();
        assert!(DiffTranslator::new(false).record(&bad_move, &mut batch).is_err());
        assert!(batch.is_empty());
    }
}
