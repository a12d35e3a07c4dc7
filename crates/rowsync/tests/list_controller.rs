//! Integration tests for live diffing through a `ListController`.

mod common;

use common::{Names, contains, init_tracing, name_store, record, values};
use rowsync::model::ViewOp;
use rowsync::prelude::*;
use rowsync::{ConfigError, Error};

type NameList = ListController<MemoryStore<String>, MirrorView<String>>;

fn bind(store: &std::sync::Arc<MemoryStore<String>>, view: MirrorView<String>) -> NameList {
    ListController::builder(store.clone(), view, Names::default())
        .crud_delegate(Names::default())
        .search_delegate(contains)
        .config(ListConfig::new("Ingredient"))
        .build()
        .unwrap()
}

fn assert_in_step(list: &NameList) {
    let current = list.store().current();
    assert_eq!(list.presentation().values(), values(&current));
    assert_eq!(
        list.presentation().ids(),
        current.iter().map(ResultItem::id).collect::<Vec<_>>()
    );
    if list.is_affordance_visible() {
        assert_eq!(list.presentation().affordance_row(), Some(current.len()));
    } else {
        assert_eq!(list.presentation().affordance_row(), None);
    }
}

#[test]
fn delete_and_insert_apply_in_one_pass() {
    init_tracing();
    let store = name_store(&["A", "B", "C"]);
    let b = store.current().get(1).unwrap().id();
    let mut list = bind(&store, MirrorView::new());
    list.presentation_mut().clear_ops();

    store
        .transaction(|tx| {
            tx.delete(b)?;
            tx.insert("D".to_string());
            Ok(())
        })
        .unwrap();
    list.process_pending();

    assert_eq!(list.presentation().values(), vec!["A", "C", "D"]);
    assert_eq!(
        list.presentation().ops(),
        &[
            ViewOp::BeginUpdates,
            ViewOp::Delete(vec![Position::row(1)]),
            ViewOp::Insert(vec![Position::row(2)]),
            ViewOp::EndUpdates,
        ]
    );
    assert_eq!(list.row_count(0), 4);
    assert_eq!(list.current_row(Position::row(3)), Some(Row::Affordance));
}

#[test]
fn updates_refresh_rows_in_place() {
    let store = name_store(&["Apple", "Banana", "Cherry"]);
    let banana = store.current().get(1).unwrap().id();
    let mut list = bind(&store, MirrorView::new().with_in_place_refresh(true));
    list.presentation_mut().clear_ops();

    store
        .transaction(|tx| tx.update(banana, "Blueberry".to_string()))
        .unwrap();
    list.process_pending();

    assert_eq!(list.presentation().values(), vec!["Apple", "Blueberry", "Cherry"]);
    assert_eq!(list.presentation().ops(), &[ViewOp::Refresh(vec![Position::row(1)])]);
    assert_eq!(list.presentation().update_passes(), 0);
}

#[test]
fn refresh_follows_rows_shifted_by_the_same_transaction() {
    let store = name_store(&["B", "C"]);
    let c = store.current().get(1).unwrap().id();
    let mut list = bind(&store, MirrorView::new().with_in_place_refresh(true));

    store
        .transaction(|tx| {
            tx.insert("A".to_string());
            tx.update(c, "Cc".to_string())
        })
        .unwrap();
    list.process_pending();

    assert_eq!(list.presentation().values(), vec!["A", "B", "Cc"]);
    assert_in_step(&list);
}

#[test]
fn updates_without_in_place_refresh_keep_later_batches_incremental() {
    let store = name_store(&["Apple", "Banana"]);
    let banana = store.current().get(1).unwrap().id();
    let mut list = bind(&store, MirrorView::new());
    let reloads = record(&list.signals().reloaded);
    list.presentation_mut().clear_ops();

    store
        .transaction(|tx| tx.update(banana, "Blueberry".to_string()))
        .unwrap();
    assert_eq!(list.process_pending(), 1);
    assert!(list.presentation().ops().is_empty());
    assert_eq!(list.presentation().values(), vec!["Apple", "Banana"]);

    store.transaction(|tx| Ok(tx.insert("Cherry".to_string()))).unwrap();
    list.process_pending();

    assert!(reloads.lock().is_empty());
    assert_eq!(list.presentation().reloads(), 1);
    assert_eq!(list.presentation().update_passes(), 1);
    assert_eq!(
        list.presentation().ops(),
        &[
            ViewOp::BeginUpdates,
            ViewOp::Insert(vec![Position::row(2)]),
            ViewOp::EndUpdates,
        ]
    );
    assert_eq!(
        list.presentation().ids(),
        store.current().iter().map(ResultItem::id).collect::<Vec<_>>()
    );
}

#[test]
fn reordering_update_moves_the_row() {
    let store = name_store(&["A", "B", "C"]);
    let a = store.current().get(0).unwrap().id();
    let mut list = bind(&store, MirrorView::new());

    store.transaction(|tx| tx.update(a, "Z".to_string())).unwrap();
    list.process_pending();

    assert_eq!(list.presentation().values(), vec!["B", "C", "Z"]);
    assert_eq!(list.presentation().update_passes(), 1);
    assert_in_step(&list);
}

#[test]
fn rolled_back_transaction_changes_nothing() {
    let store = name_store(&["A"]);
    let a = store.current().get(0).unwrap().id();
    let mut list = bind(&store, MirrorView::new());

    let result = store.transaction(|tx| {
        tx.delete(a)?;
        tx.delete(a)?;
        Ok(())
    });

    assert!(matches!(result, Err(StoreError::UnknownRecord(_))));
    assert_eq!(list.process_pending(), 0);
    assert_eq!(list.presentation().values(), vec!["A"]);
}

struct Numbers;

impl RowDelegate<u32> for Numbers {
    fn configure_row(&self, item: &ResultItem<u32>, cell: &mut RowCell) {
        cell.text = item.value().to_string();
    }
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % bound as u64) as usize
    }
}

/// Run 300 random transactions and check the mirror after each one.
///
/// Without in-place refresh, updated rows that do not move keep their old
/// content, so only identities are compared.
fn track_store_across_transactions(in_place_refresh: bool, seed: u64) {
    init_tracing();
    let store = std::sync::Arc::new(MemoryStore::sorted_by_key(|n: &u32| *n));
    let view = MirrorView::new().with_in_place_refresh(in_place_refresh);
    let mut list = ListController::builder(store.clone(), view, Numbers).build().unwrap();
    let mut rng = Lcg(seed);

    for round in 0..300 {
        let mut live: Vec<RecordId> = store.current().iter().map(ResultItem::id).collect();
        let passes_before = list.presentation().update_passes();

        store
            .transaction(|tx| {
                for _ in 0..=rng.next(4) {
                    match rng.next(3) {
                        1 if !live.is_empty() => {
                            let id = live.swap_remove(rng.next(live.len()));
                            tx.delete(id)?;
                        }
                        2 if !live.is_empty() => {
                            let id = live[rng.next(live.len())];
                            tx.update(id, rng.next(40) as u32)?;
                        }
                        _ => {
                            tx.insert(rng.next(40) as u32);
                        }
                    }
                }
                Ok(())
            })
            .unwrap();
        list.process_pending();

        let current = store.current();
        let expected: Vec<RecordId> = current.iter().map(ResultItem::id).collect();
        assert_eq!(list.presentation().ids(), expected, "round {round}");
        if in_place_refresh {
            let expected: Vec<&u32> = current.iter().map(ResultItem::value).collect();
            assert_eq!(list.presentation().values(), expected, "round {round}");
        }
        assert_eq!(
            list.presentation().affordance_row(),
            Some(current.len()),
            "round {round}"
        );
        assert!(list.presentation().update_passes() <= passes_before + 1);
        assert!(!list.presentation().in_update_scope());
    }

    assert_eq!(list.presentation().reloads(), 1);
}

#[test]
fn mirror_tracks_store_with_in_place_refresh() {
    track_store_across_transactions(true, 0x5eed);
}

#[test]
fn mirror_tracks_store_without_in_place_refresh() {
    track_store_across_transactions(false, 0x5eed);
}

#[test]
fn filtering_hides_and_restores_the_affordance_once() {
    let store = name_store(&["Apple", "Apricot", "Banana"]);
    let mut list = bind(&store, MirrorView::new());
    let toggles = record(&list.signals().affordance_toggled);
    list.presentation_mut().clear_ops();

    list.begin_filter_interaction();
    list.begin_filter_interaction();
    assert_eq!(
        list.presentation().ops(),
        &[
            ViewOp::BeginUpdates,
            ViewOp::Delete(vec![Position::row(3)]),
            ViewOp::EndUpdates,
        ]
    );
    list.presentation_mut().clear_ops();

    list.update_filter_text("ap");
    assert_eq!(list.presentation().values(), vec!["Apple", "Apricot"]);
    assert_eq!(list.presentation().affordance_row(), None);
    assert_eq!(list.predicate().map(MemoryPredicate::label), Some("name contains \"ap\""));

    // Live diffing continues under the filter.
    store.transaction(|tx| Ok(tx.insert("Grape".to_string()))).unwrap();
    store.transaction(|tx| Ok(tx.insert("Apex".to_string()))).unwrap();
    list.process_pending();
    assert_eq!(list.presentation().values(), vec!["Apex", "Apple", "Apricot"]);
    list.presentation_mut().clear_ops();

    list.end_filter_interaction();
    assert_eq!(
        list.presentation().ops(),
        &[
            ViewOp::Reload(5),
            ViewOp::BeginUpdates,
            ViewOp::Insert(vec![Position::row(5)]),
            ViewOp::EndUpdates,
        ]
    );
    assert_eq!(*toggles.lock(), vec![false, true]);
    assert_eq!(list.search_state(), SearchState::Idle);
    assert_in_step(&list);
}

#[test]
fn clearing_the_filter_keeps_the_interaction_open() {
    let store = name_store(&["Apple", "Banana"]);
    let mut list = bind(&store, MirrorView::new());

    list.begin_filter_interaction();
    list.update_filter_text("ban");
    assert_eq!(list.presentation().values(), vec!["Banana"]);

    list.clear_filter_text();
    assert_eq!(list.filter_text(), "");
    assert_eq!(list.presentation().values(), vec!["Apple", "Banana"]);
    assert_eq!(list.search_state(), SearchState::Filtering);
    assert!(!list.is_affordance_visible());
}

#[test]
fn filter_text_outside_an_interaction_is_ignored() {
    let store = name_store(&["Apple", "Banana"]);
    let mut list = bind(&store, MirrorView::new());

    list.update_filter_text("ban");

    assert!(list.predicate().is_none());
    assert_eq!(list.presentation().values(), vec!["Apple", "Banana"]);
}

#[test]
fn affordance_row_routes_to_create() {
    let store = name_store(&["Apple"]);
    let names = Names::default();
    let list = ListController::builder(store, MirrorView::new(), names.clone())
        .crud_delegate(names.clone())
        .config(ListConfig::new("Ingredient"))
        .build()
        .unwrap();

    let cell = list.cell_for_row(Position::row(1)).unwrap();
    assert_eq!(cell.text, "Create new Ingredient");
    assert_eq!(cell.accessory, Accessory::Add);
    assert!(!list.can_edit_row(Position::row(1)));
    assert_eq!(list.edit_actions_for_row(Position::row(1)), None);

    assert_eq!(list.select_row(Position::row(1)), Selection::Affordance);
    assert!(list.perform_edit_action(Position::row(0), &EditAction::update()));
    assert_eq!(*names.calls.lock(), vec!["create", "update Apple"]);
}

#[test]
fn disabled_affordance_is_never_shown() {
    let store = name_store(&["Apple"]);
    let mut list = ListController::builder(store.clone(), MirrorView::new(), Names::default())
        .config(ListConfig::new("Ingredient").affordance(false))
        .build()
        .unwrap();

    store.transaction(|tx| Ok(tx.insert("Banana".to_string()))).unwrap();
    list.process_pending();
    list.begin_filter_interaction();
    list.end_filter_interaction();

    assert_eq!(list.row_count(0), 2);
    assert_eq!(list.presentation().affordance_row(), None);
}

#[test]
fn config_file_drives_the_controller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ingredients.toml");
    std::fs::write(
        &path,
        "entity_name = \"Ingredient\"\n\n[affordance]\nlabel = \"Add {entity}\"\n",
    )
    .unwrap();

    let config = ListConfig::load(&path).unwrap();
    let list = ListController::builder(name_store(&[]), MirrorView::new(), Names::default())
        .config(config)
        .build()
        .unwrap();

    assert_eq!(list.row_count(0), 1);
    assert_eq!(
        list.cell_for_row(Position::row(0)).map(|cell| cell.text),
        Some("Add Ingredient".to_string())
    );
}

#[test]
fn invalid_config_is_rejected_at_build() {
    let result = ListController::builder(name_store(&[]), MirrorView::new(), Names::default())
        .config(ListConfig::new("Ingredient").refetch_queue_capacity(0))
        .build();

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::Invalid {
            field: "refetch.queue_capacity",
            ..
        }))
    ));
}
