//! Host capabilities consulted by the [`ListController`](crate::ListController).

use crate::model::ResultItem;

/// Trailing accessory shown on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accessory {
    /// Nothing.
    #[default]
    None,
    /// An "add" glyph, used by the affordance row.
    Add,
    /// A disclosure chevron.
    DisclosureIndicator,
    /// A checkmark.
    Checkmark,
}

/// How a row is highlighted when tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStyle {
    /// The platform's default highlight.
    #[default]
    Default,
    /// No highlight.
    None,
}

/// The display content of one row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowCell {
    /// Primary text.
    pub text: String,
    /// Secondary text.
    pub detail: Option<String>,
    /// Trailing accessory.
    pub accessory: Accessory,
    /// Tap highlight.
    pub selection_style: SelectionStyle,
}

/// What a swipe action does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditActionKind {
    /// Edit the record.
    Update,
    /// Delete the record.
    Delete,
    /// A host-defined action, identified by name.
    Custom(String),
}

/// A swipe action offered on an editable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditAction {
    /// Button title.
    pub title: String,
    /// Behavior.
    pub kind: EditActionKind,
}

impl EditAction {
    /// Create an action.
    pub fn new(title: impl Into<String>, kind: EditActionKind) -> Self {
        Self {
            title: title.into(),
            kind,
        }
    }

    /// The standard "Edit" action.
    pub fn update() -> Self {
        Self::new("Edit", EditActionKind::Update)
    }

    /// The standard "Delete" action.
    pub fn delete() -> Self {
        Self::new("Delete", EditActionKind::Delete)
    }
}

/// Row-level presentation and interaction decisions.
pub trait RowDelegate<T> {
    /// Fill in the cell for `item`.
    fn configure_row(&self, item: &ResultItem<T>, cell: &mut RowCell);

    /// `item` was selected.
    fn on_select(&self, _item: &ResultItem<T>) {}

    /// Whether `item` offers edit actions.
    fn can_edit(&self, _item: &ResultItem<T>) -> bool {
        false
    }

    /// The edit actions for `item`.
    fn edit_actions_for(&self, _item: &ResultItem<T>) -> Vec<EditAction> {
        Vec::new()
    }

    /// Whether the list shows the trailing "add new item" row.
    fn should_show_affordance_row(&self) -> bool {
        true
    }
}

/// Create, update and delete requests raised by the list.
pub trait CrudDelegate<T> {
    /// The affordance row or an "add" button was activated.
    fn wants_to_create(&self);

    /// An update action was chosen for `item`.
    fn wants_to_update(&self, item: &ResultItem<T>);

    /// A delete action was chosen for `item`.
    fn wants_to_delete(&self, item: &ResultItem<T>);
}

/// Builds store predicates from filter text.
pub trait SearchDelegate<P> {
    /// The predicate for non-empty `text`.
    fn predicate_for_search(&self, text: &str) -> P;
}

impl<P, F> SearchDelegate<P> for F
where
    F: Fn(&str) -> P,
{
    fn predicate_for_search(&self, text: &str) -> P {
        self(text)
    }
}
