use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::action::{ActionQueue, TreeAction, TreeEvent};
use crate::change::{ListChange, ListenerId, RowsChanged, ValueChange, ViewListeners};
use crate::config::{TreeViewConfig, TreeViewSnapshot};
use crate::edit::{TreeEdit, TreeError};
use crate::editing::{EditEvent, EditSession};
use crate::model::TreeModel;
use crate::rows::VisibleRows;
use crate::selection::{FocusModel, SelectionMode, SelectionModel};
use crate::store::{NodeId, TreeStore};

// Deferred actions run per notification round before the rest is dropped.
const ACTION_BUDGET: usize = 64;

type Ancestors<Id> = SmallVec<[Id; 8]>;

/// Ancestors of `id` up to and including the root, or `None` when the node is
/// not part of the root's subtree.
fn ancestors<M: TreeModel>(model: &M, id: M::Id) -> Option<Ancestors<M::Id>> {
    let root = model.root()?;
    let mut chain = SmallVec::new();
    let mut node = id;
    while node != root {
        node = model.parent(node)?;
        chain.push(node);
    }
    Some(chain)
}

/// Nodes under the root in depth-first order, root included.
fn subtree<M: TreeModel>(model: &M) -> Vec<M::Id> {
    let mut nodes = Vec::with_capacity(model.size_hint());
    let Some(root) = model.root() else {
        return nodes;
    };
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        nodes.push(node);
        stack.extend(model.children(node).iter().rev().copied());
    }
    nodes
}

// Where a tracked node was before a mutation.
struct Anchor<Id> {
    row: Option<usize>,
    // `Some` iff the node was attached under the root.
    ancestors: Option<Ancestors<Id>>,
}

// Everything listeners observe, captured before a mutation.
struct Observed<Id> {
    root: Option<Id>,
    row_count: usize,
    // Only captured for structural mutations.
    rows: Vec<Id>,
    selected: Vec<Id>,
    indexed: Vec<(Id, usize)>,
    lead: Option<Id>,
    lead_row: Option<usize>,
    focused: Option<Id>,
    focused_row: Option<usize>,
    anchors: FxHashMap<Id, Anchor<Id>>,
}

struct Relocator<'a, M: TreeModel> {
    model: &'a M,
    rows: &'a VisibleRows<M::Id>,
    before: &'a Observed<M::Id>,
}

impl<M: TreeModel> Relocator<'_, M> {
    fn was_detached(&self, id: M::Id) -> bool {
        self.before
            .anchors
            .get(&id)
            .is_some_and(|anchor| anchor.ancestors.is_some())
            && ancestors(self.model, id).is_none()
    }

    fn relocate(&self, id: M::Id) -> Option<M::Id> {
        let Some(anchor) = self.before.anchors.get(&id) else {
            return Some(id);
        };
        let Some(old_ancestors) = &anchor.ancestors else {
            // Never attached: wait until it is.
            return Some(id);
        };
        if ancestors(self.model, id).is_some() {
            if anchor.row.is_some() && !self.rows.contains(id) {
                return Some(self.nearest_visible_ancestor(id).unwrap_or(id));
            }
            return Some(id);
        }
        match anchor.row {
            Some(row) => {
                let (preceding, rest) = self.before.rows.split_at(row.min(self.before.rows.len()));
                let following = rest.get(1..).unwrap_or_default();
                preceding
                    .iter()
                    .rev()
                    .chain(following)
                    .copied()
                    .find(|&candidate| self.rows.contains(candidate))
            }
            None => old_ancestors
                .iter()
                .copied()
                .find(|&ancestor| self.rows.contains(ancestor)),
        }
    }

    fn nearest_visible_ancestor(&self, id: M::Id) -> Option<M::Id> {
        let mut node = id;
        while let Some(parent) = self.model.parent(node) {
            if self.rows.contains(parent) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }
}

/// A tree view context: owns the model together with its visible rows,
/// selection, focus and edit session, and keeps them consistent.
///
/// Every mutation goes through one pipeline: capture what listeners observe,
/// mutate, rebuild rows, re-resolve tracked nodes, notify, then run actions
/// that listeners queued meanwhile.
pub struct TreeView<M: TreeModel> {
    model: M,
    config: TreeViewConfig,
    rows: VisibleRows<M::Id>,
    selection: SelectionModel<M::Id>,
    focus: FocusModel<M::Id>,
    edit: EditSession<M::Id>,
    listeners: ViewListeners<M::Id>,
    queue: ActionQueue<M::Id>,
    draining: bool,
}

impl<M: TreeModel> TreeView<M> {
    /// Wraps `model` with the default configuration.
    pub fn new(model: M) -> Self {
        Self::with_config(model, TreeViewConfig::default())
    }

    /// Wraps `model` with `config`.
    pub fn with_config(model: M, config: TreeViewConfig) -> Self {
        let rows = VisibleRows::compute(&model, config.show_root);
        Self {
            model,
            config,
            rows,
            selection: SelectionModel::new(config.selection_mode),
            focus: FocusModel::default(),
            edit: EditSession::default(),
            listeners: ViewListeners::default(),
            queue: ActionQueue::default(),
            draining: false,
        }
    }

    /// The wrapped model.
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Unwraps the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Current configuration.
    pub const fn config(&self) -> TreeViewConfig {
        self.config
    }

    /// Whether the root occupies row 0.
    pub const fn show_root(&self) -> bool {
        self.config.show_root
    }

    /// A handle listeners can use to request actions while being notified.
    pub fn action_queue(&self) -> ActionQueue<M::Id> {
        self.queue.clone()
    }

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Node shown at `index`, or `None` when out of range.
    pub fn resolve_node(&self, index: usize) -> Option<M::Id> {
        self.rows.resolve(index)
    }

    /// Row of `id`, or `None` when the node is not visible.
    pub fn index_of(&self, id: M::Id) -> Option<usize> {
        self.rows.index_of(id)
    }

    /// The visible rows.
    pub const fn rows(&self) -> &VisibleRows<M::Id> {
        &self.rows
    }

    /// Returns `true` if the node belongs to the root's subtree, visible or not.
    pub fn is_attached(&self, id: M::Id) -> bool {
        ancestors(&self.model, id).is_some()
    }

    /// Distance from the node to the view root (the root itself is 0).
    ///
    /// For a node outside the root's subtree the distance to the top of its
    /// own hierarchy is returned. The value ignores `show_root`.
    pub fn node_level(&self, id: M::Id) -> Option<usize> {
        if !self.model.contains(id) {
            return None;
        }
        if let Some(chain) = ancestors(&self.model, id) {
            return Some(chain.len());
        }
        let mut level = 0;
        let mut node = id;
        while let Some(parent) = self.model.parent(node) {
            level += 1;
            node = parent;
        }
        Some(level)
    }

    /// Current selection mode.
    pub const fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// The lead (most recently selected) node.
    pub const fn selected_node(&self) -> Option<M::Id> {
        self.selection.selected_node()
    }

    /// Row of the lead node, if visible.
    pub fn selected_index(&self) -> Option<usize> {
        self.selection.selected_index(&self.rows)
    }

    /// Selected nodes in selection order.
    pub fn selected_nodes(&self) -> &[M::Id] {
        self.selection.selected_nodes()
    }

    /// Rows of the visible selected nodes, ascending.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selection.selected_indices(&self.rows)
    }

    /// Returns `true` if `id` is selected.
    pub fn is_selected(&self, id: M::Id) -> bool {
        self.selection.is_selected(id)
    }

    /// Returns `true` if the node at `index` is selected.
    pub fn is_selected_index(&self, index: usize) -> bool {
        self.selection.is_index_selected(&self.rows, index)
    }

    /// The focused node.
    pub const fn focused_node(&self) -> Option<M::Id> {
        self.focus.focused_node()
    }

    /// Row of the focused node, if visible.
    pub fn focused_index(&self) -> Option<usize> {
        self.focus.focused_index(&self.rows)
    }

    /// Returns `true` if the node at `index` has focus.
    pub fn is_focused(&self, index: usize) -> bool {
        self.focus.is_focused(&self.rows, index)
    }

    /// Node currently being edited.
    pub const fn editing_node(&self) -> Option<M::Id> {
        self.edit.editing()
    }

    /// Captures expansion, selection, focus and config.
    pub fn snapshot(&self) -> TreeViewSnapshot<M::Id> {
        TreeViewSnapshot {
            expanded: subtree(&self.model)
                .into_iter()
                .filter(|&id| self.model.is_expanded(id))
                .collect(),
            selected: self.selection.selected_nodes().to_vec(),
            lead: self.selection.selected_node(),
            focused: self.focus.focused_node(),
            config: self.config,
        }
    }

    /// Called when the number of rows changes.
    pub fn on_rows_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&RowsChanged<M::Id>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.rows.add(id, Box::new(callback));
        id
    }

    /// Called when the set of selected nodes changes.
    pub fn on_selected_items_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ListChange<M::Id>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.selected_items.add(id, Box::new(callback));
        id
    }

    /// Called when the rows of the selected nodes change.
    pub fn on_selected_indices_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ListChange<usize>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.selected_indices.add(id, Box::new(callback));
        id
    }

    /// Called when the lead node changes.
    pub fn on_selected_item_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ValueChange<Option<M::Id>>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.selected_item.add(id, Box::new(callback));
        id
    }

    /// Called when the row of the lead node changes.
    pub fn on_selected_index_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ValueChange<Option<usize>>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.selected_index.add(id, Box::new(callback));
        id
    }

    /// Called when the focused node changes.
    pub fn on_focused_item_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ValueChange<Option<M::Id>>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.focused_item.add(id, Box::new(callback));
        id
    }

    /// Called when the row of the focused node changes.
    pub fn on_focused_index_changed<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&ValueChange<Option<usize>>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.focused_index.add(id, Box::new(callback));
        id
    }

    /// Called when an edit session starts, commits or is cancelled.
    pub fn on_edit<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&EditEvent<M::Id>) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.edit.add(id, Box::new(callback));
        id
    }

    /// Unregisters a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn observe(&self, structural: bool) -> Observed<M::Id> {
        let selected = self.selection.selected_nodes().to_vec();
        let focused = self.focus.focused_node();
        let mut anchors = FxHashMap::default();
        if structural {
            let tracked = selected
                .iter()
                .copied()
                .chain(focused)
                .chain(self.edit.editing());
            for id in tracked {
                anchors.entry(id).or_insert_with(|| Anchor {
                    row: self.rows.index_of(id),
                    ancestors: ancestors(&self.model, id),
                });
            }
        }
        Observed {
            root: self.model.root(),
            row_count: self.rows.len(),
            rows: if structural { self.rows.ids() } else { Vec::new() },
            indexed: self.selection.indexed(&self.rows),
            lead: self.selection.selected_node(),
            lead_row: self.selection.selected_index(&self.rows),
            focused_row: self.focus.focused_index(&self.rows),
            selected,
            focused,
            anchors,
        }
    }

    fn refresh_rows(&mut self) {
        self.rows.rebuild(&self.model, self.config.show_root);
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = self.rows.len(), "rebuilt visible rows");
    }

    fn reconcile(&mut self, before: &Observed<M::Id>) {
        if before.root != self.model.root() {
            #[cfg(feature = "tracing")]
            tracing::debug!("root replaced, clearing selection and focus");
            self.selection.clear();
            self.focus.clear();
            self.emit_edit(EditSession::cancel);
            return;
        }
        let relocator = Relocator {
            model: &self.model,
            rows: &self.rows,
            before,
        };
        self.selection.remap(|id| relocator.relocate(id));
        let focused = self.focus.focused_node().and_then(|id| {
            if !before.selected.contains(&id) && relocator.was_detached(id) {
                None
            } else {
                relocator.relocate(id)
            }
        });
        self.focus.set(focused);
        let edited_detached = self
            .edit
            .editing()
            .is_some_and(|id| relocator.was_detached(id));
        if edited_detached {
            #[cfg(feature = "tracing")]
            tracing::debug!("edited node left the tree, cancelling edit");
            self.emit_edit(EditSession::cancel);
        }
    }

    fn emit_edit(&mut self, end: fn(&mut EditSession<M::Id>) -> Option<EditEvent<M::Id>>) -> bool {
        let Some(event) = end(&mut self.edit) else {
            return false;
        };
        self.listeners.edit.emit(&event);
        true
    }

    fn notify(&mut self, before: &Observed<M::Id>) {
        let listeners = &mut self.listeners;
        if before.row_count != self.rows.len() && !listeners.rows.is_empty() {
            listeners.rows.emit(&RowsChanged {
                old_count: before.row_count,
                rows: self.rows.ids(),
            });
        }
        if let Some(change) = ListChange::between(&before.selected, self.selection.selected_nodes())
        {
            listeners.selected_items.emit(&change);
        }
        let indexed = self.selection.indexed(&self.rows);
        if let Some(change) = ListChange::between_indexed(&before.indexed, &indexed) {
            listeners.selected_indices.emit(&change);
        }
        if let Some(change) = ValueChange::between(before.lead, self.selection.selected_node()) {
            listeners.selected_item.emit(&change);
        }
        let lead_row = self.selection.selected_index(&self.rows);
        if let Some(change) = ValueChange::between(before.lead_row, lead_row) {
            listeners.selected_index.emit(&change);
        }
        if let Some(change) = ValueChange::between(before.focused, self.focus.focused_node()) {
            listeners.focused_item.emit(&change);
        }
        let focused_row = self.focus.focused_index(&self.rows);
        if let Some(change) = ValueChange::between(before.focused_row, focused_row) {
            listeners.focused_index.emit(&change);
        }
    }
}

impl<M: TreeEdit> TreeView<M> {
    fn transact<R>(&mut self, apply: impl FnOnce(&mut Self) -> R) -> R {
        let before = self.observe(false);
        let result = apply(self);
        self.notify(&before);
        self.drain_actions();
        result
    }

    fn restructure<R>(&mut self, apply: impl FnOnce(&mut Self) -> R) -> R {
        let before = self.observe(true);
        let result = apply(self);
        self.refresh_rows();
        self.reconcile(&before);
        self.notify(&before);
        self.drain_actions();
        result
    }

    fn drain_actions(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        let mut budget = ACTION_BUDGET;
        while let Some(action) = self.queue.pop() {
            if budget == 0 {
                let dropped = self.queue.clear() + 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(dropped, budget = ACTION_BUDGET, "deferred tree actions exceeded budget");
                #[cfg(not(feature = "tracing"))]
                let _ = dropped;
                break;
            }
            budget -= 1;
            self.handle_action(action);
        }
        self.draining = false;
    }

    /// Applies an action and reports whether it did anything.
    pub fn handle_action(&mut self, action: TreeAction<M::Id>) -> TreeEvent {
        let handled = match action {
            TreeAction::SelectPrev => self.select_previous(),
            TreeAction::SelectNext => self.select_next(),
            TreeAction::SelectFirst => self.select_first(),
            TreeAction::SelectLast => self.select_last(),
            TreeAction::SelectParent => self.select_parent(),
            TreeAction::Select(id) => {
                self.select(id);
                true
            }
            TreeAction::SelectIndex(index) => self.select_index(index),
            TreeAction::ClearSelection => {
                let had_selection = !self.selection.is_empty();
                self.clear_selection();
                had_selection
            }
            TreeAction::Focus(id) => {
                self.focus_node(id);
                true
            }
            TreeAction::ToggleNode => self
                .selected_node()
                .filter(|&id| !self.model.is_leaf(id))
                .is_some_and(|id| self.toggle_expanded(id).is_ok()),
            TreeAction::Expand(id) => self.set_expanded(id, true).unwrap_or(false),
            TreeAction::Collapse(id) => self.set_expanded(id, false).unwrap_or(false),
            TreeAction::ExpandAll => {
                self.expand_all();
                true
            }
            TreeAction::CollapseAll => {
                self.collapse_all();
                true
            }
            TreeAction::EditNode => self.selected_node().is_some_and(|id| self.edit(id)),
            TreeAction::CommitEdit => self.commit_edit(),
            TreeAction::CancelEdit => self.cancel_edit(),
            TreeAction::DetachNode => self.detach_selected(),
        };
        TreeEvent::from_bool(handled)
    }

    /// Changes the selection mode. Switching to single keeps only the lead.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.transact(|view| {
            view.config.selection_mode = mode;
            view.selection.set_mode(mode);
        });
    }

    /// Enables or disables editing; disabling cancels a running session.
    pub fn set_editable(&mut self, editable: bool) {
        self.transact(|view| {
            view.config.editable = editable;
            if !editable {
                view.emit_edit(EditSession::cancel);
            }
        });
    }

    /// Shows or hides the root row.
    pub fn set_show_root(&mut self, show_root: bool) {
        if self.config.show_root == show_root {
            return;
        }
        self.restructure(|view| view.config.show_root = show_root);
    }

    /// Restores a snapshot taken with [`snapshot`](Self::snapshot).
    ///
    /// Expanded entries the model does not contain are skipped. Selection and
    /// focus are taken as-is; entries that are not visible stay unresolved
    /// until they become visible.
    pub fn restore(&mut self, snapshot: TreeViewSnapshot<M::Id>) {
        let TreeViewSnapshot {
            expanded,
            selected,
            lead,
            focused,
            config,
        } = snapshot;
        let before = self.observe(true);
        for id in subtree(&self.model) {
            let _ = self.model.set_expanded(id, false);
        }
        for id in expanded {
            if !self.model.contains(id) {
                #[cfg(feature = "tracing")]
                tracing::debug!("snapshot names a node outside the model, skipping");
                continue;
            }
            let _ = self.model.set_expanded(id, true);
        }
        self.config = config;
        self.selection.set_mode(config.selection_mode);
        self.refresh_rows();
        self.reconcile(&before);
        self.selection.replace(&selected, lead);
        self.focus.set(focused);
        if !config.editable {
            self.emit_edit(EditSession::cancel);
        }
        self.notify(&before);
        self.drain_actions();
    }

    /// Selects `id` and focuses it. Single mode replaces the selection.
    ///
    /// A node outside the tree is accepted and stays unresolved until it is
    /// attached and visible.
    pub fn select(&mut self, id: M::Id) {
        self.transact(|view| {
            view.selection.select(id);
            view.focus.focus(id);
        });
    }

    /// Selects the node at `index`; out of range is a no-op.
    pub fn select_index(&mut self, index: usize) -> bool {
        let Some(id) = self.rows.resolve(index) else {
            return false;
        };
        self.select(id);
        true
    }

    /// Selects every valid index in order and focuses the last one.
    pub fn select_indices(&mut self, indices: &[usize]) -> bool {
        self.transact(|view| {
            let last = view.selection.select_indices(&view.rows, indices);
            if let Some(id) = last {
                view.focus.focus(id);
            }
            last.is_some()
        })
    }

    /// Selects the rows `[start, end)`; a descending range walks downwards.
    pub fn select_range(&mut self, start: usize, end: usize) -> bool {
        self.transact(|view| {
            let last = view.selection.select_range(&view.rows, start, end);
            if let Some(id) = last {
                view.focus.focus(id);
            }
            last.is_some()
        })
    }

    /// Selects every visible row (multiple mode only) and focuses the last.
    pub fn select_all(&mut self) -> bool {
        self.transact(|view| {
            if !view.selection.select_all(&view.rows) {
                return false;
            }
            if let Some(id) = view.selection.selected_node() {
                view.focus.focus(id);
            }
            true
        })
    }

    /// Selects the first row.
    pub fn select_first(&mut self) -> bool {
        self.select_index(0)
    }

    /// Selects the last row.
    pub fn select_last(&mut self) -> bool {
        match self.rows.len() {
            0 => false,
            len => self.select_index(len - 1),
        }
    }

    /// Selects the row after the focused one (or the lead when nothing has focus).
    pub fn select_next(&mut self) -> bool {
        let Some(last) = self.rows.len().checked_sub(1) else {
            return false;
        };
        let index = self
            .anchor_index()
            .map_or(0, |index| (index + 1).min(last));
        self.select_index(index)
    }

    /// Selects the row before the focused one (or the lead when nothing has focus).
    pub fn select_previous(&mut self) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        let index = self.anchor_index().map_or(0, |index| index.saturating_sub(1));
        self.select_index(index)
    }

    /// Selects the lead node's parent if it has a row.
    pub fn select_parent(&mut self) -> bool {
        let Some(parent) = self
            .selected_node()
            .and_then(|id| self.model.parent(id))
            .filter(|&parent| self.rows.contains(parent))
        else {
            return false;
        };
        self.select(parent);
        true
    }

    /// Deselects everything. Focus is dropped if it was on a selected node.
    pub fn clear_selection(&mut self) {
        self.transact(|view| {
            if view
                .focus
                .focused_node()
                .is_some_and(|id| view.selection.is_selected(id))
            {
                view.focus.clear();
            }
            view.selection.clear();
        });
    }

    /// Deselects the node at `index`.
    pub fn clear_selection_at(&mut self, index: usize) -> bool {
        self.rows
            .resolve(index)
            .is_some_and(|id| self.clear_selected(id))
    }

    /// Deselects `id`. Focus is dropped if it was on that node.
    pub fn clear_selected(&mut self, id: M::Id) -> bool {
        self.transact(|view| {
            if !view.selection.deselect(id) {
                return false;
            }
            if view.focus.focused_node() == Some(id) {
                view.focus.clear();
            }
            true
        })
    }

    fn anchor_index(&self) -> Option<usize> {
        self.focused_index().or_else(|| self.selected_index())
    }

    /// Focuses the node at `index`; out of range is a no-op.
    pub fn focus(&mut self, index: usize) -> bool {
        let Some(id) = self.rows.resolve(index) else {
            return false;
        };
        self.focus_node(id);
        true
    }

    /// Focuses `id` without selecting it.
    pub fn focus_node(&mut self, id: M::Id) {
        self.transact(|view| view.focus.focus(id));
    }

    /// Drops focus.
    pub fn clear_focus(&mut self) {
        self.transact(|view| view.focus.clear());
    }

    /// Starts editing `id`, cancelling any other session.
    ///
    /// Ignored unless the view is editable and the node is under the root.
    pub fn edit(&mut self, id: M::Id) -> bool {
        if !self.config.editable || !self.is_attached(id) {
            return false;
        }
        self.transact(|view| {
            for event in view.edit.start(id) {
                view.listeners.edit.emit(&event);
            }
            view.edit.editing() == Some(id)
        })
    }

    /// Accepts the running edit.
    pub fn commit_edit(&mut self) -> bool {
        self.transact(|view| view.emit_edit(EditSession::commit))
    }

    /// Abandons the running edit.
    pub fn cancel_edit(&mut self) -> bool {
        self.transact(|view| view.emit_edit(EditSession::cancel))
    }

    /// Replaces the root. A different root clears selection and focus.
    pub fn set_root(&mut self, root: Option<M::Id>) -> Result<(), TreeError> {
        if self.model.root() == root {
            return Ok(());
        }
        self.restructure(|view| view.model.set_root(root))
    }

    /// Inserts a detached node among `parent`'s children.
    pub fn insert_child(
        &mut self,
        parent: M::Id,
        position: usize,
        child: M::Id,
    ) -> Result<(), TreeError> {
        self.restructure(|view| view.model.insert_child(parent, position, child))
    }

    /// Appends a detached node to `parent`'s children.
    pub fn push_child(&mut self, parent: M::Id, child: M::Id) -> Result<(), TreeError> {
        self.restructure(|view| view.model.push_child(parent, child))
    }

    /// Detaches `child` from `parent` and returns its former position.
    pub fn remove_child(&mut self, parent: M::Id, child: M::Id) -> Result<usize, TreeError> {
        self.restructure(|view| view.model.remove_child(parent, child))
    }

    /// Detaches several children in one mutation.
    pub fn remove_children(&mut self, parent: M::Id, children: &[M::Id]) -> usize {
        self.restructure(|view| view.model.remove_children(parent, children))
    }

    /// Detaches every child of `parent`.
    pub fn clear_children(&mut self, parent: M::Id) -> Result<(), TreeError> {
        self.restructure(|view| view.model.clear_children(parent))
    }

    /// Replaces `parent`'s children in one mutation.
    pub fn set_children(&mut self, parent: M::Id, children: &[M::Id]) -> Result<(), TreeError> {
        self.restructure(|view| view.model.set_children(parent, children))
    }

    /// Moves a child within its siblings.
    pub fn move_child(&mut self, parent: M::Id, from: usize, to: usize) -> Result<(), TreeError> {
        self.restructure(|view| view.model.move_child(parent, from, to))
    }

    /// Expands or collapses a node. Returns whether the flag changed.
    pub fn set_expanded(&mut self, id: M::Id, expanded: bool) -> Result<bool, TreeError> {
        self.restructure(|view| view.model.set_expanded(id, expanded))
    }

    /// Flips a node's expanded flag and returns the new value.
    pub fn toggle_expanded(&mut self, id: M::Id) -> Result<bool, TreeError> {
        let expanded = !self.model.is_expanded(id);
        self.set_expanded(id, expanded)?;
        Ok(expanded)
    }

    /// Expands every ancestor of `id` and returns whether it now has a row.
    pub fn expand_to(&mut self, id: M::Id) -> bool {
        let Some(chain) = ancestors(&self.model, id) else {
            return false;
        };
        self.restructure(|view| {
            for ancestor in chain {
                let _ = view.model.set_expanded(ancestor, true);
            }
        });
        self.rows.contains(id)
    }

    /// Expands every branch under the root.
    pub fn expand_all(&mut self) {
        self.restructure(|view| {
            for id in subtree(&view.model) {
                if !view.model.is_leaf(id) {
                    let _ = view.model.set_expanded(id, true);
                }
            }
        });
    }

    /// Collapses every node under the root.
    pub fn collapse_all(&mut self) {
        self.restructure(|view| {
            for id in subtree(&view.model) {
                let _ = view.model.set_expanded(id, false);
            }
        });
    }

    /// Runs an arbitrary mutation through the sync pipeline.
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut M) -> R) -> R {
        self.restructure(|view| mutate(&mut view.model))
    }

    fn detach_selected(&mut self) -> bool {
        let Some(id) = self.selected_node() else {
            return false;
        };
        if self.model.root() == Some(id) {
            return false;
        }
        let Some(parent) = self.model.parent(id) else {
            return false;
        };
        self.remove_child(parent, id).is_ok()
    }
}

impl<T> TreeView<TreeStore<T>> {
    /// Value held by a node.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.model.value(id)
    }

    /// Creates a node holding `value` and appends it to `parent`.
    pub fn add_child(&mut self, parent: NodeId, value: T) -> Result<NodeId, TreeError> {
        self.restructure(|view| view.model.add_child(parent, value))
    }

    /// Stores `value` in the node being edited and commits the edit.
    pub fn commit_edit_value(&mut self, value: T) -> bool {
        self.transact(|view| {
            let Some(id) = view.edit.editing() else {
                return false;
            };
            if let Some(slot) = view.model.value_mut(id) {
                *slot = value;
            }
            view.emit_edit(EditSession::commit)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::change::ChangeRecord;

    // root (expanded) -> {a (expanded) -> {a1, a2}, b}
    fn sample() -> (TreeView<TreeStore<&'static str>>, [NodeId; 5]) {
        let (mut store, root) = TreeStore::with_root("root");
        let a = store.add_child(root, "a").unwrap();
        let a1 = store.add_child(a, "a1").unwrap();
        let a2 = store.add_child(a, "a2").unwrap();
        let b = store.add_child(root, "b").unwrap();
        store.set_expanded(root, true).unwrap();
        store.set_expanded(a, true).unwrap();
        (TreeView::new(store), [root, a, a1, a2, b])
    }

    #[test]
    fn collapsing_ancestor_moves_selection_to_it() {
        let (mut view, [_, a, _, a2, _]) = sample();
        view.select(a2);

        view.set_expanded(a, false).unwrap();

        assert_eq!(view.selected_nodes(), &[a]);
        assert_eq!(view.selected_index(), Some(1));
        assert_eq!(view.focused_node(), Some(a));
    }

    #[test]
    fn expanding_above_selection_only_reindexes() {
        let (mut view, [_, a, _, _, b]) = sample();
        view.set_expanded(a, false).unwrap();
        view.select(b);
        let items = Rc::new(RefCell::new(Vec::new()));
        let indices = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&items);
        view.on_selected_items_changed(move |change| sink.borrow_mut().push(change.clone()));
        let sink = Rc::clone(&indices);
        view.on_selected_indices_changed(move |change| sink.borrow_mut().push(change.clone()));

        view.set_expanded(a, true).unwrap();

        assert!(items.borrow().is_empty());
        assert_eq!(
            indices.borrow()[0].records(),
            &[ChangeRecord::Permuted {
                from: vec![2],
                to: vec![4]
            }]
        );
        assert_eq!(view.selected_index(), Some(4));
    }

    #[test]
    fn removing_first_child_falls_back_to_parent() {
        let (mut view, [_, a, a1, _, _]) = sample();
        view.select(a1);

        view.remove_child(a, a1).unwrap();

        assert_eq!(view.selected_node(), Some(a));
    }

    #[test]
    fn removed_hidden_node_falls_back_to_visible_ancestor() {
        let (mut view, [root, a, _, a2, _]) = sample();
        view.set_selection_mode(SelectionMode::Multiple);
        view.set_expanded(a, false).unwrap();
        // Selected while hidden.
        view.select(a2);
        assert_eq!(view.selected_index(), None);

        view.remove_child(root, a).unwrap();

        assert_eq!(view.selected_nodes(), &[root]);
    }

    #[test]
    fn focus_only_node_loses_focus_when_removed() {
        let (mut view, [root, _, _, _, b]) = sample();
        view.focus_node(b);

        view.remove_child(root, b).unwrap();

        assert_eq!(view.focused_node(), None);
    }

    #[test]
    fn replacing_root_clears_selection_and_focus() {
        let (mut view, [_, a, a1, ..]) = sample();
        view.select(a1);

        view.set_root(Some(a)).unwrap();

        assert!(view.selected_nodes().is_empty());
        assert_eq!(view.focused_node(), None);
        assert_eq!(view.resolve_node(0), Some(a));
    }

    #[test]
    fn same_root_is_a_no_op() {
        let (mut view, [root, _, a1, ..]) = sample();
        view.select(a1);

        view.set_root(Some(root)).unwrap();

        assert_eq!(view.selected_node(), Some(a1));
    }

    #[test]
    fn detaching_edited_node_cancels_once() {
        let (mut view, [root, a, ..]) = sample();
        view.set_editable(true);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        view.on_edit(move |event| sink.borrow_mut().push(*event));

        assert!(view.edit(a));
        view.remove_child(root, a).unwrap();
        view.clear_children(root).unwrap();

        assert_eq!(*events.borrow(), vec![EditEvent::Start(a), EditEvent::Cancel(a)]);
        assert_eq!(view.editing_node(), None);
    }

    #[test]
    fn edit_requires_editable_view() {
        let (mut view, [_, a, ..]) = sample();

        assert!(!view.edit(a));
        assert_eq!(view.editing_node(), None);
    }

    #[test]
    fn queued_actions_run_after_notification() {
        let (mut view, [_, _, _, _, b]) = sample();
        let queue = view.action_queue();
        view.on_selected_item_changed(move |change| {
            if change.new.is_some() {
                queue.push(TreeAction::SelectParent);
            }
        });

        view.select(b);

        assert_eq!(view.selected_index(), Some(0));
    }

    #[test]
    fn runaway_queue_is_cut_off() {
        let (mut view, _) = sample();
        let queue = view.action_queue();
        // Every focus change requests two more, so the queue never settles.
        view.on_focused_item_changed(move |_| {
            queue.push(TreeAction::SelectNext);
            queue.push(TreeAction::SelectPrev);
        });

        view.select_first();

        assert!(view.action_queue().is_empty());
        assert_eq!(view.selected_nodes().len(), 1);
    }

    #[test]
    fn hidden_root_ignores_its_expanded_flag() {
        let (mut view, [root, a, ..]) = sample();
        view.set_expanded(root, false).unwrap();

        view.set_show_root(false);

        assert_eq!(view.resolve_node(0), Some(a));
        assert_eq!(view.node_level(a), Some(1));
        assert_eq!(view.rows().get(0).map(|row| row.level()), Some(0));
    }

    #[test]
    fn snapshot_round_trip_restores_selection_and_expansion() {
        let (mut view, [_, a, _, a2, _]) = sample();
        view.select(a2);
        let snapshot = view.snapshot();

        view.collapse_all();
        view.clear_selection();
        view.restore(snapshot);

        assert!(view.model().is_expanded(a));
        assert_eq!(view.selected_node(), Some(a2));
        assert_eq!(view.selected_index(), Some(3));
    }
}
