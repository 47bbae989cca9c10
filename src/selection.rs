use std::hash::Hash;

use rustc_hash::{FxBuildHasher, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::rows::VisibleRows;

/// How many nodes may be selected at once.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// At most one node.
    #[default]
    Single,
    /// Any number of nodes.
    Multiple,
}

/// Selected nodes, tracked by identity.
///
/// Row indices are never stored; they are resolved against the current
/// [`VisibleRows`] on demand, so a selected node that is not visible simply
/// has no index.
#[derive(Clone, Debug)]
pub struct SelectionModel<Id> {
    mode: SelectionMode,
    // Insertion order.
    selected: Vec<Id>,
    members: FxHashSet<Id>,
    // Most recently selected node; drives `selected_node`/`selected_index`.
    lead: Option<Id>,
}

impl<Id: Copy + Eq + Hash> Default for SelectionModel<Id> {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

impl<Id: Copy + Eq + Hash> SelectionModel<Id> {
    /// Creates an empty selection.
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: Vec::new(),
            members: FxHashSet::with_hasher(FxBuildHasher),
            lead: None,
        }
    }

    /// Current selection mode.
    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Changes the mode. Switching to single keeps only the lead node.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        if mode == SelectionMode::Single && self.selected.len() > 1 {
            let lead = self.lead;
            self.clear();
            if let Some(id) = lead {
                self.select(id);
            }
        }
    }

    /// Selects `id`. Single mode replaces the selection, multiple mode adds to it.
    pub fn select(&mut self, id: Id) {
        if self.mode == SelectionMode::Single {
            if self.selected.len() == 1 && self.selected[0] == id {
                self.lead = Some(id);
                return;
            }
            self.clear();
        }
        if self.members.insert(id) {
            self.selected.push(id);
        }
        self.lead = Some(id);
    }

    /// Selects the node at `index`. Out-of-range indices are ignored.
    pub fn select_index(&mut self, rows: &VisibleRows<Id>, index: usize) -> Option<Id> {
        let id = rows.resolve(index)?;
        self.select(id);
        Some(id)
    }

    /// Selects every valid index in order; the last one becomes the lead.
    ///
    /// In single mode only the last valid index stays selected.
    pub fn select_indices(&mut self, rows: &VisibleRows<Id>, indices: &[usize]) -> Option<Id> {
        let mut last = None;
        for &index in indices {
            if let Some(id) = self.select_index(rows, index) {
                last = Some(id);
            }
        }
        last
    }

    /// Selects the half-open row range `[start, end)`.
    ///
    /// A descending range (`start > end`) walks from `start` down to `end + 1`,
    /// leaving the lead on the last row visited.
    pub fn select_range(&mut self, rows: &VisibleRows<Id>, start: usize, end: usize) -> Option<Id> {
        let indices: Vec<usize> = if start <= end {
            (start..end.min(rows.len())).collect()
        } else {
            (end + 1..=start).rev().filter(|&i| i < rows.len()).collect()
        };
        self.select_indices(rows, &indices)
    }

    /// Selects every visible row (multiple mode only).
    pub fn select_all(&mut self, rows: &VisibleRows<Id>) -> bool {
        if self.mode != SelectionMode::Multiple || rows.is_empty() {
            return false;
        }
        for row in rows {
            if self.members.insert(row.id) {
                self.selected.push(row.id);
            }
        }
        self.lead = rows.resolve(rows.len() - 1);
        true
    }

    /// Removes every node from the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.members.clear();
        self.lead = None;
    }

    /// Removes `id` from the selection. The lead falls back to the most
    /// recently added node that is still selected.
    pub fn deselect(&mut self, id: Id) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.selected.retain(|&selected| selected != id);
        if self.lead == Some(id) {
            self.lead = self.selected.last().copied();
        }
        true
    }

    /// Removes the node at `index` from the selection.
    pub fn deselect_index(&mut self, rows: &VisibleRows<Id>, index: usize) -> Option<Id> {
        let id = rows.resolve(index)?;
        self.deselect(id).then_some(id)
    }

    /// Returns `true` if `id` is selected.
    #[inline]
    pub fn is_selected(&self, id: Id) -> bool {
        self.members.contains(&id)
    }

    /// Returns `true` if the node at `index` is selected.
    pub fn is_index_selected(&self, rows: &VisibleRows<Id>, index: usize) -> bool {
        rows.resolve(index).is_some_and(|id| self.is_selected(id))
    }

    /// Selected nodes in the order they were selected.
    pub fn selected_nodes(&self) -> &[Id] {
        &self.selected
    }

    /// The lead node (most recently selected).
    pub const fn selected_node(&self) -> Option<Id> {
        self.lead
    }

    /// Row of the lead node, if it is visible.
    pub fn selected_index(&self, rows: &VisibleRows<Id>) -> Option<usize> {
        self.lead.and_then(|id| rows.index_of(id))
    }

    /// Rows of every visible selected node, ascending.
    pub fn selected_indices(&self, rows: &VisibleRows<Id>) -> Vec<usize> {
        self.indexed(rows).into_iter().map(|(_, row)| row).collect()
    }

    /// Visible selected nodes paired with their rows, ascending by row.
    pub(crate) fn indexed(&self, rows: &VisibleRows<Id>) -> Vec<(Id, usize)> {
        let mut indexed: Vec<(Id, usize)> = self
            .selected
            .iter()
            .filter_map(|&id| rows.index_of(id).map(|row| (id, row)))
            .collect();
        indexed.sort_unstable_by_key(|&(_, row)| row);
        indexed
    }

    /// Number of selected nodes, visible or not.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Maps every selected node through `relocate`, dropping `None`s and
    /// merging duplicates into their first occurrence.
    pub(crate) fn remap<F>(&mut self, mut relocate: F)
    where
        F: FnMut(Id) -> Option<Id>,
    {
        let lead = self.lead.and_then(&mut relocate);
        let previous = std::mem::take(&mut self.selected);
        self.members.clear();
        for id in previous.into_iter().filter_map(&mut relocate) {
            if self.members.insert(id) {
                self.selected.push(id);
            }
        }
        if self.mode == SelectionMode::Single && self.selected.len() > 1 {
            self.selected.truncate(1);
            self.members.retain(|id| self.selected.contains(id));
        }
        self.lead = lead
            .filter(|id| self.members.contains(id))
            .or_else(|| self.selected.last().copied());
    }

    /// Replaces the selection wholesale (used by snapshot restore).
    pub(crate) fn replace(&mut self, selected: &[Id], lead: Option<Id>) {
        self.clear();
        for &id in selected {
            if self.members.insert(id) {
                self.selected.push(id);
            }
        }
        if self.mode == SelectionMode::Single {
            let keep = lead.or_else(|| self.selected.last().copied());
            self.clear();
            if let Some(id) = keep {
                self.select(id);
            }
            return;
        }
        self.lead = lead
            .filter(|id| self.members.contains(id))
            .or_else(|| self.selected.last().copied());
    }
}

/// The single focused node, tracked by identity.
#[derive(Clone, Copy, Debug)]
pub struct FocusModel<Id> {
    focused: Option<Id>,
}

impl<Id> Default for FocusModel<Id> {
    fn default() -> Self {
        Self { focused: None }
    }
}

impl<Id: Copy + Eq + Hash> FocusModel<Id> {
    /// Focuses `id`.
    pub fn focus(&mut self, id: Id) {
        self.focused = Some(id);
    }

    /// Replaces the focused node.
    pub fn set(&mut self, focused: Option<Id>) {
        self.focused = focused;
    }

    /// Drops focus.
    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Focused node.
    pub const fn focused_node(&self) -> Option<Id> {
        self.focused
    }

    /// Row of the focused node, if it is visible.
    pub fn focused_index(&self, rows: &VisibleRows<Id>) -> Option<usize> {
        self.focused.and_then(|id| rows.index_of(id))
    }

    /// Returns `true` if the node at `index` has focus.
    pub fn is_focused(&self, rows: &VisibleRows<Id>, index: usize) -> bool {
        self.focused.is_some() && self.focused_index(rows) == Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::TreeEdit;
    use crate::store::{NodeId, TreeStore};

    // root (expanded) -> four leaves
    fn rows_with_children() -> (VisibleRows<NodeId>, NodeId, Vec<NodeId>) {
        let (mut store, root) = TreeStore::with_root("root");
        let children: Vec<NodeId> = (0..4)
            .map(|i| store.add_child(root, if i % 2 == 0 { "even" } else { "odd" }).unwrap())
            .collect();
        store.set_expanded(root, true).unwrap();
        (VisibleRows::compute(&store, true), root, children)
    }

    #[test]
    fn single_mode_replaces_previous_selection() {
        let (rows, _, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Single);

        selection.select_index(&rows, 1);
        selection.select_index(&rows, 3);

        assert_eq!(selection.selected_nodes(), &[children[2]]);
        assert_eq!(selection.selected_index(&rows), Some(3));
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let (rows, _, _) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Single);

        assert_eq!(selection.select_index(&rows, 5), None);
        assert!(selection.is_empty());
        assert_eq!(selection.selected_index(&rows), None);
    }

    #[test]
    fn range_is_half_open_and_leads_with_last_row() {
        let (rows, root, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);

        selection.select_range(&rows, 0, 2);

        assert_eq!(selection.selected_nodes(), &[root, children[0]]);
        assert_eq!(selection.selected_index(&rows), Some(1));
    }

    #[test]
    fn descending_range_walks_downwards() {
        let (rows, _, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);

        selection.select_range(&rows, 4, 1);

        assert_eq!(selection.selected_nodes(), &[children[3], children[2], children[1]]);
        assert_eq!(selection.selected_node(), Some(children[1]));
    }

    #[test]
    fn range_is_clipped_to_visible_rows() {
        let (rows, _, _) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);

        selection.select_range(&rows, 3, 40);

        assert_eq!(selection.selected_indices(&rows), vec![3, 4]);
    }

    #[test]
    fn nodes_with_equal_values_are_tracked_separately() {
        let (_, _, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Single);

        selection.select(children[0]);

        assert!(selection.is_selected(children[0]));
        assert!(!selection.is_selected(children[2]));
    }

    #[test]
    fn deselecting_lead_falls_back_to_latest_remaining() {
        let (rows, _, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);
        selection.select_indices(&rows, &[1, 2, 3]);

        assert_eq!(selection.deselect_index(&rows, 3), Some(children[2]));

        assert_eq!(selection.selected_node(), Some(children[1]));
        assert_eq!(selection.selected_indices(&rows), vec![1, 2]);
    }

    #[test]
    fn remap_merges_duplicates_and_keeps_order() {
        let (rows, root, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);
        selection.select_indices(&rows, &[2, 0, 3]);

        selection.remap(|id| if id == children[1] { Some(root) } else { Some(id) });

        assert_eq!(selection.selected_nodes(), &[root, children[2]]);
        assert_eq!(selection.selected_node(), Some(children[2]));
    }

    #[test]
    fn switching_to_single_keeps_lead() {
        let (rows, _, children) = rows_with_children();
        let mut selection = SelectionModel::new(SelectionMode::Multiple);
        selection.select_indices(&rows, &[1, 2]);

        selection.set_mode(SelectionMode::Single);

        assert_eq!(selection.selected_nodes(), &[children[1]]);
    }

    #[test]
    fn focus_resolves_through_rows() {
        let (rows, _, children) = rows_with_children();
        let mut focus = FocusModel::default();

        focus.focus(children[1]);

        assert_eq!(focus.focused_index(&rows), Some(2));
        assert!(focus.is_focused(&rows, 2));
        assert!(!focus.is_focused(&rows, 1));
    }
}
