use std::hash::Hash;

use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

use crate::model::TreeModel;

/// A visible node row with metadata used for rendering and navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRow<Id> {
    pub(crate) id: Id,
    pub(crate) level: u16,
    pub(crate) parent: Option<Id>,
    pub(crate) has_children: bool,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
}

impl<Id: Copy> VisibleRow<Id> {
    /// Node shown on this row.
    #[inline]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Depth of the row; the first visible level is 0.
    #[inline]
    pub const fn level(&self) -> u16 {
        self.level
    }

    /// Parent node, if the node has one in the model.
    #[inline]
    pub const fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Whether the node has children (expanded or not).
    #[inline]
    pub const fn has_children(&self) -> bool {
        self.has_children
    }

    /// For each ancestor level, whether that ancestor was the last of its siblings.
    pub fn is_tail_stack(&self) -> &[bool] {
        &self.is_tail_stack
    }
}

/// Flat, expansion-filtered DFS ordering of a tree.
///
/// The sequence is rebuilt from scratch on every change; nothing is diffed.
#[derive(Clone, Debug)]
pub struct VisibleRows<Id> {
    rows: Vec<VisibleRow<Id>>,
    // Fast lookup from node id to row index.
    index: FxHashMap<Id, usize>,
}

impl<Id: Copy + Eq + Hash> Default for VisibleRows<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq + Hash> VisibleRows<Id> {
    /// Creates an empty row set.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty row set with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Computes the visible rows of `model`.
    pub fn compute<T: TreeModel<Id = Id>>(model: &T, show_root: bool) -> Self {
        let mut rows = Self::with_capacity(model.size_hint());
        rows.rebuild(model, show_root);
        rows
    }

    /// Recomputes the rows in place, reusing allocations.
    ///
    /// With `show_root` unset the root is skipped and its children start at
    /// level 0, whatever the root's own expanded flag says.
    pub fn rebuild<T: TreeModel<Id = Id>>(&mut self, model: &T, show_root: bool) {
        self.rows.clear();
        self.index.clear();
        self.reserve(model);
        let Some(root) = model.root() else {
            return;
        };
        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        if show_root {
            self.push_subtree(model, root, 0, model.parent(root), &mut is_tail_stack);
        } else {
            // Top-level rows carry no guide entry, same as a shown root.
            for child in model.children(root).iter().copied() {
                self.push_subtree(model, child, 0, Some(root), &mut is_tail_stack);
            }
        }
    }

    /// Number of visible rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if nothing is visible.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&VisibleRow<Id>> {
        self.rows.get(index)
    }

    /// Returns the node shown at `index`.
    #[inline]
    pub fn resolve(&self, index: usize) -> Option<Id> {
        self.rows.get(index).map(|row| row.id)
    }

    /// Returns the row index of `id`, or `None` if the node is not visible.
    #[inline]
    pub fn index_of(&self, id: Id) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Returns `true` if `id` has a row.
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.index.contains_key(&id)
    }

    /// All rows in display order.
    pub fn as_slice(&self) -> &[VisibleRow<Id>] {
        &self.rows
    }

    /// Iterates over the rows in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, VisibleRow<Id>> {
        self.rows.iter()
    }

    /// Collects the node ids in display order.
    pub fn ids(&self) -> Vec<Id> {
        self.rows.iter().map(|row| row.id).collect()
    }

    fn reserve<T: TreeModel<Id = Id>>(&mut self, model: &T) {
        let hint = model.size_hint();
        if hint == 0 {
            return;
        }
        let row_extra = hint.saturating_sub(self.rows.capacity());
        if row_extra > 0 {
            self.rows.reserve(row_extra);
        }
        let index_extra = hint.saturating_sub(self.index.capacity());
        if index_extra > 0 {
            self.index.reserve(index_extra);
        }
    }

    fn push_subtree<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        node_id: Id,
        level: u16,
        parent: Option<Id>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let has_children = !model.is_leaf(node_id);
        let idx = self.rows.len();
        self.rows.push(VisibleRow {
            id: node_id,
            level,
            parent,
            has_children,
            is_tail_stack: is_tail_stack.clone(),
        });
        self.index.insert(node_id, idx);

        if has_children && model.is_expanded(node_id) {
            self.push_children(model, node_id, level.saturating_add(1), is_tail_stack);
        }
    }

    fn push_children<T: TreeModel<Id = Id>>(
        &mut self,
        model: &T,
        node_id: Id,
        level: u16,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
    ) {
        let children = model.children(node_id);
        let last_idx = children.len().saturating_sub(1);
        for (i, child) in children.iter().copied().enumerate() {
            is_tail_stack.push(i == last_idx);
            self.push_subtree(model, child, level, Some(node_id), is_tail_stack);
            is_tail_stack.pop();
        }
    }
}

impl<'a, Id> IntoIterator for &'a VisibleRows<Id> {
    type Item = &'a VisibleRow<Id>;
    type IntoIter = std::slice::Iter<'a, VisibleRow<Id>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::TreeEdit;
    use crate::store::{NodeId, TreeStore};

    // root -> {a -> {a1, a2}, b}
    fn sample() -> (TreeStore<&'static str>, [NodeId; 5]) {
        let (mut store, root) = TreeStore::with_root("root");
        let a = store.add_child(root, "a").unwrap();
        let a1 = store.add_child(a, "a1").unwrap();
        let a2 = store.add_child(a, "a2").unwrap();
        let b = store.add_child(root, "b").unwrap();
        (store, [root, a, a1, a2, b])
    }

    #[test]
    fn builds_rows_with_expansion() {
        let (mut store, [root, a, a1, a2, b]) = sample();
        store.set_expanded(root, true).unwrap();
        store.set_expanded(a, true).unwrap();

        let rows = VisibleRows::compute(&store, true);

        let ids: Vec<_> = rows.iter().map(VisibleRow::id).collect();
        let levels: Vec<_> = rows.iter().map(VisibleRow::level).collect();
        assert_eq!(ids, vec![root, a, a1, a2, b]);
        assert_eq!(levels, vec![0, 1, 2, 2, 1]);
        assert_eq!(rows.get(3).map(VisibleRow::is_tail_stack), Some(&[false, true][..]));
    }

    #[test]
    fn collapsed_root_shows_only_itself() {
        let (store, [root, a, ..]) = sample();

        let rows = VisibleRows::compute(&store, true);

        assert_eq!(rows.ids(), vec![root]);
        assert_eq!(rows.index_of(a), None);
    }

    #[test]
    fn hidden_root_promotes_children_to_level_zero() {
        let (store, [root, a, _, _, b]) = sample();

        let rows = VisibleRows::compute(&store, false);

        assert_eq!(rows.ids(), vec![a, b]);
        assert_eq!(rows.get(0).map(VisibleRow::level), Some(0));
        assert_eq!(rows.index_of(root), None);
    }

    #[test]
    fn subtree_root_ignores_its_own_parent_siblings() {
        let (mut store, [root, a, a1, a2, b]) = sample();
        store.set_expanded(root, true).unwrap();
        store.set_expanded(a, true).unwrap();
        store.set_root(Some(a)).unwrap();

        let rows = VisibleRows::compute(&store, true);
        assert_eq!(rows.ids(), vec![a, a1, a2]);
        assert_eq!(rows.index_of(root), None);
        assert_eq!(rows.index_of(b), None);

        store.set_root(Some(a1)).unwrap();
        assert!(VisibleRows::compute(&store, false).is_empty());
    }

    #[test]
    fn empty_model_yields_no_rows() {
        let store = TreeStore::<()>::new();
        assert!(VisibleRows::compute(&store, true).is_empty());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let (mut store, [root, a, ..]) = sample();
        store.set_expanded(root, true).unwrap();
        store.set_expanded(a, true).unwrap();
        let mut rows = VisibleRows::compute(&store, true);
        let first = rows.as_slice().to_vec();

        rows.rebuild(&store, true);

        assert_eq!(rows.as_slice(), first.as_slice());
    }
}
