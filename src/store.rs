use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::edit::{TreeEdit, TreeError};
use crate::model::TreeModel;

/// Handle to a node in a [`TreeStore`].
///
/// Two handles are equal only if they name the same node; the values the nodes
/// hold play no part in it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena slot of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
}

impl<T> Slot<T> {
    const fn new(value: T) -> Self {
        Self {
            value,
            parent: None,
            children: Vec::new(),
            expanded: false,
        }
    }
}

// Ids are arena slots; there are no more than `u32` can address.
fn slot_id(slot: usize) -> Result<NodeId, TreeError> {
    u32::try_from(slot)
        .map(NodeId)
        .map_err(|_| TreeError::CapacityExceeded)
}

/// Arena-backed tree with value payloads.
///
/// Nodes are created detached and live as long as the store: removing a node
/// from its parent only unlinks it, so the handle and its subtree stay valid
/// and can be inserted again.
pub struct TreeStore<T> {
    slots: Vec<Slot<T>>,
    root: Option<NodeId>,
}

impl<T> Default for TreeStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeStore<T> {
    /// Creates an empty store without a root.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            root: None,
        }
    }

    /// Creates an empty store with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Creates a store holding a single root node.
    pub fn with_root(value: T) -> (Self, NodeId) {
        let root = NodeId(0);
        let store = Self {
            slots: vec![Slot::new(value)],
            root: Some(root),
        };
        (store, root)
    }

    /// Creates a detached node.
    ///
    /// A store holds at most `u32::MAX + 1` nodes; past that every call fails
    /// with [`TreeError::CapacityExceeded`].
    pub fn add_node(&mut self, value: T) -> Result<NodeId, TreeError> {
        let id = slot_id(self.slots.len())?;
        self.slots.push(Slot::new(value));
        Ok(id)
    }

    /// Creates a node and appends it to `parent`.
    pub fn add_child(&mut self, parent: NodeId, value: T) -> Result<NodeId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode);
        }
        let child = self.add_node(value)?;
        self.push_child(parent, child)?;
        Ok(child)
    }

    /// Returns the number of nodes ever created in this store.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the node's value.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).map(|slot| &slot.value)
    }

    /// Returns the node's value for modification. Values never affect structure.
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).map(|slot| &mut slot.value)
    }

    /// Sorts `parent`'s children by comparing their values.
    pub fn sort_children_by<F>(&mut self, parent: NodeId, mut compare: F) -> Result<(), TreeError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let Some(slot) = self.slots.get(parent.index()) else {
            return Err(TreeError::UnknownNode);
        };
        let mut children = slot.children.clone();
        children.sort_by(|a, b| compare(&self.slots[a.index()].value, &self.slots[b.index()].value));
        self.slots[parent.index()].children = children;
        Ok(())
    }

    fn slot(&self, id: NodeId) -> Result<&Slot<T>, TreeError> {
        self.slots.get(id.index()).ok_or(TreeError::UnknownNode)
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot<T>, TreeError> {
        self.slots.get_mut(id.index()).ok_or(TreeError::UnknownNode)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.slots.get(node.index()).and_then(|slot| slot.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }
}

impl<T> TreeModel for TreeStore<T> {
    type Id = NodeId;

    fn root(&self) -> Option<Self::Id> {
        self.root
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.slots
            .get(id.index())
            .map_or(&[], |slot| slot.children.as_slice())
    }

    fn parent(&self, id: Self::Id) -> Option<Self::Id> {
        self.slots.get(id.index()).and_then(|slot| slot.parent)
    }

    fn is_expanded(&self, id: Self::Id) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.expanded)
    }

    fn contains(&self, id: Self::Id) -> bool {
        id.index() < self.slots.len()
    }

    fn size_hint(&self) -> usize {
        self.slots.len()
    }
}

impl<T> TreeEdit for TreeStore<T> {
    fn set_root(&mut self, root: Option<Self::Id>) -> Result<(), TreeError> {
        if let Some(id) = root {
            self.slot(id)?;
        }
        self.root = root;
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent: Self::Id,
        position: usize,
        child: Self::Id,
    ) -> Result<(), TreeError> {
        let len = self.slot(parent)?.children.len();
        if self.slot(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle);
        }
        if position > len {
            return Err(TreeError::PositionOutOfRange { position, len });
        }
        self.slots[parent.index()].children.insert(position, child);
        self.slots[child.index()].parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: Self::Id, child: Self::Id) -> Result<usize, TreeError> {
        let children = &mut self.slot_mut(parent)?.children;
        let Some(position) = children.iter().position(|&id| id == child) else {
            return Err(TreeError::NotAChild);
        };
        children.remove(position);
        self.slots[child.index()].parent = None;
        Ok(position)
    }

    fn move_child(&mut self, parent: Self::Id, from: usize, to: usize) -> Result<(), TreeError> {
        let children = &mut self.slot_mut(parent)?.children;
        let len = children.len();
        for position in [from, to] {
            if position >= len {
                return Err(TreeError::PositionOutOfRange { position, len });
            }
        }
        let child = children.remove(from);
        children.insert(to, child);
        Ok(())
    }

    fn set_expanded(&mut self, id: Self::Id, expanded: bool) -> Result<bool, TreeError> {
        let slot = self.slot_mut(id)?;
        let changed = slot.expanded != expanded;
        slot.expanded = expanded;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_nodes_keep_their_subtree() {
        let (mut store, root) = TreeStore::with_root("root");
        let branch = store.add_child(root, "branch").unwrap();
        let leaf = store.add_child(branch, "leaf").unwrap();

        assert_eq!(store.remove_child(root, branch), Ok(0));
        assert_eq!(store.parent(branch), None);
        assert_eq!(store.children(branch), &[leaf]);
        assert_eq!(store.parent(leaf), Some(branch));

        store.push_child(root, branch).unwrap();
        assert_eq!(store.children(root), &[branch]);
    }

    #[test]
    fn rejects_cycles_and_double_parents() {
        let (mut store, root) = TreeStore::with_root(0);
        let a = store.add_child(root, 1).unwrap();
        let b = store.add_child(a, 2).unwrap();

        assert_eq!(store.push_child(b, a), Err(TreeError::AlreadyAttached));
        store.remove_child(root, a).unwrap();
        assert_eq!(store.push_child(b, a), Err(TreeError::Cycle));
        assert_eq!(store.push_child(a, a), Err(TreeError::Cycle));
        assert_eq!(
            store.insert_child(root, 3, a),
            Err(TreeError::PositionOutOfRange { position: 3, len: 0 })
        );
    }

    #[test]
    fn equal_values_are_distinct_nodes() {
        let (mut store, root) = TreeStore::with_root("x");
        let first = store.add_child(root, "same").unwrap();
        let second = store.add_child(root, "same").unwrap();

        assert_ne!(first, second);
        assert_eq!(store.value(first), store.value(second));
    }

    #[test]
    fn sort_children_permutes_in_place() {
        let (mut store, root) = TreeStore::with_root("root");
        let c = store.add_child(root, "c").unwrap();
        let a = store.add_child(root, "a").unwrap();
        let b = store.add_child(root, "b").unwrap();

        store.sort_children_by(root, |x, y| x.cmp(y)).unwrap();

        assert_eq!(store.children(root), &[a, b, c]);
        assert!([a, b, c].iter().all(|&id| store.parent(id) == Some(root)));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn ids_past_u32_range_are_refused() {
        let last = u32::MAX as usize;

        assert_eq!(slot_id(last), Ok(NodeId(u32::MAX)));
        assert_eq!(slot_id(last + 1), Err(TreeError::CapacityExceeded));
    }

    #[test]
    fn rejected_set_children_keeps_old_children() {
        let (mut store, root) = TreeStore::with_root("root");
        let a = store.add_child(root, "a").unwrap();
        let b = store.add_child(root, "b").unwrap();
        let branch = store.add_child(a, "branch").unwrap();
        let loose = store.add_node("loose").unwrap();

        assert_eq!(store.set_children(root, &[a, a]), Err(TreeError::AlreadyAttached));
        assert_eq!(
            store.set_children(root, &[loose, branch]),
            Err(TreeError::AlreadyAttached)
        );
        assert_eq!(store.set_children(a, &[root]), Err(TreeError::Cycle));

        assert_eq!(store.children(root), &[a, b]);
        assert_eq!(store.children(a), &[branch]);
        assert_eq!(store.parent(loose), None);

        store.set_children(root, &[loose, b]).unwrap();
        assert_eq!(store.children(root), &[loose, b]);
        assert_eq!(store.parent(a), None);
    }

    #[test]
    fn set_children_keeps_identity_of_reinserted_nodes() {
        let (mut store, root) = TreeStore::with_root("root");
        let a = store.add_child(root, "a").unwrap();
        let b = store.add_child(root, "b").unwrap();

        store.set_children(root, &[b, a]).unwrap();

        assert_eq!(store.children(root), &[b, a]);
        assert_eq!(store.parent(a), Some(root));
    }
}
