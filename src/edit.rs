use rustc_hash::{FxBuildHasher, FxHashSet};
use thiserror::Error;

use crate::model::TreeModel;

/// Returns `true` if `candidate` is `node` or one of its ancestors.
fn is_ancestor_or_self<M: TreeModel + ?Sized>(model: &M, candidate: M::Id, node: M::Id) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == candidate {
            return true;
        }
        current = model.parent(id);
    }
    false
}

/// Reasons a structural mutation was rejected. A rejected mutation leaves the
/// model untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node id does not belong to this model.
    #[error("node does not belong to this tree")]
    UnknownNode,
    /// The node is already a child of another node; detach it first.
    #[error("node is already attached to a parent")]
    AlreadyAttached,
    /// The node is an ancestor of (or equal to) the target parent.
    #[error("inserting the node would create a cycle")]
    Cycle,
    /// The requested child position does not exist.
    #[error("child position {position} is out of range for {len} children")]
    PositionOutOfRange {
        /// Requested position.
        position: usize,
        /// Number of children at the time of the call.
        len: usize,
    },
    /// The node is not a child of the given parent.
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// The store has no node ids left to hand out.
    #[error("tree store is full")]
    CapacityExceeded,
}

/// Structural mutations the view drives through its sync pipeline.
///
/// Implementors only mutate; re-indexing rows and remapping selection is the
/// view's job.
pub trait TreeEdit: TreeModel {
    /// Replaces the view root.
    fn set_root(&mut self, root: Option<Self::Id>) -> Result<(), TreeError>;

    /// Inserts a detached node at `position` in `parent`'s child list.
    fn insert_child(
        &mut self,
        parent: Self::Id,
        position: usize,
        child: Self::Id,
    ) -> Result<(), TreeError>;

    /// Detaches `child` from `parent` and returns its former position.
    ///
    /// The detached node keeps its own subtree.
    fn remove_child(&mut self, parent: Self::Id, child: Self::Id) -> Result<usize, TreeError>;

    /// Moves the child at position `from` to position `to` within `parent`.
    fn move_child(&mut self, parent: Self::Id, from: usize, to: usize) -> Result<(), TreeError>;

    /// Sets the expanded flag and returns whether it changed.
    fn set_expanded(&mut self, id: Self::Id, expanded: bool) -> Result<bool, TreeError>;

    /// Appends a detached node to `parent`'s child list.
    fn push_child(&mut self, parent: Self::Id, child: Self::Id) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Detaches every listed child of `parent`. Nodes that are not children are skipped.
    fn remove_children(&mut self, parent: Self::Id, children: &[Self::Id]) -> usize {
        let mut removed = 0;
        for child in children.iter().copied() {
            if self.remove_child(parent, child).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Detaches all children of `parent`.
    fn clear_children(&mut self, parent: Self::Id) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode);
        }
        while let Some(&child) = self.children(parent).last() {
            self.remove_child(parent, child)?;
        }
        Ok(())
    }

    /// Replaces `parent`'s child list. Nodes present before and after keep their identity.
    ///
    /// The new list is checked as a whole first: every entry must be unique,
    /// either detached or already a child of `parent`, and not an ancestor of
    /// `parent`. On error nothing is changed.
    fn set_children(&mut self, parent: Self::Id, children: &[Self::Id]) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode);
        }
        let mut seen = FxHashSet::with_capacity_and_hasher(children.len(), FxBuildHasher);
        for child in children.iter().copied() {
            if !self.contains(child) {
                return Err(TreeError::UnknownNode);
            }
            if !seen.insert(child) {
                return Err(TreeError::AlreadyAttached);
            }
            match self.parent(child) {
                Some(owner) if owner == parent => {}
                Some(_) => return Err(TreeError::AlreadyAttached),
                None if is_ancestor_or_self(self, child, parent) => {
                    return Err(TreeError::Cycle);
                }
                None => {}
            }
        }
        self.clear_children(parent)?;
        for child in children.iter().copied() {
            self.push_child(parent, child)?;
        }
        Ok(())
    }

    /// Moves `child` one position up within its siblings.
    fn move_child_up(&mut self, parent: Self::Id, child: Self::Id) -> Result<bool, TreeError> {
        let Some(idx) = self.children(parent).iter().position(|&id| id == child) else {
            return Err(TreeError::NotAChild);
        };
        if idx == 0 {
            return Ok(false);
        }
        self.move_child(parent, idx, idx - 1)?;
        Ok(true)
    }

    /// Moves `child` one position down within its siblings.
    fn move_child_down(&mut self, parent: Self::Id, child: Self::Id) -> Result<bool, TreeError> {
        let children = self.children(parent);
        let Some(idx) = children.iter().position(|&id| id == child) else {
            return Err(TreeError::NotAChild);
        };
        if idx + 1 >= children.len() {
            return Ok(false);
        }
        self.move_child(parent, idx, idx + 1)?;
        Ok(true)
    }
}
