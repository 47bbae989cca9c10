use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Commands a user or application can issue to a [`TreeView`](crate::TreeView).
///
/// Row-relative commands act on the lead selected node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Id> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Move selection to the parent node.
    SelectParent,
    /// Select the node.
    Select(Id),
    /// Select the node at a row.
    SelectIndex(usize),
    /// Deselect everything.
    ClearSelection,
    /// Give focus to the node.
    Focus(Id),
    /// Toggle expansion of the selected node.
    ToggleNode,
    /// Expand the node.
    Expand(Id),
    /// Collapse the node.
    Collapse(Id),
    /// Expand every node in the tree.
    ExpandAll,
    /// Collapse every node in the tree.
    CollapseAll,
    /// Start editing the selected node.
    EditNode,
    /// Accept the current edit.
    CommitEdit,
    /// Abandon the current edit.
    CancelEdit,
    /// Detach the selected node from its parent without deleting it.
    DetachNode,
}

/// Result of handling an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// The action was applied.
    Handled,
    /// The action was ignored (nothing selected, nothing to do).
    Unhandled,
}

impl TreeEvent {
    pub(crate) const fn from_bool(handled: bool) -> Self {
        if handled { Self::Handled } else { Self::Unhandled }
    }
}

/// Deferred actions requested while a notification is being delivered.
///
/// Listeners cannot borrow the view they observe. They capture a clone of
/// this handle instead and push actions, which the view runs once the current
/// notification round has finished.
pub struct ActionQueue<Id> {
    pending: Rc<RefCell<VecDeque<TreeAction<Id>>>>,
}

impl<Id> Clone for ActionQueue<Id> {
    fn clone(&self) -> Self {
        Self {
            pending: Rc::clone(&self.pending),
        }
    }
}

impl<Id> Default for ActionQueue<Id> {
    fn default() -> Self {
        Self {
            pending: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<Id> ActionQueue<Id> {
    /// Queues an action.
    pub fn push(&self, action: TreeAction<Id>) {
        self.pending.borrow_mut().push_back(action);
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    pub(crate) fn pop(&self) -> Option<TreeAction<Id>> {
        self.pending.borrow_mut().pop_front()
    }

    pub(crate) fn clear(&self) -> usize {
        let mut pending = self.pending.borrow_mut();
        let dropped = pending.len();
        pending.clear();
        dropped
    }
}
