#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::selection::SelectionMode;

/// Behavioural switches of a [`TreeView`](crate::TreeView).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeViewConfig {
    /// Whether the root occupies row 0. When unset, the root's children form
    /// the top level regardless of the root's expanded flag.
    pub show_root: bool,
    /// How many nodes may be selected at once.
    pub selection_mode: SelectionMode,
    /// Whether nodes may enter an edit session.
    pub editable: bool,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            show_root: true,
            selection_mode: SelectionMode::Single,
            editable: false,
        }
    }
}

/// Snapshot of view state (expansion, selection, focus, config).
///
/// With the `serde` feature enabled, this type derives `Serialize`/`Deserialize`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeViewSnapshot<Id> {
    /// Expanded nodes under the root, in depth-first order.
    pub expanded: Vec<Id>,
    /// Selected nodes in selection order.
    pub selected: Vec<Id>,
    /// Most recently selected node.
    pub lead: Option<Id>,
    /// Focused node.
    pub focused: Option<Id>,
    /// View configuration at capture time.
    pub config: TreeViewConfig,
}
