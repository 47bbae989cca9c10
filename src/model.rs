use std::hash::Hash;

/// Minimal tree contract required by the view.
///
/// A proper tree is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has at most one parent;
/// - identifiers are stable for the lifetime of a node and compared by identity,
///   never by the value the node holds.
///
/// The view root does not have to be a top-level node: when it has a parent of
/// its own, only its subtree is mapped to rows.
pub trait TreeModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the root node (or `None` if the view has no root).
    fn root(&self) -> Option<Self::Id>;
    /// Returns the node's children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns the node's parent, if it is attached to one.
    fn parent(&self, id: Self::Id) -> Option<Self::Id>;
    /// Returns `true` if the node is expanded. Leaves may report either value.
    fn is_expanded(&self, id: Self::Id) -> bool;
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns `true` if the node has no children.
    fn is_leaf(&self, id: Self::Id) -> bool {
        self.children(id).is_empty()
    }
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }
}
