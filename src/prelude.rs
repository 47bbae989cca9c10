pub use crate::{
    ActionQueue, ChangeRecord, DisplayLabel, EditEvent, ListChange, ListenerId, NodeId,
    RowsChanged, SelectionMode, TreeAction, TreeCellRenderer, TreeEdit, TreeError, TreeEvent,
    TreeGlyphs, TreeLabel, TreeLabelProvider, TreeModel, TreeRowContext, TreeScrollPolicy,
    TreeStore, TreeView, TreeViewConfig, TreeViewSnapshot, TreeViewStyle, TreeViewWidget,
    TreeViewport, ValueChange, tree_label_line, tree_name_cell,
};
