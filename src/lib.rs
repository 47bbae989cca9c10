//! Tree view model for ratatui: an expandable tree flattened into rows, with
//! selection, focus and in-place editing that follow nodes by identity across
//! structural changes.
//!
//! [`TreeView`] owns a [`TreeModel`] and keeps its [`VisibleRows`], selection,
//! focus and edit session in sync. Every mutation runs one pipeline (capture,
//! mutate, rebuild rows, re-resolve, notify), so listeners always see row
//! indices that match the tree. [`TreeViewWidget`] renders the result.
//!
//! Feature flags:
//! - `tracing` (default): debug logs for row rebuilds and relocation, a warning
//!   when deferred actions exceed their budget.
//! - `serde`: serde support for `NodeId`, `SelectionMode`, `TreeViewConfig` and
//!   `TreeViewSnapshot`.

mod action;
mod change;
mod config;
mod context;
mod edit;
mod editing;
mod glyphs;
mod model;
pub mod prelude;
mod rows;
mod selection;
mod store;
mod style;
mod view;
mod widget;

pub use action::{ActionQueue, TreeAction, TreeEvent};
pub use change::{ChangeRecord, ListChange, ListenerId, RowsChanged, ValueChange};
pub use config::{TreeViewConfig, TreeViewSnapshot};
pub use context::TreeRowContext;
pub use edit::{TreeEdit, TreeError};
pub use editing::EditEvent;
pub use glyphs::{
    DisplayLabel, TreeCellRenderer, TreeGlyphs, TreeLabel, TreeLabelProvider, tree_label_line,
    tree_name_cell,
};
pub use model::TreeModel;
pub use rows::{VisibleRow, VisibleRows};
pub use selection::{FocusModel, SelectionMode, SelectionModel};
pub use store::{NodeId, TreeStore};
pub use style::{TreeScrollPolicy, TreeViewStyle};
pub use view::TreeView;
pub use widget::{TreeViewWidget, TreeViewport};
