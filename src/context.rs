use ratatui::style::Style;

/// Per-row facts handed to a [`TreeCellRenderer`](crate::TreeCellRenderer).
#[derive(Clone, Copy, Debug)]
pub struct TreeRowContext<'a> {
    /// Row depth; the first visible level is 0.
    pub level: u16,
    /// For each ancestor level, whether that ancestor was the last sibling.
    pub is_tail_stack: &'a [bool],
    pub is_expanded: bool,
    pub has_children: bool,
    pub is_selected: bool,
    pub is_focused: bool,
    /// The node is in an edit session.
    pub is_editing: bool,
    pub draw_lines: bool,
    pub line_style: Style,
}
