use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// How the viewport follows the focused row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TreeScrollPolicy {
    /// Scroll only as far as needed to keep the row on screen.
    #[default]
    KeepInView,
    /// Keep the row in the middle of the viewport where possible.
    CenterOnSelect,
}

/// Visual settings of [`TreeViewWidget`](crate::TreeViewWidget).
#[derive(Clone, Debug)]
pub struct TreeViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    /// Applied to every selected row.
    pub selected_style: Style,
    /// Applied on top of the focused row.
    pub focus_style: Style,
    /// Applied to the row being edited instead of the selection style.
    pub editing_style: Style,
    pub line_style: Style,
    /// Drawn in front of the focused row.
    pub focus_symbol: &'a str,
    pub borders: Borders,
    pub draw_lines: bool,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for TreeViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            selected_style: Style::default(),
            focus_style: Style::default(),
            editing_style: Style::default(),
            line_style: Style::default(),
            focus_symbol: ">> ",
            borders: Borders::ALL,
            draw_lines: true,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}
