use std::ops::Range;

use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::style::Style;
use ratatui::widgets::{
    Block, Borders, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Table,
    TableState,
};

use crate::context::TreeRowContext;
use crate::glyphs::{TreeCellRenderer, TreeGlyphs};
use crate::model::TreeModel;
use crate::style::{TreeScrollPolicy, TreeViewStyle};
use crate::view::TreeView;

/// Scroll position of a rendered tree; the widget's state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeViewport {
    offset: usize,
}

impl TreeViewport {
    pub const fn new() -> Self {
        Self { offset: 0 }
    }

    /// First rendered row.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub const fn scroll_up_by(&mut self, amount: usize) {
        self.offset = self.offset.saturating_sub(amount);
    }

    pub const fn scroll_down_by(&mut self, amount: usize) {
        self.offset = self.offset.saturating_add(amount);
    }

    /// Moves the offset so `row` is on screen, then clamps it to the content.
    pub fn follow(
        &mut self,
        row: Option<usize>,
        height: usize,
        total: usize,
        policy: TreeScrollPolicy,
    ) {
        let height = height.max(1);
        if let Some(row) = row {
            match policy {
                TreeScrollPolicy::KeepInView => {
                    if row < self.offset {
                        self.offset = row;
                    } else if row >= self.offset + height {
                        self.offset = row + 1 - height;
                    }
                }
                TreeScrollPolicy::CenterOnSelect => {
                    self.offset = row.saturating_sub(height / 2);
                }
            }
        }
        self.offset = self.offset.min(total.saturating_sub(height));
    }
}

/// Renders a [`TreeView`] as a single-column table, one row per visible node.
///
/// Only the rows inside the viewport are built.
pub struct TreeViewWidget<'a, M, R>
where
    M: TreeModel,
    R: TreeCellRenderer<M>,
{
    view: &'a TreeView<M>,
    renderer: &'a R,
    style: TreeViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
}

impl<'a, M, R> TreeViewWidget<'a, M, R>
where
    M: TreeModel,
    R: TreeCellRenderer<M>,
{
    pub fn new(view: &'a TreeView<M>, renderer: &'a R) -> Self {
        Self {
            view,
            renderer,
            style: TreeViewStyle::default(),
            glyphs: TreeGlyphs::unicode(),
        }
    }

    #[must_use]
    pub fn style(mut self, style: TreeViewStyle<'a>) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    fn build_rows(&self, range: Range<usize>) -> Vec<Row<'a>> {
        let view = self.view;
        let model = view.model();
        let focused = view.focused_node();
        let editing = view.editing_node();
        let visible = view.rows().as_slice().get(range).unwrap_or_default();

        let mut rows = Vec::with_capacity(visible.len());
        for row in visible {
            let id = row.id();
            let is_selected = view.is_selected(id);
            let is_editing = editing == Some(id);
            let ctx = TreeRowContext {
                level: row.level(),
                is_tail_stack: row.is_tail_stack(),
                is_expanded: model.is_expanded(id),
                has_children: row.has_children(),
                is_selected,
                is_focused: focused == Some(id),
                is_editing,
                draw_lines: self.style.draw_lines,
                line_style: self.style.line_style,
            };
            let cell = self.renderer.cell(model, id, &ctx, &self.glyphs);
            let row_style = if is_editing {
                self.style.editing_style
            } else if is_selected {
                self.style.selected_style
            } else {
                Style::default()
            };
            rows.push(Row::new([cell]).style(row_style));
        }
        rows
    }

    fn render_scrollbar(&self, area: Rect, buf: &mut Buffer, offset: usize, inner_height: usize) {
        let scroll_len = self
            .view
            .row_count()
            .saturating_sub(inner_height)
            .saturating_add(1);
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(offset.min(scroll_len - 1))
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl<M, R> StatefulWidget for TreeViewWidget<'_, M, R>
where
    M: TreeModel,
    R: TreeCellRenderer<M>,
{
    type State = TreeViewport;

    fn render(self, area: Rect, buf: &mut Buffer, viewport: &mut Self::State) {
        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let total = self.view.row_count();
        let inner_height = block.inner(area).height as usize;
        let focused = self.view.focused_index();
        let target = focused.or_else(|| self.view.selected_index());
        viewport.follow(target, inner_height, total, self.style.scroll_policy);

        let start = viewport.offset().min(total);
        let end = (start + inner_height).min(total);
        let rows = self.build_rows(start..end);
        let mut table_state = TableState::default().with_selected(
            focused
                .filter(|row| (start..end).contains(row))
                .map(|row| row - start),
        );

        let (table_area, table_block, scrollbar_area) =
            if total > inner_height && area.width > 1 {
                let table_area = Rect {
                    width: area.width - 1,
                    ..area
                };
                let scrollbar_area = Rect {
                    x: area.x + area.width - 1,
                    width: 1,
                    ..area
                };
                let mut table_borders = self.style.borders;
                table_borders.remove(Borders::RIGHT);
                (table_area, block.borders(table_borders), Some(scrollbar_area))
            } else {
                (area, block, None)
            };

        let table = Table::new(rows, [Constraint::Percentage(100)])
            .style(self.style.block_style)
            .block(table_block)
            .row_highlight_style(self.style.focus_style)
            .highlight_symbol(self.style.focus_symbol);
        StatefulWidget::render(table, table_area, buf, &mut table_state);

        if let Some(scrollbar_area) = scrollbar_area {
            self.render_scrollbar(scrollbar_area, buf, viewport.offset(), inner_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::TreeEdit;
    use crate::glyphs::DisplayLabel;
    use crate::store::TreeStore;

    fn flat_view(child_count: usize) -> TreeView<TreeStore<String>> {
        let (mut store, root) = TreeStore::with_root("root".to_string());
        for idx in 1..=child_count {
            store.add_child(root, format!("node-{idx}")).unwrap();
        }
        store.set_expanded(root, true).unwrap();
        TreeView::new(store)
    }

    fn line(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn viewport_follows_focused_row() {
        let mut view = flat_view(12);
        view.select_index(10);
        let widget = TreeViewWidget::new(&view, &DisplayLabel);
        let area = Rect::new(0, 0, 24, 6);
        let mut buffer = Buffer::empty(area);
        let mut viewport = TreeViewport::new();

        widget.render(area, &mut buffer, &mut viewport);

        assert_eq!(viewport.offset(), 7);
        assert!(line(&buffer, 1).contains("node-7"));
        assert!(line(&buffer, 4).contains(">> "));
        assert!(line(&buffer, 4).contains("node-10"));
    }

    #[test]
    fn centering_clamps_to_content() {
        let mut viewport = TreeViewport::new();

        viewport.follow(Some(1), 4, 12, TreeScrollPolicy::CenterOnSelect);
        assert_eq!(viewport.offset(), 0);

        viewport.follow(Some(11), 4, 12, TreeScrollPolicy::CenterOnSelect);
        assert_eq!(viewport.offset(), 8);

        viewport.follow(None, 4, 3, TreeScrollPolicy::KeepInView);
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn render_empty_view() {
        let view = TreeView::new(TreeStore::<String>::new());
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);

        TreeViewWidget::new(&view, &DisplayLabel).render(area, &mut buffer, &mut TreeViewport::new());
    }
}
