use std::borrow::Cow;
use std::fmt::Display;

use ratatui::text::{Line, Span};
use ratatui::widgets::Cell;

use crate::context::TreeRowContext;
use crate::model::TreeModel;
use crate::store::{NodeId, TreeStore};

/// Strings used to draw guides and expanders.
#[derive(Clone, Copy, Debug)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
        }
    }
}

impl<'a> TreeGlyphs<'a> {
    fn expander(&self, ctx: &TreeRowContext<'_>) -> &'a str {
        match (ctx.has_children, ctx.is_expanded) {
            (true, true) => self.expanded,
            (true, false) => self.collapsed,
            (false, _) => self.leaf,
        }
    }
}

/// Text shown for a node, with an optional marker between expander and name.
#[derive(Clone, Debug)]
pub struct TreeLabel<'a> {
    pub name: Cow<'a, str>,
    pub prefix: Option<Cow<'a, str>>,
}

impl<'a> TreeLabel<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Cow<'a, str>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Supplies the text of a node; rendering of guides is done for you.
pub trait TreeLabelProvider<M: TreeModel> {
    fn label<'a>(&'a self, model: &'a M, id: M::Id) -> TreeLabel<'a>;
}

/// Builds the table cell of a row.
pub trait TreeCellRenderer<M: TreeModel> {
    fn cell<'a>(
        &'a self,
        model: &'a M,
        id: M::Id,
        ctx: &TreeRowContext<'_>,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a>;
}

impl<M, P> TreeCellRenderer<M> for P
where
    M: TreeModel,
    P: TreeLabelProvider<M>,
{
    fn cell<'a>(
        &'a self,
        model: &'a M,
        id: M::Id,
        ctx: &TreeRowContext<'_>,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a> {
        tree_name_cell(ctx, self.label(model, id), glyphs)
    }
}

/// Labels [`TreeStore`] nodes with their value's `Display` output.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisplayLabel;

impl<T: Display> TreeLabelProvider<TreeStore<T>> for DisplayLabel {
    fn label<'a>(&'a self, model: &'a TreeStore<T>, id: NodeId) -> TreeLabel<'a> {
        TreeLabel::new(model.value(id).map(ToString::to_string).unwrap_or_default())
    }
}

/// Lays out guides, expander, prefix and name of one row.
pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    label: TreeLabel<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    let TreeLabel { name, prefix } = label;
    let prefix = prefix.filter(|value| !value.is_empty());
    let level = usize::from(ctx.level);
    let mut spans = Vec::with_capacity(level + 5);

    if ctx.draw_lines && level > 0 {
        for (depth, &is_last) in ctx.is_tail_stack.iter().enumerate() {
            let part = match (depth + 1 == level, is_last) {
                (true, true) => glyphs.branch_last,
                (true, false) => glyphs.branch,
                (false, true) => glyphs.indent,
                (false, false) => glyphs.vert,
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    } else {
        spans.extend((0..level).map(|_| Span::raw(glyphs.indent)));
    }

    // Top-level leaves get no bullet.
    let expander = if !ctx.has_children && level == 0 {
        ""
    } else {
        glyphs.expander(ctx)
    };
    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }
    if let Some(prefix) = prefix {
        spans.push(Span::raw(prefix));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(name));
    Line::from(spans)
}

pub fn tree_name_cell<'a>(
    ctx: &TreeRowContext<'_>,
    label: TreeLabel<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Cell<'a> {
    Cell::from(tree_label_line(ctx, label, glyphs))
}
