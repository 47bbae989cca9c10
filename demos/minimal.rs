// Minimal example: a small store rendered with `DisplayLabel` and default styling.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_treeview::{
    DisplayLabel, TreeEdit, TreeError, TreeStore, TreeView, TreeViewWidget, TreeViewport,
};

fn main() -> Result<(), TreeError> {
    // Build a three-node tree: root -> {alpha, beta}.
    let (mut store, root) = TreeStore::with_root("root");
    store.add_child(root, "alpha")?;
    let beta = store.add_child(root, "beta")?;
    store.set_expanded(root, true)?;

    // The view owns the store and tracks selection across edits.
    let mut view = TreeView::new(store);
    view.select(beta);

    // Viewport holds the scroll offset and must live across frames.
    let mut viewport = TreeViewport::new();
    let widget = TreeViewWidget::new(&view, &DisplayLabel);

    // Render into an in-memory buffer (no terminal required for the example).
    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer, &mut viewport);

    for y in 0..area.height {
        let line: String = (0..area.width).map(|x| buffer[(x, y)].symbol()).collect();
        println!("{}", line.trim_end());
    }
    Ok(())
}
