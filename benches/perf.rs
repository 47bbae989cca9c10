//! Benchmarks for row flattening and the view's sync pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use tui_treeview::VisibleRows;
use tui_treeview::prelude::*;

/// Build a fully expanded tree with `fanout` children per branch, `depth` levels deep.
fn make_store(fanout: usize, depth: usize) -> (TreeStore<usize>, Vec<NodeId>) {
    let (mut store, root) = TreeStore::with_root(0);
    store.set_expanded(root, true).unwrap();
    let mut branches = vec![root];
    let mut level = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        for &parent in &level {
            for _ in 0..fanout {
                let child = store.add_child(parent, store.len()).unwrap();
                store.set_expanded(child, true).unwrap();
                next.push(child);
            }
        }
        branches.extend(next.iter().copied());
        level = next;
    }
    (store, branches)
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows/rebuild");

    for (fanout, depth) in [(10, 2), (10, 3), (20, 3)] {
        let (store, _) = make_store(fanout, depth);
        let mut rows = VisibleRows::new();
        group.bench_with_input(
            BenchmarkId::new("expanded", store.len()),
            &store,
            |b, store| {
                b.iter(|| {
                    rows.rebuild(store, true);
                    black_box(rows.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_index_lookup(c: &mut Criterion) {
    let (store, nodes) = make_store(20, 3);
    let rows = VisibleRows::compute(&store, true);

    c.bench_function("rows/index_of", |b| {
        b.iter(|| {
            for &id in nodes.iter().step_by(97) {
                black_box(rows.index_of(id));
            }
        });
    });
}

fn bench_select(c: &mut Criterion) {
    let (store, _) = make_store(20, 3);
    let mut view = TreeView::new(store);
    let last = view.row_count() - 1;

    c.bench_function("view/select_next", |b| {
        b.iter(|| {
            if !view.select_next() || view.selected_index() == Some(last) {
                view.select_first();
            }
        });
    });
}

fn bench_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/collapse");

    for selected in [1, 2_000, 8_000] {
        group.bench_with_input(
            BenchmarkId::new("with_selection", selected),
            &selected,
            |b, &selected| {
                b.iter_batched(
                    || {
                        let (store, nodes) = make_store(20, 3);
                        let mut view = TreeView::new(store);
                        view.set_selection_mode(SelectionMode::Multiple);
                        view.select_range(1, selected + 1);
                        (view, nodes[1])
                    },
                    |(mut view, branch)| {
                        view.set_expanded(branch, false).unwrap();
                        black_box(view.selected_index())
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_rebuild,
    bench_index_lookup,
    bench_select,
    bench_collapse
);
criterion_main!(benches);
