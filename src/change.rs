use std::hash::Hash;

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// One sub-change of a [`ListChange`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeRecord<T> {
    /// Entries that left the list, in their previous order.
    Removed(Vec<T>),
    /// Entries that joined the list, in their new order.
    Added(Vec<T>),
    /// Entries that stayed but moved; `from[i]` became `to[i]`.
    Permuted {
        /// Values before the change.
        from: Vec<T>,
        /// Values after the change.
        to: Vec<T>,
    },
}

/// Everything that happened to an observed list during one mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListChange<T> {
    records: SmallVec<[ChangeRecord<T>; 2]>,
}

impl<T> ListChange<T> {
    /// The sub-changes, removals first.
    pub fn records(&self) -> &[ChangeRecord<T>] {
        &self.records
    }

    /// Returns `true` if anything was added.
    pub fn was_added(&self) -> bool {
        self.records
            .iter()
            .any(|record| matches!(record, ChangeRecord::Added(_)))
    }

    /// Returns `true` if anything was removed.
    pub fn was_removed(&self) -> bool {
        self.records
            .iter()
            .any(|record| matches!(record, ChangeRecord::Removed(_)))
    }

    /// Returns `true` if surviving entries changed position or value.
    pub fn was_permuted(&self) -> bool {
        self.records
            .iter()
            .any(|record| matches!(record, ChangeRecord::Permuted { .. }))
    }

    /// Iterates over every added entry.
    pub fn added(&self) -> impl Iterator<Item = &T> {
        self.records.iter().flat_map(|record| match record {
            ChangeRecord::Added(items) => items.as_slice(),
            _ => &[][..],
        })
    }

    /// Iterates over every removed entry.
    pub fn removed(&self) -> impl Iterator<Item = &T> {
        self.records.iter().flat_map(|record| match record {
            ChangeRecord::Removed(items) => items.as_slice(),
            _ => &[][..],
        })
    }

    fn from_records(records: SmallVec<[ChangeRecord<T>; 2]>) -> Option<Self> {
        (!records.is_empty()).then_some(Self { records })
    }
}

impl<T: Copy + Eq + Hash> ListChange<T> {
    /// Diffs two ordered sets of items.
    ///
    /// Returns `None` when both lists are identical. A reordering of the same
    /// members yields a single `Permuted` record.
    pub(crate) fn between(before: &[T], after: &[T]) -> Option<Self> {
        if before == after {
            return None;
        }
        let before_set: FxHashSet<T> = before.iter().copied().collect();
        let after_set: FxHashSet<T> = after.iter().copied().collect();

        let mut records = SmallVec::new();
        let removed: Vec<T> = before
            .iter()
            .copied()
            .filter(|item| !after_set.contains(item))
            .collect();
        let added: Vec<T> = after
            .iter()
            .copied()
            .filter(|item| !before_set.contains(item))
            .collect();
        let kept_before: Vec<T> = before
            .iter()
            .copied()
            .filter(|item| after_set.contains(item))
            .collect();
        let kept_after: Vec<T> = after
            .iter()
            .copied()
            .filter(|item| before_set.contains(item))
            .collect();

        if !removed.is_empty() {
            records.push(ChangeRecord::Removed(removed));
        }
        if !added.is_empty() {
            records.push(ChangeRecord::Added(added));
        }
        if kept_before != kept_after {
            records.push(ChangeRecord::Permuted {
                from: kept_before,
                to: kept_after,
            });
        }
        Self::from_records(records)
    }
}

impl ListChange<usize> {
    /// Diffs the row indices of two keyed selections.
    ///
    /// `before` and `after` pair each visible selected node with its row and
    /// are sorted by row. Keys decide membership; rows are what is reported,
    /// so a node that merely moved produces a `Permuted` record.
    pub(crate) fn between_indexed<K: Copy + Eq + Hash>(
        before: &[(K, usize)],
        after: &[(K, usize)],
    ) -> Option<Self> {
        if before == after {
            return None;
        }
        let before_rows: FxHashMap<K, usize> = before.iter().copied().collect();
        let after_rows: FxHashMap<K, usize> = after.iter().copied().collect();

        let mut records = SmallVec::new();
        let removed: Vec<usize> = before
            .iter()
            .filter(|(key, _)| !after_rows.contains_key(key))
            .map(|&(_, row)| row)
            .collect();
        let added: Vec<usize> = after
            .iter()
            .filter(|(key, _)| !before_rows.contains_key(key))
            .map(|&(_, row)| row)
            .collect();
        let mut from = Vec::new();
        let mut to = Vec::new();
        for &(key, row) in before {
            if let Some(&new_row) = after_rows.get(&key) {
                from.push(row);
                to.push(new_row);
            }
        }

        if !removed.is_empty() {
            records.push(ChangeRecord::Removed(removed));
        }
        if !added.is_empty() {
            records.push(ChangeRecord::Added(added));
        }
        if from != to {
            records.push(ChangeRecord::Permuted { from, to });
        }
        Self::from_records(records)
    }
}

/// Old and new value of a single observed property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueChange<T> {
    /// Value before the mutation.
    pub old: T,
    /// Value after the mutation.
    pub new: T,
}

impl<T: PartialEq> ValueChange<T> {
    pub(crate) fn between(old: T, new: T) -> Option<Self> {
        (old != new).then_some(Self { old, new })
    }
}

/// Row count change together with the new row order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowsChanged<Id> {
    /// Row count before the mutation.
    pub old_count: usize,
    /// Node ids of the new rows, in display order.
    pub rows: Vec<Id>,
}

impl<Id> RowsChanged<Id> {
    /// Row count after the mutation.
    pub fn new_count(&self) -> usize {
        self.rows.len()
    }
}

/// Handle returned by listener registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

/// Registered callbacks for one channel, called in registration order.
pub(crate) struct Listeners<E> {
    entries: Vec<(ListenerId, Callback<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub(crate) fn add(&mut self, id: ListenerId, callback: Callback<E>) {
        self.entries.push((id, callback));
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let len = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }
}

/// Every channel a tree view publishes.
pub(crate) struct ViewListeners<Id> {
    next_id: u64,
    pub(crate) rows: Listeners<RowsChanged<Id>>,
    pub(crate) selected_items: Listeners<ListChange<Id>>,
    pub(crate) selected_indices: Listeners<ListChange<usize>>,
    pub(crate) selected_item: Listeners<ValueChange<Option<Id>>>,
    pub(crate) selected_index: Listeners<ValueChange<Option<usize>>>,
    pub(crate) focused_item: Listeners<ValueChange<Option<Id>>>,
    pub(crate) focused_index: Listeners<ValueChange<Option<usize>>>,
    pub(crate) edit: Listeners<crate::editing::EditEvent<Id>>,
}

impl<Id> Default for ViewListeners<Id> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Listeners::default(),
            selected_items: Listeners::default(),
            selected_indices: Listeners::default(),
            selected_item: Listeners::default(),
            selected_index: Listeners::default(),
            focused_item: Listeners::default(),
            focused_index: Listeners::default(),
            edit: Listeners::default(),
        }
    }
}

impl<Id> ViewListeners<Id> {
    pub(crate) const fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.rows.remove(id)
            || self.selected_items.remove(id)
            || self.selected_indices.remove(id)
            || self.selected_item.remove(id)
            || self.selected_index.remove(id)
            || self.focused_item.remove(id)
            || self.focused_index.remove(id)
            || self.edit.remove(id)
    }
}
