// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sort-order engine.

use alloc::vec::Vec;
use core::fmt::Debug;

use understory_drag_drop::{DragDrop, Element};

use crate::move_array_item;

/// Initial and drag-influenced orders of one sortable list.
///
/// Call [`update`](Self::update) after engine changes; it only recomputes when
/// the active draggable/droppable pair or the ids changed since the last call.
#[derive(Clone, Debug)]
pub struct SortableContext<K> {
    initial_ids: Vec<K>,
    sorted_ids: Vec<K>,
    observed: Option<(Option<K>, Option<K>)>,
    revision: u64,
}

impl<K> SortableContext<K>
where
    K: Copy + Eq + Debug + 'static,
{
    /// A context over `ids`, both orders equal.
    pub fn new(ids: impl IntoIterator<Item = K>) -> Self {
        let initial_ids: Vec<K> = ids.into_iter().collect();
        Self {
            sorted_ids: initial_ids.clone(),
            initial_ids,
            observed: None,
            revision: 0,
        }
    }

    /// Replace the initial order. The sorted order resets to it.
    pub fn set_ids(&mut self, ids: impl IntoIterator<Item = K>) {
        self.initial_ids = ids.into_iter().collect();
        self.sorted_ids.clone_from(&self.initial_ids);
        self.observed = None;
        self.revision += 1;
    }

    /// The application's order.
    pub fn initial_ids(&self) -> &[K] {
        &self.initial_ids
    }

    /// The live order.
    pub fn sorted_ids(&self) -> &[K] {
        &self.sorted_ids
    }

    /// Position of `id` in the initial order.
    pub fn initial_index(&self, id: K) -> Option<usize> {
        self.initial_ids.iter().position(|i| *i == id)
    }

    /// Position of `id` in the live order.
    pub fn current_index(&self, id: K) -> Option<usize> {
        self.sorted_ids.iter().position(|i| *i == id)
    }

    /// Incremented whenever either order changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Recompute the sorted order from the engine's active pair.
    ///
    /// While a draggable is over a droppable, the draggable's entry moves to the
    /// droppable's initial index. If either id is not part of this list the
    /// order falls back to the initial one; without a drag it always is the
    /// initial one. Returns whether the sorted order changed.
    pub fn update<N, D>(&mut self, dnd: &DragDrop<K, N, D>) -> bool
    where
        N: Element + 'static,
        D: Clone + 'static,
    {
        let pair = (dnd.active_draggable_id(), dnd.active_droppable_id());
        if self.observed == Some(pair) {
            return false;
        }
        self.observed = Some(pair);

        let next = match pair {
            (Some(draggable), Some(droppable)) => {
                match (self.current_index(draggable), self.initial_index(droppable)) {
                    (Some(from), Some(to)) if from != to => {
                        move_array_item(&self.sorted_ids, from, to)
                    }
                    (Some(_), Some(_)) => return false,
                    _ => self.initial_ids.clone(),
                }
            }
            _ => self.initial_ids.clone(),
        };
        if next == self.sorted_ids {
            return false;
        }
        tracing::trace!(sorted = ?next, "sorted order changed");
        self.sorted_ids = next;
        self.revision += 1;
        true
    }
}
