// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_sortable --heading-base-level=0

//! Understory Sortable: drag-to-reorder lists on top of `understory_drag_drop`.
//!
//! A sortable list keeps two orders:
//!
//! - the **initial** order, owned by the application and never touched here,
//! - the **sorted** order, a live permutation showing where the dragged item
//!   would land if dropped now.
//!
//! [`SortableContext`] derives the sorted order from the engine's active
//! draggable and droppable. Each [`Sortable`] item is both a draggable and a
//! droppable, and slides itself to its slot in the sorted order with a
//! [`SortableOffset`](understory_drag_drop::TransformerId::SortableOffset)
//! transformer, so the host's node order stays as it is until the drop.
//!
//! ```rust
//! use understory_sortable::move_array_item;
//!
//! assert_eq!(move_array_item(&['a', 'b', 'c', 'd'], 0, 2), ['b', 'c', 'a', 'd']);
//! assert_eq!(move_array_item(&['a', 'b', 'c'], 2, 0), ['c', 'a', 'b']);
//! ```
//!
//! A typical drop handler commits the sorted order:
//!
//! ```rust,ignore
//! dnd.on_drag_end(move |_, event| {
//!     if let Some(target) = &event.droppable {
//!         let from = ids.iter().position(|id| *id == event.draggable.id);
//!         let to = ids.iter().position(|id| *id == target.id);
//!         if let (Some(from), Some(to)) = (from, to) {
//!             ids = move_array_item(&ids, from, to);
//!         }
//!     }
//! });
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod context;
mod sortable;

use alloc::vec::Vec;

pub use context::SortableContext;
pub use sortable::Sortable;

/// Move the element at `from` to index `to`, shifting the elements between.
///
/// Every other element keeps its relative order. An out-of-range `from` leaves
/// the order unchanged; an out-of-range `to` moves the element to the end.
pub fn move_array_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from >= moved.len() {
        return moved;
    }
    let item = moved.remove(from);
    let to = to.min(moved.len());
    moved.insert(to, item);
    moved
}
