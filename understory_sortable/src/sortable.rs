// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sortable per-item binding.

use core::fmt::Debug;

use kurbo::Vec2;
use understory_drag_drop::{
    DragDrop, DraggableBinding, DroppableBinding, Element, ItemKind, Listeners, StyleTarget,
    Transform, TransformWriter, Transformer, TransformerId,
};

use crate::SortableContext;

/// One item of a sortable list: a draggable and a droppable on the same node.
///
/// Neither inner binding writes transforms. Instead [`sync`](Self::sync) shows
/// the draggable's transform while this item is dragged without an overlay,
/// and otherwise the droppable's, which carries the slot offset.
#[derive(Clone, Debug)]
pub struct Sortable<K, N, D = ()> {
    id: K,
    draggable: DraggableBinding<K, N, D>,
    droppable: DroppableBinding<K, N, D>,
    offset: Option<Vec2>,
    writer: TransformWriter,
}

impl<K, N, D> Sortable<K, N, D>
where
    K: Copy + Eq + Debug + 'static,
    N: Element + StyleTarget + 'static,
    D: Clone + 'static,
{
    /// A sortable item with id `id` carrying `data` in both roles.
    pub fn new(id: K, data: D) -> Self {
        Self {
            id,
            draggable: DraggableBinding::new(id, data.clone()).with_skip_transform(true),
            droppable: DroppableBinding::new(id, data).with_skip_transform(true),
            offset: None,
            writer: TransformWriter::new(),
        }
    }

    /// Item id.
    pub fn id(&self) -> K {
        self.id
    }

    /// Attach the host node to both roles.
    pub fn set_node(&mut self, node: N) {
        self.draggable.set_node(node.clone());
        self.droppable.set_node(node);
        self.writer.reset();
    }

    /// The bound node, once set.
    pub fn node(&self) -> Option<&N> {
        self.draggable.node()
    }

    /// Register both roles and install the slot offset transformer.
    pub fn mount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        self.draggable.mount(dnd);
        self.droppable.mount(dnd);
        if self.droppable.is_mounted() {
            dnd.add_transformer(
                ItemKind::Droppable,
                self.id,
                Transformer::offset(TransformerId::SortableOffset, Vec2::ZERO),
            );
            self.offset = Some(Vec2::ZERO);
        }
    }

    /// Remove the offset transformer and deregister both roles.
    pub fn unmount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        dnd.remove_transformer(ItemKind::Droppable, self.id, TransformerId::SortableOffset);
        self.offset = None;
        self.draggable.unmount(dnd);
        self.droppable.unmount(dnd);
    }

    /// Whether this item is being dragged.
    pub fn is_active_draggable(&self, dnd: &DragDrop<K, N, D>) -> bool {
        self.draggable.is_active_draggable(dnd)
    }

    /// Whether the drag is over this item.
    pub fn is_active_droppable(&self, dnd: &DragDrop<K, N, D>) -> bool {
        self.droppable.is_active_droppable(dnd)
    }

    /// Activators keyed by handler name, see [`DraggableBinding::drag_activators`].
    pub fn drag_activators(&self, dnd: &DragDrop<K, N, D>) -> Listeners<K> {
        self.draggable.drag_activators(dnd)
    }

    /// Offset from this item's own layout to the layout of the item that
    /// initially occupied its current slot.
    pub fn slot_offset(&self, dnd: &DragDrop<K, N, D>, ctx: &SortableContext<K>) -> Vec2 {
        let (Some(initial), Some(current)) = (ctx.initial_index(self.id), ctx.current_index(self.id))
        else {
            return Vec2::ZERO;
        };
        if initial == current {
            return Vec2::ZERO;
        }
        let own = dnd.droppable(self.id).map(|d| d.layout());
        let target = ctx
            .initial_ids()
            .get(current)
            .and_then(|&id| dnd.droppable(id))
            .map(|d| d.layout());
        match (own, target) {
            (Some(own), Some(target)) => {
                Vec2::new(target.x() - own.x(), target.y() - own.y())
            }
            _ => Vec2::ZERO,
        }
    }

    /// The transform this item shows.
    pub fn transform(&self, dnd: &DragDrop<K, N, D>) -> Transform {
        let kind = if self.is_active_draggable(dnd) && dnd.overlay().is_none() {
            ItemKind::Draggable
        } else {
            ItemKind::Droppable
        };
        dnd.transform_of(kind, self.id).unwrap_or(Transform::ZERO)
    }

    /// Refresh the activator listeners and the slot offset from `ctx`, then
    /// write the shown transform to the node if it changed. Returns whether
    /// the transform was written.
    pub fn sync(&mut self, dnd: &mut DragDrop<K, N, D>, ctx: &SortableContext<K>) -> bool {
        self.draggable.sync(dnd);
        if let Some(installed) = self.offset {
            let offset = self.slot_offset(dnd, ctx);
            if offset != installed {
                dnd.add_transformer(
                    ItemKind::Droppable,
                    self.id,
                    Transformer::offset(TransformerId::SortableOffset, offset),
                );
                self.offset = Some(offset);
            }
        }
        if !self.writer.observe(dnd.revision()) {
            return false;
        }
        let transform = self.transform(dnd);
        match self.draggable.node() {
            Some(node) => self.writer.write(node, transform),
            None => false,
        }
    }
}
