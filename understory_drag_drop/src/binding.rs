// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element bindings.
//!
//! A binding connects one host node to the engine for the node's lifetime:
//!
//! 1. [`set_node`](DraggableBinding::set_node) once the node exists,
//! 2. [`mount`](DraggableBinding::mount) to register it (measured at that moment)
//!    and attach activator listeners,
//! 3. [`sync`](DraggableBinding::sync) after engine changes to write the visual offset
//!    (and, for draggables, to pick up sensors registered since mount),
//! 4. [`unmount`](DraggableBinding::unmount) to detach and deregister.
//!
//! `sync` is cheap to call often: it does nothing unless the engine revision
//! moved and the transform differs from the last one written. An identity
//! transform removes the property instead of writing a zero offset.

use core::fmt::Debug;

use crate::DragDrop;
use crate::element::{Element, StyleTarget};
use crate::item::{ItemKind, NewItem};
use crate::layout::{Transform, element_layout};
use crate::listeners::Listeners;
use crate::style::{TRANSFORM_PROPERTY, transform_value};

/// Writes an item's transform to a node, skipping redundant writes.
///
/// Used by the bindings here; exposed for bindings built elsewhere, such as a
/// sortable item that decides itself which transform to show.
#[derive(Clone, Debug, Default)]
pub struct TransformWriter {
    seen_revision: Option<u64>,
    written: Option<Transform>,
}

impl TransformWriter {
    /// A writer that has written nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `revision` has not been seen yet. Records it.
    pub fn observe(&mut self, revision: u64) -> bool {
        if self.seen_revision == Some(revision) {
            return false;
        }
        self.seen_revision = Some(revision);
        true
    }

    /// Write `transform` to `target` if it changed. Returns whether anything was written.
    pub fn write<T: StyleTarget + ?Sized>(&mut self, target: &T, transform: Transform) -> bool {
        if self.written == Some(transform) {
            return false;
        }
        self.written = Some(transform);
        if transform == Transform::ZERO {
            target.remove_style_property(TRANSFORM_PROPERTY);
        } else {
            target.set_style_property(TRANSFORM_PROPERTY, &transform_value(transform));
        }
        true
    }

    /// Forget the last write, forcing the next [`write`](Self::write).
    pub fn reset(&mut self) {
        self.seen_revision = None;
        self.written = None;
    }
}

/// Binds a node as a draggable.
#[derive(Clone, Debug)]
pub struct DraggableBinding<K, N, D = ()> {
    id: K,
    data: D,
    node: Option<N>,
    skip_transform: bool,
    mounted: bool,
    listeners: Option<Listeners<K>>,
    writer: TransformWriter,
}

impl<K, N, D> DraggableBinding<K, N, D>
where
    K: Copy + Eq + Debug + 'static,
    N: Element + StyleTarget + 'static,
    D: Clone + 'static,
{
    /// A binding for draggable `id` carrying `data`.
    pub fn new(id: K, data: D) -> Self {
        Self {
            id,
            data,
            node: None,
            skip_transform: false,
            mounted: false,
            listeners: None,
            writer: TransformWriter::default(),
        }
    }

    /// Leave the node's transform alone. Used when something else positions it.
    #[must_use]
    pub fn with_skip_transform(mut self, skip: bool) -> Self {
        self.skip_transform = skip;
        self
    }

    /// Draggable id.
    pub fn id(&self) -> K {
        self.id
    }

    /// The bound node, once set.
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    /// Attach the host node.
    pub fn set_node(&mut self, node: N) {
        self.node = Some(node);
        self.writer.reset();
    }

    /// Whether [`mount`](Self::mount) ran without a matching unmount.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Register with `dnd` and attach activator listeners.
    ///
    /// Does nothing until a node is set.
    pub fn mount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        let Some(node) = &self.node else {
            tracing::debug!(id = ?self.id, "draggable mounted without a node");
            return;
        };
        dnd.add_draggable(NewItem {
            id: self.id,
            node: node.clone(),
            layout: element_layout(node),
            data: self.data.clone(),
        });
        let listeners = dnd.draggable_activators(self.id, false);
        for name in listeners.names() {
            node.add_event_listener(name);
        }
        self.listeners = Some(listeners);
        self.mounted = true;
    }

    /// Detach listeners and request removal.
    pub fn unmount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        if let (Some(node), Some(listeners)) = (&self.node, self.listeners.take()) {
            for name in listeners.names() {
                node.remove_event_listener(name);
            }
        }
        dnd.remove_draggable(self.id);
        self.mounted = false;
    }

    /// Listeners currently attached to the node.
    pub fn listeners(&self) -> Option<&Listeners<K>> {
        self.listeners.as_ref()
    }

    /// Re-read the activators from `dnd`, detaching event names no sensor
    /// listens for any more and attaching new ones.
    ///
    /// Returns whether the node's listeners changed. [`sync`](Self::sync) calls
    /// this, so sensors registered after mount still reach the node.
    pub fn refresh_listeners(&mut self, dnd: &DragDrop<K, N, D>) -> bool {
        let (true, Some(node)) = (self.mounted, &self.node) else {
            return false;
        };
        let next = dnd.draggable_activators(self.id, false);
        let previous = self.listeners.replace(next.clone());
        let previous = previous.as_ref();
        let mut changed = false;
        for name in previous.into_iter().flat_map(|l| l.names()) {
            if next.get_by_name(name).is_none() {
                node.remove_event_listener(name);
                changed = true;
            }
        }
        for name in next.names() {
            if previous.and_then(|l| l.get_by_name(name)).is_none() {
                node.add_event_listener(name);
                changed = true;
            }
        }
        if changed {
            tracing::trace!(id = ?self.id, "draggable listeners refreshed");
        }
        changed
    }

    /// Activators keyed by handler name (`onpointerdown`), for spreading onto a
    /// drag handle other than the node itself.
    pub fn drag_activators(&self, dnd: &DragDrop<K, N, D>) -> Listeners<K> {
        dnd.draggable_activators(self.id, true)
    }

    /// Whether this draggable is being dragged.
    pub fn is_active_draggable(&self, dnd: &DragDrop<K, N, D>) -> bool {
        dnd.active_draggable_id() == Some(self.id)
    }

    /// The draggable's current transform, identity if unregistered.
    pub fn transform(&self, dnd: &DragDrop<K, N, D>) -> Transform {
        dnd.transform_of(ItemKind::Draggable, self.id)
            .unwrap_or(Transform::ZERO)
    }

    /// Refresh the activator listeners, then write the current transform to
    /// the node if it changed. Returns whether the transform was written.
    pub fn sync(&mut self, dnd: &DragDrop<K, N, D>) -> bool {
        if !self.writer.observe(dnd.revision()) {
            return false;
        }
        self.refresh_listeners(dnd);
        if self.skip_transform {
            return false;
        }
        let transform = self.transform(dnd);
        match &self.node {
            Some(node) => self.writer.write(node, transform),
            None => false,
        }
    }
}

/// Binds a node as a droppable.
#[derive(Clone, Debug)]
pub struct DroppableBinding<K, N, D = ()> {
    id: K,
    data: D,
    node: Option<N>,
    skip_transform: bool,
    mounted: bool,
    writer: TransformWriter,
}

impl<K, N, D> DroppableBinding<K, N, D>
where
    K: Copy + Eq + Debug + 'static,
    N: Element + StyleTarget + 'static,
    D: Clone + 'static,
{
    /// A binding for droppable `id` carrying `data`.
    pub fn new(id: K, data: D) -> Self {
        Self {
            id,
            data,
            node: None,
            skip_transform: false,
            mounted: false,
            writer: TransformWriter::default(),
        }
    }

    /// Leave the node's transform alone.
    #[must_use]
    pub fn with_skip_transform(mut self, skip: bool) -> Self {
        self.skip_transform = skip;
        self
    }

    /// Droppable id.
    pub fn id(&self) -> K {
        self.id
    }

    /// The bound node, once set.
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    /// Attach the host node.
    pub fn set_node(&mut self, node: N) {
        self.node = Some(node);
        self.writer.reset();
    }

    /// Whether [`mount`](Self::mount) ran without a matching unmount.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Register with `dnd`. Does nothing until a node is set.
    pub fn mount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        let Some(node) = &self.node else {
            tracing::debug!(id = ?self.id, "droppable mounted without a node");
            return;
        };
        dnd.add_droppable(NewItem {
            id: self.id,
            node: node.clone(),
            layout: element_layout(node),
            data: self.data.clone(),
        });
        self.mounted = true;
    }

    /// Request removal.
    pub fn unmount(&mut self, dnd: &mut DragDrop<K, N, D>) {
        dnd.remove_droppable(self.id);
        self.mounted = false;
    }

    /// Whether the drag is over this droppable.
    pub fn is_active_droppable(&self, dnd: &DragDrop<K, N, D>) -> bool {
        dnd.active_droppable_id() == Some(self.id)
    }

    /// The droppable's current transform, identity if unregistered.
    pub fn transform(&self, dnd: &DragDrop<K, N, D>) -> Transform {
        dnd.transform_of(ItemKind::Droppable, self.id)
            .unwrap_or(Transform::ZERO)
    }

    /// Write the current transform to the node if it changed.
    pub fn sync(&mut self, dnd: &DragDrop<K, N, D>) -> bool {
        if self.skip_transform || !self.writer.observe(dnd.revision()) {
            return false;
        }
        let transform = self.transform(dnd);
        match &self.node {
            Some(node) => self.writer.write(node, transform),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Point, Rect};

    use crate::item::ActivatorEvent;

    #[derive(Debug, PartialEq)]
    enum Op {
        Set(String, String),
        Remove(String),
        Listen(String),
        Unlisten(String),
    }

    #[derive(Clone, Debug)]
    struct Node {
        id: u32,
        rect: Rect,
        ops: Rc<RefCell<Vec<Op>>>,
    }

    impl Node {
        fn new(id: u32, x: f64) -> Self {
            Self {
                id,
                rect: Rect::new(x, 0.0, x + 10.0, 10.0),
                ops: Rc::default(),
            }
        }

        fn take(&self) -> Vec<Op> {
            core::mem::take(&mut *self.ops.borrow_mut())
        }
    }

    impl PartialEq for Node {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl Eq for Node {}
    impl core::hash::Hash for Node {
        fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }
    impl Element for Node {
        fn bounding_rect(&self) -> Rect {
            self.rect
        }
    }
    impl StyleTarget for Node {
        fn set_style_property(&self, name: &str, value: &str) {
            self.ops.borrow_mut().push(Op::Set(name.into(), value.into()));
        }
        fn remove_style_property(&self, name: &str) {
            self.ops.borrow_mut().push(Op::Remove(name.into()));
        }
        fn add_event_listener(&self, event: &str) {
            self.ops.borrow_mut().push(Op::Listen(event.into()));
        }
        fn remove_event_listener(&self, event: &str) {
            self.ops.borrow_mut().push(Op::Unlisten(event.into()));
        }
    }

    fn engine() -> DragDrop<u32, Node> {
        let mut dnd = DragDrop::default();
        dnd.add_sensor(100, [ActivatorEvent::PointerDown]);
        dnd
    }

    #[test]
    fn mount_registers_and_attaches_listeners() {
        let mut dnd = engine();
        let node = Node::new(1, 20.0);
        let mut binding = DraggableBinding::new(1, ());
        binding.mount(&mut dnd);
        assert!(!binding.is_mounted(), "no node yet");

        binding.set_node(node.clone());
        binding.mount(&mut dnd);
        assert!(binding.is_mounted());
        assert_eq!(
            dnd.draggable(1).map(|d| d.layout().x()),
            Some(20.0)
        );
        assert_eq!(node.take(), [Op::Listen("pointerdown".into())]);
        assert!(
            binding
                .drag_activators(&dnd)
                .get_by_name("onpointerdown")
                .is_some()
        );

        binding.unmount(&mut dnd);
        assert_eq!(node.take(), [Op::Unlisten("pointerdown".into())]);
        dnd.run_deferred();
        assert!(dnd.draggable(1).is_none());
    }

    #[test]
    fn sensors_added_after_mount_reach_the_node() {
        let mut dnd: DragDrop<u32, Node> = DragDrop::default();
        let node = Node::new(1, 0.0);
        let mut binding = DraggableBinding::new(1, ());
        binding.set_node(node.clone());
        binding.mount(&mut dnd);
        assert!(node.take().is_empty(), "no sensors yet");

        dnd.add_sensor(100, [ActivatorEvent::PointerDown]);
        binding.sync(&dnd);
        assert_eq!(
            node.take(),
            [
                Op::Listen("pointerdown".into()),
                Op::Remove("transform".into())
            ]
        );

        // A second sensor on the same event changes nothing on the node.
        dnd.add_sensor(200, [ActivatorEvent::PointerDown]);
        assert!(!binding.refresh_listeners(&dnd));
        assert_eq!(
            binding
                .listeners()
                .and_then(|l| l.get_by_name("pointerdown"))
                .map(|l| l.sensors.as_slice()),
            Some(&[100, 200][..])
        );

        dnd.remove_sensor(100);
        dnd.remove_sensor(200);
        assert!(binding.refresh_listeners(&dnd));
        assert_eq!(node.take(), [Op::Unlisten("pointerdown".into())]);

        binding.unmount(&mut dnd);
        assert!(node.take().is_empty());
    }

    #[test]
    fn sync_writes_only_changes() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0);
        let mut binding = DraggableBinding::new(1, ());
        binding.set_node(node.clone());
        binding.mount(&mut dnd);
        node.take();

        // Identity on first sync clears any stale property.
        assert!(binding.sync(&dnd));
        assert_eq!(node.take(), [Op::Remove("transform".into())]);
        assert!(!binding.sync(&dnd));

        dnd.sensor_start(100, Point::ZERO);
        dnd.drag_start(1);
        dnd.sensor_move(Point::new(4.0, 2.0));
        assert!(binding.is_active_draggable(&dnd));
        assert!(binding.sync(&dnd));
        assert_eq!(
            node.take(),
            [Op::Set("transform".into(), "translate3d(4px, 2px, 0)".into())]
        );

        // A revision bump that leaves the transform alone writes nothing.
        dnd.add_sensor(200, []);
        assert!(!binding.sync(&dnd));
        assert!(node.take().is_empty());

        dnd.drag_end();
        assert!(binding.sync(&dnd));
        assert_eq!(node.take(), [Op::Remove("transform".into())]);
    }

    #[test]
    fn skip_transform_never_writes() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0);
        let mut binding = DroppableBinding::new(1, ()).with_skip_transform(true);
        binding.set_node(node.clone());
        binding.mount(&mut dnd);
        dnd.add_transformer(
            ItemKind::Droppable,
            1,
            crate::Transformer::offset(crate::TransformerId::Custom(0), kurbo::Vec2::new(1.0, 0.0)),
        );
        assert!(!binding.sync(&dnd));
        assert!(node.take().is_empty());
        assert_eq!(binding.transform(&dnd), kurbo::Vec2::new(1.0, 0.0));
    }

    #[test]
    fn droppable_reports_active_state() {
        let mut dnd = engine();
        let mut draggable = DraggableBinding::new(1, ());
        draggable.set_node(Node::new(1, 0.0));
        draggable.mount(&mut dnd);
        let mut droppable = DroppableBinding::new(2, ());
        droppable.set_node(Node::new(2, 0.0));
        droppable.mount(&mut dnd);

        dnd.sensor_start(100, Point::ZERO);
        dnd.drag_start(1);
        assert!(droppable.is_active_droppable(&dnd));
        droppable.unmount(&mut dnd);
        dnd.run_deferred();
        assert!(!droppable.is_active_droppable(&dnd));
    }
}
