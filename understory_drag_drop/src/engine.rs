// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The coordination engine.
//!
//! [`DragDrop`] owns every registered draggable, droppable and sensor plus the
//! single active-drag slot. All mutation goes through `&mut self` methods; each
//! one is a transaction that bumps [`DragDrop::revision`] and, once the
//! outermost transaction completes, re-evaluates the lifecycle subscriptions
//! (see [`event`](crate::event)).
//!
//! ## Transactions
//!
//! Use [`DragDrop::batch`] when several writes must be observed together. The
//! engine does this itself in [`DragDrop::drag_start`], so subscribers never
//! see an active draggable without its pointer transformer.
//!
//! ## Deferred work
//!
//! Removing an item only marks it; the excision is queued and runs on the next
//! [`DragDrop::run_deferred`], the host's equivalent of a microtask checkpoint.
//! Re-adding the item before then cancels the removal.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use crate::collision::{CollisionContext, CollisionDetector, CollisionItem, most_intersecting};
use crate::element::Element;
use crate::event::{
    DragEvent, DragEventHandler, DragEventKind, Observed, Subscription, SubscriptionId,
};
use crate::item::{
    ActivatorEvent, Coordinates, Draggable, Droppable, Item, ItemKind, ItemSnapshot, NewItem,
    Overlay, OverlaySnapshot, Sensor,
};
use crate::layout::{Layout, Transform, element_layout, layouts_are_equal, transform_layout};
use crate::listeners::Listeners;
use crate::transformer::{Transformer, TransformerId};

/// Upper bound on subscription passes per flush.
const MAX_FLUSH_PASSES: usize = 64;

/// Engine configuration.
#[derive(Copy, Clone, Debug)]
pub struct DragDropConfig<K> {
    /// Picks the droppable under the drag. Defaults to
    /// [`most_intersecting`](crate::collision::most_intersecting).
    pub collision_detector: CollisionDetector<K>,
}

impl<K: Copy + PartialEq> Default for DragDropConfig<K> {
    fn default() -> Self {
        Self {
            collision_detector: most_intersecting,
        }
    }
}

impl<K> DragDropConfig<K> {
    /// Replace the collision detector.
    #[must_use]
    pub fn with_collision_detector(mut self, detector: CollisionDetector<K>) -> Self {
        self.collision_detector = detector;
        self
    }
}

#[derive(Clone, Debug)]
struct Active<K, N> {
    draggable: Option<K>,
    droppable: Option<K>,
    sensor: Option<K>,
    overlay: Option<Overlay<N>>,
}

impl<K, N> Default for Active<K, N> {
    fn default() -> Self {
        Self {
            draggable: None,
            droppable: None,
            sensor: None,
            overlay: None,
        }
    }
}

type DeferredTask<K, N, D> = Box<dyn FnOnce(&mut DragDrop<K, N, D>)>;

/// Drag-and-drop coordination engine for one surface.
///
/// - `K`: id shared by draggables, droppables and sensors.
/// - `N`: host node handle.
/// - `D`: payload carried into events.
///
/// ```
/// use kurbo::{Point, Rect};
/// use understory_drag_drop::{DragDrop, DragDropConfig, Element, Layout, NewItem};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// struct Node(u32);
/// impl Element for Node {
///     fn bounding_rect(&self) -> Rect {
///         Rect::new(0.0, 0.0, 10.0, 10.0)
///     }
/// }
///
/// let mut dnd: DragDrop<u32, Node> = DragDrop::new(DragDropConfig::default());
/// let layout = Layout::new(0.0, 0.0, 10.0, 10.0);
/// dnd.add_draggable(NewItem { id: 1, node: Node(1), layout, data: () });
/// dnd.add_droppable(NewItem { id: 2, node: Node(2), layout, data: () });
/// dnd.add_sensor(0, []);
///
/// dnd.sensor_start(0, Point::new(5.0, 5.0));
/// dnd.drag_start(1);
/// assert_eq!(dnd.active_droppable_id(), Some(2));
///
/// dnd.sensor_move(Point::new(500.0, 500.0));
/// assert_eq!(dnd.active_droppable_id(), None);
///
/// dnd.drag_end();
/// dnd.sensor_end();
/// assert_eq!(dnd.active_draggable_id(), None);
/// ```
pub struct DragDrop<K, N, D = ()> {
    config: DragDropConfig<K>,
    draggables: Vec<Draggable<K, N, D>>,
    droppables: Vec<Droppable<K, N, D>>,
    sensors: Vec<Sensor<K>>,
    active: Active<K, N>,
    subscriptions: Vec<Subscription<K, N, D>>,
    cancelled: SmallVec<[SubscriptionId; 1]>,
    next_subscription: u64,
    deferred: VecDeque<DeferredTask<K, N, D>>,
    revision: u64,
    batch_depth: u32,
    dirty: bool,
    flushing: bool,
}

impl<K: fmt::Debug, N, D> fmt::Debug for DragDrop<K, N, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragDrop")
            .field("draggables", &self.draggables.len())
            .field("droppables", &self.droppables.len())
            .field("sensors", &self.sensors.len())
            .field("active_draggable", &self.active.draggable)
            .field("active_droppable", &self.active.droppable)
            .field("active_sensor", &self.active.sensor)
            .field("has_overlay", &self.active.overlay.is_some())
            .field("subscriptions", &self.subscriptions.len())
            .field("deferred", &self.deferred.len())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl<K, N, D> Default for DragDrop<K, N, D>
where
    K: Copy + Eq + fmt::Debug + 'static,
    N: Element + 'static,
    D: Clone + 'static,
{
    fn default() -> Self {
        Self::new(DragDropConfig::default())
    }
}

impl<K, N, D> DragDrop<K, N, D>
where
    K: Copy + Eq + fmt::Debug + 'static,
    N: Element + 'static,
    D: Clone + 'static,
{
    /// Create an engine.
    ///
    /// Installs the built-in subscribers: collision detection on every move, and
    /// removal of the layout correction when a drag ends.
    pub fn new(config: DragDropConfig<K>) -> Self {
        let mut dnd = Self {
            config,
            draggables: Vec::new(),
            droppables: Vec::new(),
            sensors: Vec::new(),
            active: Active::default(),
            subscriptions: Vec::new(),
            cancelled: SmallVec::new(),
            next_subscription: 0,
            deferred: VecDeque::new(),
            revision: 0,
            batch_depth: 0,
            dirty: false,
            flushing: false,
        };
        dnd.subscribe(
            DragEventKind::Move,
            Box::new(|dnd: &mut Self, _: &DragEvent<K, N, D>| dnd.detect_collisions()),
        );
        dnd.subscribe(
            DragEventKind::End,
            Box::new(|dnd: &mut Self, event: &DragEvent<K, N, D>| {
                dnd.remove_transformer(
                    ItemKind::Draggable,
                    event.draggable.id,
                    TransformerId::LayoutCorrection,
                );
            }),
        );
        dnd
    }

    /// The configuration.
    pub fn config(&self) -> &DragDropConfig<K> {
        &self.config
    }

    /// Incremented by every state change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- Transactions ---

    /// Run `f` as one transaction.
    ///
    /// Subscribers are evaluated once, after the outermost batch returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush();
        }
        result
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.dirty = true;
    }

    fn commit(&mut self) {
        self.touch();
        if self.batch_depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.flushing {
            // The running flush loops until clean.
            return;
        }
        self.flushing = true;
        let mut passes = 0;
        while self.dirty {
            if passes == MAX_FLUSH_PASSES {
                tracing::warn!(
                    passes,
                    "drag-drop subscribers did not settle; dropping remaining notifications"
                );
                self.dirty = false;
                break;
            }
            passes += 1;
            self.dirty = false;

            let mut subscriptions = mem::take(&mut self.subscriptions);
            for subscription in &mut subscriptions {
                if self.cancelled.contains(&subscription.id) {
                    continue;
                }
                if let Some(event) = self.observe(&mut subscription.observed) {
                    (subscription.handler)(self, &event);
                }
            }
            let added = mem::replace(&mut self.subscriptions, subscriptions);
            self.subscriptions.extend(added);
            if !self.cancelled.is_empty() {
                let cancelled = mem::take(&mut self.cancelled);
                self.subscriptions.retain(|s| !cancelled.contains(&s.id));
            }
        }
        self.flushing = false;
    }

    /// Compare current state against `observed`, update it, and produce the
    /// event to deliver if the subscription fires.
    fn observe(&self, observed: &mut Observed<K, N, D>) -> Option<DragEvent<K, N, D>> {
        let active = self.active_draggable().map(|d| d.id);
        match observed {
            Observed::Start(last) => {
                let fire = active.is_some() && active != *last;
                *last = active;
                fire.then(|| self.drag_event(false, false)).flatten()
            }
            Observed::Move(last) => {
                // The layout is the overlay's while one is set, so installing or
                // re-measuring it re-runs collision detection.
                let current = self
                    .active_collision_item()
                    .map(|item| (item.id, self.effective_transform(), item.layout));
                let fire = current.is_some() && current != *last;
                *last = current;
                fire.then(|| self.drag_event(false, true)).flatten()
            }
            Observed::Over(last) => {
                let current = active.map(|id| (id, self.active_droppable().map(|d| d.id)));
                let fire = current.is_some() && current != *last;
                *last = current;
                fire.then(|| self.drag_event(true, true)).flatten()
            }
            Observed::End(last) => {
                let current = active.and_then(|_| self.drag_event(true, true));
                if current.is_none() {
                    return last.take();
                }
                *last = current;
                None
            }
        }
    }

    fn drag_event(&self, with_droppable: bool, with_overlay: bool) -> Option<DragEvent<K, N, D>> {
        let draggable = self.snapshot(ItemKind::Draggable, self.active.draggable?)?;
        let droppable = if with_droppable {
            self.active
                .droppable
                .and_then(|id| self.snapshot(ItemKind::Droppable, id))
        } else {
            None
        };
        let overlay = if with_overlay {
            self.overlay_snapshot()
        } else {
            None
        };
        Some(DragEvent {
            draggable,
            droppable,
            overlay,
        })
    }

    // --- Subscriptions ---

    /// Subscribe to a lifecycle event.
    ///
    /// The subscription is first evaluated when the current (or next)
    /// transaction completes, so subscribing mid-drag reports the drag in
    /// progress.
    pub fn subscribe(
        &mut self,
        kind: DragEventKind,
        handler: DragEventHandler<K, N, D>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            observed: Observed::empty(kind),
            handler,
        });
        self.dirty = true;
        if self.batch_depth == 0 {
            self.flush();
        }
        id
    }

    /// Called when a draggable becomes active.
    pub fn on_drag_start(
        &mut self,
        handler: impl FnMut(&mut Self, &DragEvent<K, N, D>) + 'static,
    ) -> SubscriptionId {
        self.subscribe(DragEventKind::Start, Box::new(handler))
    }

    /// Called when the active item's effective transform changes.
    pub fn on_drag_move(
        &mut self,
        handler: impl FnMut(&mut Self, &DragEvent<K, N, D>) + 'static,
    ) -> SubscriptionId {
        self.subscribe(DragEventKind::Move, Box::new(handler))
    }

    /// Called when the active draggable or droppable changes during a drag.
    pub fn on_drag_over(
        &mut self,
        handler: impl FnMut(&mut Self, &DragEvent<K, N, D>) + 'static,
    ) -> SubscriptionId {
        self.subscribe(DragEventKind::Over, Box::new(handler))
    }

    /// Called once when a drag ends, with the last values seen during it.
    pub fn on_drag_end(
        &mut self,
        handler: impl FnMut(&mut Self, &DragEvent<K, N, D>) + 'static,
    ) -> SubscriptionId {
        self.subscribe(DragEventKind::End, Box::new(handler))
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        if self.flushing && self.subscriptions.len() == before {
            // Taken out by the running flush.
            self.cancelled.push(id);
        }
    }

    // --- Deferred work ---

    /// Queue `task` for the next [`run_deferred`](Self::run_deferred).
    pub fn defer(&mut self, task: impl FnOnce(&mut Self) + 'static) {
        self.deferred.push_back(Box::new(task));
    }

    /// Run queued tasks, including tasks they queue. Returns how many ran.
    pub fn run_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            task(self);
            ran += 1;
        }
        ran
    }

    /// Whether tasks are waiting.
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    // --- Transformers ---

    /// Install `transformer` on an item, replacing one with the same id.
    pub fn add_transformer(&mut self, kind: ItemKind, id: K, transformer: Transformer) {
        let Some(item) = self.item_mut(kind, id) else {
            return;
        };
        item.transformers.insert(transformer);
        self.commit();
    }

    /// Remove a transformer from an item.
    pub fn remove_transformer(&mut self, kind: ItemKind, id: K, transformer: TransformerId) {
        let Some(item) = self.item_mut(kind, id) else {
            return;
        };
        if item.transformers.remove(transformer).is_some() {
            self.commit();
        }
    }

    // --- Draggables and droppables ---

    /// Register a draggable, or update the node, layout and data of an existing one.
    ///
    /// If the updated draggable is being dragged without an overlay, a
    /// [`LayoutCorrection`](TransformerId::LayoutCorrection) transformer keeps it
    /// where it was on screen. The correction is removed when the drag ends.
    pub fn add_draggable(&mut self, item: NewItem<K, N, D>) {
        let id = item.id;
        let correct = self.active.draggable == Some(id) && self.active.overlay.is_none();
        self.batch(|dnd| {
            match dnd.draggables.iter_mut().find(|d| d.id == id) {
                None => {
                    tracing::trace!(?id, "draggable added");
                    dnd.draggables.push(Item::from_new(item));
                }
                Some(existing) => {
                    if correct {
                        let old = existing.layout;
                        let delta = Vec2::new(old.x() - item.layout.x(), old.y() - item.layout.y());
                        let offset = existing
                            .transformers
                            .get(TransformerId::LayoutCorrection)
                            .map_or(delta, |prior| prior.apply(delta, None));
                        tracing::debug!(?id, ?offset, "correcting layout of active draggable");
                        existing
                            .transformers
                            .insert(Transformer::offset(TransformerId::LayoutCorrection, offset));
                    }
                    existing.node = item.node;
                    existing.layout = item.layout;
                    existing.data = item.data;
                    existing.pending_cleanup = false;
                }
            }
            dnd.touch();
        });
        if self.active.draggable.is_some() {
            self.recompute_layouts();
        }
    }

    /// Mark a draggable for removal on the next [`run_deferred`](Self::run_deferred).
    pub fn remove_draggable(&mut self, id: K) {
        self.mark_for_cleanup(ItemKind::Draggable, id);
    }

    /// Register a droppable, or update an existing one.
    pub fn add_droppable(&mut self, item: NewItem<K, N, D>) {
        let id = item.id;
        self.batch(|dnd| {
            match dnd.droppables.iter_mut().find(|d| d.id == id) {
                None => {
                    tracing::trace!(?id, "droppable added");
                    dnd.droppables.push(Item::from_new(item));
                }
                Some(existing) => {
                    existing.node = item.node;
                    existing.layout = item.layout;
                    existing.data = item.data;
                    existing.pending_cleanup = false;
                }
            }
            dnd.touch();
        });
        if self.active.draggable.is_some() {
            self.recompute_layouts();
        }
    }

    /// Mark a droppable for removal on the next [`run_deferred`](Self::run_deferred).
    pub fn remove_droppable(&mut self, id: K) {
        self.mark_for_cleanup(ItemKind::Droppable, id);
    }

    fn mark_for_cleanup(&mut self, kind: ItemKind, id: K) {
        let Some(item) = self.item_mut(kind, id) else {
            return;
        };
        item.pending_cleanup = true;
        self.defer(move |dnd| dnd.cleanup(kind, id));
        self.commit();
    }

    fn cleanup(&mut self, kind: ItemKind, id: K) {
        let Some(index) = self
            .items(kind)
            .iter()
            .position(|item| item.id == id && item.pending_cleanup)
        else {
            return;
        };
        self.batch(|dnd| {
            match kind {
                ItemKind::Draggable => {
                    if dnd.active.draggable == Some(id) {
                        dnd.active.draggable = None;
                    }
                    dnd.draggables.remove(index);
                }
                ItemKind::Droppable => {
                    if dnd.active.droppable == Some(id) {
                        dnd.active.droppable = None;
                    }
                    dnd.droppables.remove(index);
                }
            }
            tracing::trace!(?kind, ?id, "item removed");
            dnd.touch();
        });
    }

    // --- Sensors ---

    /// Register a sensor with the events that can activate it.
    ///
    /// Re-adding resets its coordinates.
    pub fn add_sensor(&mut self, id: K, activators: impl IntoIterator<Item = ActivatorEvent>) {
        let sensor = Sensor {
            id,
            activators: activators.into_iter().collect(),
            coordinates: Coordinates::default(),
        };
        match self.sensors.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = sensor,
            None => self.sensors.push(sensor),
        }
        self.commit();
    }

    /// Remove a sensor, clearing the active sensor if it was this one.
    pub fn remove_sensor(&mut self, id: K) {
        let Some(index) = self.sensors.iter().position(|s| s.id == id) else {
            return;
        };
        if self.active.sensor == Some(id) {
            self.active.sensor = None;
        }
        self.sensors.remove(index);
        self.commit();
    }

    /// Make `id` the active sensor, starting at `coordinates`.
    ///
    /// Unknown sensors are ignored.
    pub fn sensor_start(&mut self, id: K, coordinates: Point) {
        let Some(sensor) = self.sensors.iter_mut().find(|s| s.id == id) else {
            tracing::debug!(?id, "sensor_start for unknown sensor");
            return;
        };
        sensor.coordinates = Coordinates::at(coordinates);
        self.active.sensor = Some(id);
        self.commit();
    }

    /// Update the active sensor's current coordinates.
    pub fn sensor_move(&mut self, coordinates: Point) {
        let Some(id) = self.active.sensor else {
            return;
        };
        let Some(sensor) = self.sensors.iter_mut().find(|s| s.id == id) else {
            return;
        };
        if sensor.coordinates.current == coordinates {
            return;
        }
        sensor.coordinates.current = coordinates;
        self.commit();
    }

    /// Clear the active sensor.
    pub fn sensor_end(&mut self) {
        if self.active.sensor.take().is_some() {
            self.commit();
        }
    }

    // --- Overlay ---

    /// Create the overlay, or update its node and layout.
    pub fn set_overlay(&mut self, node: N, layout: Layout) {
        match &mut self.active.overlay {
            Some(overlay) => {
                overlay.node = node;
                overlay.layout = layout;
            }
            None => self.active.overlay = Some(Overlay { node, layout }),
        }
        self.commit();
    }

    /// Remove the overlay.
    pub fn clear_overlay(&mut self) {
        if self.active.overlay.take().is_some() {
            self.commit();
        }
    }

    // --- Layout and collisions ---

    /// Re-measure every item and the overlay. Returns whether any layout changed.
    ///
    /// A node shared by several items is measured once.
    pub fn recompute_layouts(&mut self) -> bool {
        let mut measured: HashMap<N, Layout> = HashMap::new();
        let mut measure = |node: &N| {
            *measured
                .entry(node.clone())
                .or_insert_with(|| element_layout(node))
        };
        let mut changed = false;
        for item in self.draggables.iter_mut().chain(self.droppables.iter_mut()) {
            let layout = measure(&item.node);
            if !layouts_are_equal(&item.layout, &layout) {
                item.layout = layout;
                changed = true;
            }
        }
        if let Some(overlay) = &mut self.active.overlay {
            let layout = measure(&overlay.node);
            if !layouts_are_equal(&overlay.layout, &layout) {
                overlay.layout = layout;
                changed = true;
            }
        }
        tracing::trace!(changed, "layouts recomputed");
        if changed {
            self.commit();
        }
        changed
    }

    /// Run the configured detector and update the active droppable.
    ///
    /// The active item is the overlay if one is set, otherwise the active
    /// draggable. Does nothing when no draggable is active.
    pub fn detect_collisions(&mut self) {
        let Some(active) = self.active_collision_item() else {
            return;
        };
        let candidates: Vec<CollisionItem<K>> = self
            .droppables
            .iter()
            .map(|droppable| {
                let transform = self.item_transform(ItemKind::Droppable, droppable);
                CollisionItem::with_transformed(
                    droppable.id,
                    droppable.layout,
                    transform_layout(&droppable.layout, transform),
                )
            })
            .collect();
        let context = CollisionContext {
            active_droppable: self.active.droppable,
        };
        let next = (self.config.collision_detector)(&active, &candidates, &context);
        if next != self.active.droppable {
            tracing::debug!(from = ?self.active.droppable, to = ?next, "active droppable changed");
            self.active.droppable = next;
            self.commit();
        }
    }

    fn active_collision_item(&self) -> Option<CollisionItem<K>> {
        let draggable = self.active_draggable()?;
        match &self.active.overlay {
            Some(overlay) => Some(CollisionItem::with_transformed(
                draggable.id,
                overlay.layout,
                transform_layout(&overlay.layout, self.overlay_transform_unchecked()),
            )),
            None => {
                let transform = self.item_transform(ItemKind::Draggable, draggable);
                Some(CollisionItem::with_transformed(
                    draggable.id,
                    draggable.layout,
                    transform_layout(&draggable.layout, transform),
                ))
            }
        }
    }

    // --- Activators ---

    /// Per activating event, the sensors that can start a drag of `draggable`.
    ///
    /// With `as_handlers`, names carry an `on` prefix (`onpointerdown`).
    pub fn draggable_activators(&self, draggable: K, as_handlers: bool) -> Listeners<K> {
        let mut listeners = Listeners::new(draggable, as_handlers);
        for sensor in &self.sensors {
            for &event in &sensor.activators {
                listeners.push(event, sensor.id);
            }
        }
        listeners
    }

    // --- Drag session ---

    /// Start dragging `id`.
    ///
    /// Re-measures layouts, then activates the draggable together with its
    /// [`SensorMove`](TransformerId::SensorMove) transformer, then detects
    /// collisions. Unknown draggables are ignored.
    pub fn drag_start(&mut self, id: K) {
        if self.draggable(id).is_none() {
            tracing::debug!(?id, "drag_start for unknown draggable");
            return;
        }
        self.recompute_layouts();
        self.batch(|dnd| {
            dnd.active.draggable = Some(id);
            dnd.touch();
            dnd.add_transformer(ItemKind::Draggable, id, Transformer::sensor_move());
        });
        tracing::debug!(?id, "drag started");
        self.detect_collisions();
    }

    /// End the current drag.
    pub fn drag_end(&mut self) {
        let ended = self.active.draggable;
        self.batch(|dnd| {
            if let Some(id) = ended {
                dnd.remove_transformer(ItemKind::Draggable, id, TransformerId::SensorMove);
            }
            dnd.active.draggable = None;
            dnd.active.droppable = None;
            dnd.touch();
        });
        tracing::debug!(id = ?ended, "drag ended");
        self.recompute_layouts();
    }

    // --- Getters ---

    fn items(&self, kind: ItemKind) -> &Vec<Item<K, N, D>> {
        match kind {
            ItemKind::Draggable => &self.draggables,
            ItemKind::Droppable => &self.droppables,
        }
    }

    fn item_mut(&mut self, kind: ItemKind, id: K) -> Option<&mut Item<K, N, D>> {
        let items = match kind {
            ItemKind::Draggable => &mut self.draggables,
            ItemKind::Droppable => &mut self.droppables,
        };
        items.iter_mut().find(|item| item.id == id)
    }

    /// Look up an item of either kind.
    pub fn item(&self, kind: ItemKind, id: K) -> Option<&Item<K, N, D>> {
        self.items(kind).iter().find(|item| item.id == id)
    }

    /// Look up a draggable.
    pub fn draggable(&self, id: K) -> Option<&Draggable<K, N, D>> {
        self.item(ItemKind::Draggable, id)
    }

    /// Look up a droppable.
    pub fn droppable(&self, id: K) -> Option<&Droppable<K, N, D>> {
        self.item(ItemKind::Droppable, id)
    }

    /// Look up a sensor.
    pub fn sensor(&self, id: K) -> Option<&Sensor<K>> {
        self.sensors.iter().find(|s| s.id == id)
    }

    /// Draggables in registration order, including ones pending removal.
    pub fn draggables(&self) -> impl Iterator<Item = &Draggable<K, N, D>> {
        self.draggables.iter()
    }

    /// Droppables in registration order, including ones pending removal.
    pub fn droppables(&self) -> impl Iterator<Item = &Droppable<K, N, D>> {
        self.droppables.iter()
    }

    /// Sensors in registration order.
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor<K>> {
        self.sensors.iter()
    }

    /// Id of the draggable being dragged.
    pub fn active_draggable_id(&self) -> Option<K> {
        self.active.draggable
    }

    /// Id of the droppable under the drag.
    pub fn active_droppable_id(&self) -> Option<K> {
        self.active.droppable
    }

    /// Id of the sensor tracking the pointer.
    pub fn active_sensor_id(&self) -> Option<K> {
        self.active.sensor
    }

    /// The draggable being dragged.
    pub fn active_draggable(&self) -> Option<&Draggable<K, N, D>> {
        self.draggable(self.active.draggable?)
    }

    /// The droppable under the drag.
    pub fn active_droppable(&self) -> Option<&Droppable<K, N, D>> {
        self.droppable(self.active.droppable?)
    }

    /// The sensor tracking the pointer.
    pub fn active_sensor(&self) -> Option<&Sensor<K>> {
        self.sensor(self.active.sensor?)
    }

    /// The overlay, if set.
    pub fn overlay(&self) -> Option<&Overlay<N>> {
        self.active.overlay.as_ref()
    }

    // --- Derived transforms ---

    fn sensor_delta(&self) -> Option<Vec2> {
        self.active_sensor().map(|s| s.coordinates.delta())
    }

    fn item_transform(&self, kind: ItemKind, item: &Item<K, N, D>) -> Transform {
        if kind == ItemKind::Draggable && self.active.overlay.is_some() {
            // The overlay moves instead.
            return Vec2::ZERO;
        }
        item.transformers.fold(self.sensor_delta(), &[])
    }

    fn overlay_transform_unchecked(&self) -> Transform {
        match self.active_draggable() {
            Some(draggable) => draggable
                .transformers
                .fold(self.sensor_delta(), &[TransformerId::LayoutCorrection]),
            None => Vec2::ZERO,
        }
    }

    fn effective_transform(&self) -> Transform {
        if self.active.overlay.is_some() {
            return self.overlay_transform_unchecked();
        }
        match self.active_draggable() {
            Some(draggable) => self.item_transform(ItemKind::Draggable, draggable),
            None => Vec2::ZERO,
        }
    }

    /// Fold of an item's transformers.
    ///
    /// Draggables report the identity while an overlay is set.
    pub fn transform_of(&self, kind: ItemKind, id: K) -> Option<Transform> {
        let item = self.item(kind, id)?;
        Some(self.item_transform(kind, item))
    }

    /// An item's layout shifted by its transform.
    pub fn transformed_of(&self, kind: ItemKind, id: K) -> Option<Layout> {
        let item = self.item(kind, id)?;
        Some(transform_layout(&item.layout, self.item_transform(kind, item)))
    }

    /// The overlay's transform: the active draggable's transformers, minus
    /// [`LayoutCorrection`](TransformerId::LayoutCorrection).
    pub fn overlay_transform(&self) -> Option<Transform> {
        self.active.overlay.as_ref()?;
        Some(self.overlay_transform_unchecked())
    }

    /// The overlay's layout shifted by its transform.
    pub fn overlay_transformed(&self) -> Option<Layout> {
        let overlay = self.active.overlay.as_ref()?;
        Some(transform_layout(
            &overlay.layout,
            self.overlay_transform_unchecked(),
        ))
    }

    /// Owned view of an item.
    pub fn snapshot(&self, kind: ItemKind, id: K) -> Option<ItemSnapshot<K, N, D>> {
        let item = self.item(kind, id)?;
        let transform = self.item_transform(kind, item);
        Some(ItemSnapshot {
            id,
            node: item.node.clone(),
            layout: item.layout,
            data: item.data.clone(),
            transform,
            transformed: transform_layout(&item.layout, transform),
        })
    }

    /// Owned view of the overlay.
    pub fn overlay_snapshot(&self) -> Option<OverlaySnapshot<K, N, D>> {
        let overlay = self.active.overlay.as_ref()?;
        let transform = self.overlay_transform_unchecked();
        let draggable = self.active_draggable();
        Some(OverlaySnapshot {
            id: draggable.map(|d| d.id),
            node: overlay.node.clone(),
            data: draggable.map(|d| d.data.clone()),
            layout: overlay.layout,
            transform,
            transformed: transform_layout(&overlay.layout, transform),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::{Cell, RefCell};

    use kurbo::Rect;

    use crate::collision::closest_center;

    /// A node whose measured rectangle can be changed from the test.
    #[derive(Clone, Debug)]
    struct Node {
        id: u32,
        rect: Rc<Cell<Rect>>,
    }

    impl Node {
        fn new(id: u32, x: f64, y: f64) -> Self {
            Self {
                id,
                rect: Rc::new(Cell::new(Rect::new(x, y, x + 10.0, y + 10.0))),
            }
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
            self.rect.get()
        }
    }

    type Engine = DragDrop<u32, Node>;

    fn new_item(id: u32, node: &Node) -> NewItem<u32, Node, ()> {
        NewItem {
            id,
            node: node.clone(),
            layout: element_layout(node),
            data: (),
        }
    }

    const SENSOR: u32 = 100;

    fn engine() -> Engine {
        let mut dnd = Engine::default();
        dnd.add_sensor(SENSOR, [ActivatorEvent::PointerDown]);
        dnd
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut dnd = engine();
        let revision = dnd.revision();
        dnd.remove_draggable(1);
        dnd.remove_droppable(1);
        dnd.remove_sensor(1);
        dnd.remove_transformer(ItemKind::Draggable, 1, TransformerId::SensorMove);
        dnd.add_transformer(ItemKind::Droppable, 1, Transformer::sensor_move());
        dnd.sensor_start(1, Point::ZERO);
        dnd.drag_start(1);
        dnd.detect_collisions();
        assert_eq!(dnd.revision(), revision);
        assert!(!dnd.has_deferred());
        assert_eq!(dnd.active_draggable_id(), None);
        assert_eq!(dnd.active_sensor_id(), None);
    }

    #[test]
    fn removal_is_deferred_and_clears_active_ids() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        let target = Node::new(2, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.add_droppable(new_item(2, &target));
        dnd.sensor_start(SENSOR, Point::new(1.0, 1.0));
        dnd.drag_start(1);
        assert_eq!(dnd.active_droppable_id(), Some(2));

        dnd.remove_draggable(1);
        dnd.remove_droppable(2);
        assert!(dnd.draggable(1).is_some_and(|d| d.is_pending_cleanup()));
        assert_eq!(dnd.active_draggable_id(), Some(1));

        assert_eq!(dnd.run_deferred(), 2);
        assert!(dnd.draggable(1).is_none());
        assert!(dnd.droppable(2).is_none());
        assert_eq!(dnd.active_draggable_id(), None);
        assert_eq!(dnd.active_droppable_id(), None);
    }

    #[test]
    fn readding_before_cleanup_cancels_removal() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.remove_draggable(1);
        dnd.add_draggable(new_item(1, &node));
        dnd.run_deferred();
        assert_eq!(dnd.draggables().filter(|d| d.id() == 1).count(), 1);
        assert!(!dnd.draggable(1).is_some_and(|d| d.is_pending_cleanup()));
    }

    #[test]
    fn removing_active_sensor_clears_it() {
        let mut dnd = engine();
        dnd.sensor_start(SENSOR, Point::ZERO);
        assert_eq!(dnd.active_sensor_id(), Some(SENSOR));
        dnd.remove_sensor(SENSOR);
        assert_eq!(dnd.active_sensor_id(), None);
        assert!(dnd.sensor(SENSOR).is_none());
    }

    #[test]
    fn sensor_move_offsets_the_active_draggable() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.sensor_start(SENSOR, Point::new(5.0, 5.0));
        dnd.drag_start(1);
        dnd.sensor_move(Point::new(8.0, 9.0));
        assert_eq!(
            dnd.transform_of(ItemKind::Draggable, 1),
            Some(Vec2::new(3.0, 4.0))
        );
        assert_eq!(
            dnd.transformed_of(ItemKind::Draggable, 1),
            Some(Layout::new(3.0, 4.0, 10.0, 10.0))
        );

        dnd.drag_end();
        assert_eq!(dnd.transform_of(ItemKind::Draggable, 1), Some(Vec2::ZERO));
        assert!(
            !dnd.draggable(1)
                .is_some_and(|d| d.transformers().contains(TransformerId::SensorMove))
        );
    }

    #[test]
    fn recompute_layouts_reports_changes() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.add_droppable(new_item(1, &node));
        assert!(!dnd.recompute_layouts());

        node.rect.set(Rect::new(20.5, 0.0, 30.5, 10.0));
        assert!(dnd.recompute_layouts());
        assert_eq!(
            dnd.draggable(1).map(|d| d.layout()),
            Some(Layout::new(20.0, 0.0, 10.0, 10.0))
        );
        assert_eq!(
            dnd.droppable(1).map(|d| d.layout()),
            Some(Layout::new(20.0, 0.0, 10.0, 10.0))
        );
        assert!(!dnd.recompute_layouts());
    }

    #[test]
    fn overlay_moves_instead_of_draggable() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        let overlay = Node::new(9, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        dnd.set_overlay(overlay.clone(), Layout::new(0.0, 0.0, 10.0, 10.0));
        dnd.sensor_move(Point::new(4.0, 0.0));

        assert_eq!(dnd.transform_of(ItemKind::Draggable, 1), Some(Vec2::ZERO));
        assert_eq!(dnd.overlay_transform(), Some(Vec2::new(4.0, 0.0)));
        assert_eq!(
            dnd.overlay_snapshot().and_then(|o| o.id),
            Some(1),
            "overlay mirrors the active draggable"
        );
        assert_eq!(dnd.overlay_snapshot().and_then(|o| o.data), Some(()));

        dnd.clear_overlay();
        assert_eq!(dnd.overlay_transform(), None);
        assert_eq!(
            dnd.transform_of(ItemKind::Draggable, 1),
            Some(Vec2::new(4.0, 0.0))
        );
    }

    #[test]
    fn overlay_excludes_layout_correction() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        dnd.add_transformer(
            ItemKind::Draggable,
            1,
            Transformer::offset(TransformerId::LayoutCorrection, Vec2::new(50.0, 0.0)),
        );
        dnd.add_transformer(
            ItemKind::Draggable,
            1,
            Transformer::offset(TransformerId::Custom(7), Vec2::new(0.0, 2.0)),
        );
        dnd.set_overlay(node, Layout::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(dnd.overlay_transform(), Some(Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn collision_detection_uses_overlay_when_present() {
        let mut dnd = engine();
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(new_item(1, &node));
        dnd.add_droppable(new_item(2, &Node::new(2, 0.0, 0.0)));
        dnd.add_droppable(new_item(3, &Node::new(3, 100.0, 0.0)));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        assert_eq!(dnd.active_droppable_id(), Some(2));

        let overs: Rc<RefCell<Vec<Option<u32>>>> = Rc::default();
        {
            let overs = overs.clone();
            dnd.on_drag_over(move |_, event| {
                overs.borrow_mut().push(event.droppable.as_ref().map(|d| d.id));
            });
        }
        overs.borrow_mut().clear();

        // No pointer movement: setting the overlay alone moves the collision item.
        dnd.set_overlay(Node::new(9, 100.0, 0.0), Layout::new(100.0, 0.0, 10.0, 10.0));
        assert_eq!(dnd.active_droppable_id(), Some(3));
        assert_eq!(*overs.borrow(), [Some(3)]);

        dnd.clear_overlay();
        assert_eq!(dnd.active_droppable_id(), Some(2));
    }

    #[test]
    fn overlay_events_carry_draggable_data() {
        let mut dnd: DragDrop<u32, Node, &'static str> = DragDrop::default();
        dnd.add_sensor(SENSOR, []);
        let node = Node::new(1, 0.0, 0.0);
        dnd.add_draggable(NewItem {
            id: 1,
            node: node.clone(),
            layout: element_layout(&node),
            data: "card",
        });
        let seen: Rc<RefCell<Option<(Option<u32>, Option<&'static str>)>>> = Rc::default();
        {
            let seen = seen.clone();
            dnd.on_drag_move(move |_, event| {
                *seen.borrow_mut() = event.overlay.as_ref().map(|o| (o.id, o.data));
            });
        }
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        assert_eq!(*seen.borrow(), None);

        dnd.set_overlay(Node::new(9, 50.0, 0.0), Layout::new(50.0, 0.0, 10.0, 10.0));
        assert_eq!(*seen.borrow(), Some((Some(1), Some("card"))));
    }

    #[test]
    fn overlay_without_active_draggable_detects_nothing() {
        let mut dnd = engine();
        dnd.add_droppable(new_item(2, &Node::new(2, 0.0, 0.0)));
        dnd.set_overlay(Node::new(9, 0.0, 0.0), Layout::new(0.0, 0.0, 10.0, 10.0));
        dnd.detect_collisions();
        assert_eq!(dnd.active_droppable_id(), None);
        assert_eq!(dnd.overlay_transform(), Some(Vec2::ZERO));
    }

    #[test]
    fn configured_detector_is_used() {
        let config = DragDropConfig::default().with_collision_detector(closest_center);
        let mut dnd: Engine = DragDrop::new(config);
        dnd.add_sensor(SENSOR, []);
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        // No overlap, but closest_center still matches.
        dnd.add_droppable(new_item(2, &Node::new(2, 500.0, 0.0)));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        assert_eq!(dnd.active_droppable_id(), Some(2));
    }

    #[test]
    fn lifecycle_events_fire_in_order() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut dnd = engine();
        for (kind, name) in [
            (DragEventKind::Start, "start"),
            (DragEventKind::Move, "move"),
            (DragEventKind::Over, "over"),
            (DragEventKind::End, "end"),
        ] {
            let log = log.clone();
            dnd.subscribe(
                kind,
                Box::new(move |_: &mut Engine, _: &DragEvent<u32, Node, ()>| {
                    log.borrow_mut().push(name);
                }),
            );
        }
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.add_droppable(new_item(2, &Node::new(2, 0.0, 0.0)));
        assert!(log.borrow().is_empty());

        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        assert_eq!(*log.borrow(), ["start", "move", "over"]);
        log.borrow_mut().clear();

        dnd.sensor_move(Point::new(1.0, 0.0));
        assert_eq!(*log.borrow(), ["move"]);
        log.borrow_mut().clear();

        // Unchanged coordinates: nothing to report.
        dnd.sensor_move(Point::new(1.0, 0.0));
        assert!(log.borrow().is_empty());

        dnd.sensor_move(Point::new(50.0, 0.0));
        assert_eq!(*log.borrow(), ["move", "over"]);
        log.borrow_mut().clear();

        dnd.drag_end();
        assert_eq!(*log.borrow(), ["end"]);
    }

    #[test]
    fn end_receives_last_seen_values() {
        let seen = Rc::new(RefCell::new(None));
        let mut dnd = engine();
        {
            let seen = seen.clone();
            dnd.on_drag_end(move |_, event| {
                *seen.borrow_mut() = Some((
                    event.draggable.id,
                    event.draggable.transform,
                    event.droppable.as_ref().map(|d| d.id),
                ));
            });
        }
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.add_droppable(new_item(2, &Node::new(2, 0.0, 0.0)));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        dnd.sensor_move(Point::new(2.0, 3.0));
        dnd.drag_end();
        assert_eq!(*seen.borrow(), Some((1, Vec2::new(2.0, 3.0), Some(2))));
    }

    #[test]
    fn handlers_may_mutate_the_engine() {
        let mut dnd = engine();
        dnd.on_drag_start(|dnd, event| {
            dnd.add_transformer(
                ItemKind::Draggable,
                event.draggable.id,
                Transformer::offset(TransformerId::Custom(1), Vec2::new(100.0, 0.0)),
            );
        });
        let moves = Rc::new(Cell::new(0));
        {
            let moves = moves.clone();
            dnd.on_drag_move(move |_, _| moves.set(moves.get() + 1));
        }
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.add_droppable(new_item(2, &Node::new(2, 100.0, 0.0)));
        dnd.sensor_start(SENSOR, Point::ZERO);
        dnd.drag_start(1);
        // The offset installed by the start handler is visible to move and to
        // collision detection before drag_start returns.
        assert_eq!(
            dnd.transform_of(ItemKind::Draggable, 1),
            Some(Vec2::new(100.0, 0.0))
        );
        assert_eq!(dnd.active_droppable_id(), Some(2));
        assert!(moves.get() >= 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(Cell::new(0));
        let mut dnd = engine();
        let id = {
            let count = count.clone();
            dnd.on_drag_start(move |_, _| count.set(count.get() + 1))
        };
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.drag_start(1);
        dnd.drag_end();
        dnd.unsubscribe(id);
        dnd.drag_start(1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_can_unsubscribe_itself() {
        let count = Rc::new(Cell::new(0));
        let own: Rc<Cell<Option<SubscriptionId>>> = Rc::default();
        let mut dnd = engine();
        let id = {
            let count = count.clone();
            let own = own.clone();
            dnd.on_drag_start(move |dnd, _| {
                count.set(count.get() + 1);
                if let Some(id) = own.get() {
                    dnd.unsubscribe(id);
                }
            })
        };
        own.set(Some(id));
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.drag_start(1);
        dnd.drag_end();
        dnd.drag_start(1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn batch_defers_notification() {
        let starts = Rc::new(Cell::new(0));
        let mut dnd = engine();
        {
            let starts = starts.clone();
            dnd.on_drag_start(move |_, _| starts.set(starts.get() + 1));
        }
        dnd.add_draggable(new_item(1, &Node::new(1, 0.0, 0.0)));
        dnd.batch(|dnd| {
            dnd.drag_start(1);
            assert_eq!(starts.get(), 0);
        });
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn activators_group_sensors_by_event() {
        let mut dnd = Engine::default();
        dnd.add_sensor(1, [ActivatorEvent::PointerDown]);
        dnd.add_sensor(2, [ActivatorEvent::PointerDown, ActivatorEvent::TouchStart]);
        let listeners = dnd.draggable_activators(7, true);
        assert_eq!(listeners.draggable(), 7);
        assert_eq!(
            listeners.names().collect::<Vec<_>>(),
            ["onpointerdown", "ontouchstart"]
        );
        let pointer = listeners.get(ActivatorEvent::PointerDown).map(|l| l.sensors.to_vec());
        assert_eq!(pointer, Some(alloc::vec![1, 2]));

        let plain = dnd.draggable_activators(7, false);
        assert!(plain.get_by_name("pointerdown").is_some());
    }

    #[test]
    fn dispatch_stops_once_a_sensor_is_active() {
        let mut dnd = Engine::default();
        dnd.add_sensor(1, [ActivatorEvent::PointerDown]);
        dnd.add_sensor(2, [ActivatorEvent::PointerDown]);
        let listeners = dnd.draggable_activators(7, false);
        let mut offered = Vec::new();
        let ran = listeners.dispatch(ActivatorEvent::PointerDown, &mut dnd, |dnd, sensor, _| {
            offered.push(sensor);
            dnd.sensor_start(sensor, Point::ZERO);
        });
        assert_eq!(ran, 1);
        assert_eq!(offered, [1]);
        assert_eq!(
            listeners.dispatch(ActivatorEvent::MouseDown, &mut dnd, |_, _, _| {}),
            0
        );
    }

    #[test]
    fn deferred_tasks_may_queue_more_work() {
        let mut dnd = engine();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            dnd.defer(move |dnd| {
                hits.set(hits.get() + 1);
                let hits = hits.clone();
                dnd.defer(move |_| hits.set(hits.get() + 1));
            });
        }
        assert_eq!(dnd.run_deferred(), 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(dnd.run_deferred(), 0);
    }
}
