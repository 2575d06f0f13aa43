// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entity records owned by the engine: draggables, droppables, the overlay, and sensors.

use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use crate::layout::{Layout, Transform};
use crate::transformer::Transformers;

/// Which entity collection an operation addresses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Draggables.
    Draggable,
    /// Droppables.
    Droppable,
}

/// Registration payload for [`add_draggable`](crate::DragDrop::add_draggable)
/// and [`add_droppable`](crate::DragDrop::add_droppable).
#[derive(Clone, Debug)]
pub struct NewItem<K, N, D> {
    /// Unique id within its collection.
    pub id: K,
    /// Host node backing the item.
    pub node: N,
    /// Layout measured at registration.
    pub layout: Layout,
    /// Opaque payload forwarded to event handlers.
    pub data: D,
}

/// A registered draggable or droppable.
///
/// The derived transform is not stored here; ask the engine via
/// [`transform_of`](crate::DragDrop::transform_of) because it depends on shared
/// state such as the active sensor.
#[derive(Clone, Debug)]
pub struct Item<K, N, D> {
    pub(crate) id: K,
    pub(crate) node: N,
    pub(crate) layout: Layout,
    pub(crate) data: D,
    pub(crate) transformers: Transformers,
    pub(crate) pending_cleanup: bool,
}

/// A registered draggable.
pub type Draggable<K, N, D> = Item<K, N, D>;
/// A registered droppable.
pub type Droppable<K, N, D> = Item<K, N, D>;

impl<K: Copy, N, D> Item<K, N, D> {
    pub(crate) fn from_new(item: NewItem<K, N, D>) -> Self {
        Self {
            id: item.id,
            node: item.node,
            layout: item.layout,
            data: item.data,
            transformers: Transformers::new(),
            pending_cleanup: false,
        }
    }

    /// Item id.
    pub fn id(&self) -> K {
        self.id
    }

    /// Backing host node.
    pub fn node(&self) -> &N {
        &self.node
    }

    /// Untransformed layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// User payload.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Installed transformers.
    pub fn transformers(&self) -> &Transformers {
        &self.transformers
    }

    /// Whether removal was requested and is waiting for the deferred cleanup.
    pub fn is_pending_cleanup(&self) -> bool {
        self.pending_cleanup
    }
}

/// Visual stand-in for the dragged item.
///
/// Its id, data and transformers mirror the active draggable.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay<N> {
    pub(crate) node: N,
    pub(crate) layout: Layout,
}

impl<N> Overlay<N> {
    /// Backing host node.
    pub fn node(&self) -> &N {
        &self.node
    }

    /// Untransformed layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }
}

/// Event types a sensor can be activated by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActivatorEvent {
    /// `pointerdown`
    PointerDown,
    /// `mousedown`
    MouseDown,
    /// `touchstart`
    TouchStart,
}

impl ActivatorEvent {
    /// The DOM event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::MouseDown => "mousedown",
            Self::TouchStart => "touchstart",
        }
    }

    /// The handler property name (`on` + event name).
    pub const fn handler_name(self) -> &'static str {
        match self {
            Self::PointerDown => "onpointerdown",
            Self::MouseDown => "onmousedown",
            Self::TouchStart => "ontouchstart",
        }
    }
}

/// Pointer coordinates tracked by a sensor.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Coordinates {
    /// Where the sensor started.
    pub origin: Point,
    /// Latest pointer position.
    pub current: Point,
}

impl Coordinates {
    /// Both origin and current at `point`.
    pub fn at(point: Point) -> Self {
        Self {
            origin: point,
            current: point,
        }
    }

    /// `current - origin`.
    pub fn delta(&self) -> Vec2 {
        self.current - self.origin
    }
}

/// A registered input sensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Sensor<K> {
    pub(crate) id: K,
    pub(crate) activators: SmallVec<[ActivatorEvent; 2]>,
    pub(crate) coordinates: Coordinates,
}

impl<K: Copy> Sensor<K> {
    /// Sensor id.
    pub fn id(&self) -> K {
        self.id
    }

    /// Events that can activate this sensor on a draggable.
    pub fn activators(&self) -> &[ActivatorEvent] {
        &self.activators
    }

    /// Tracked coordinates.
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }
}

/// Owned view of an item at the time an event was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSnapshot<K, N, D> {
    /// Item id.
    pub id: K,
    /// Backing host node.
    pub node: N,
    /// Untransformed layout.
    pub layout: Layout,
    /// User payload.
    pub data: D,
    /// Derived transform.
    pub transform: Transform,
    /// `layout` shifted by `transform`.
    pub transformed: Layout,
}

/// Owned view of the overlay at the time an event was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlaySnapshot<K, N, D> {
    /// Id of the draggable the overlay stands in for.
    pub id: Option<K>,
    /// Backing host node.
    pub node: N,
    /// Payload of the draggable the overlay stands in for.
    pub data: Option<D>,
    /// Untransformed layout.
    pub layout: Layout,
    /// Derived transform.
    pub transform: Transform,
    /// `layout` shifted by `transform`.
    pub transformed: Layout,
}
