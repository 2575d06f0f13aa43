// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_drag_drop --heading-base-level=0

//! Understory Drag & Drop: headless drag-and-drop coordination.
//!
//! This crate tracks what is being dragged, where it is, and what it is over,
//! without owning any rendering or input plumbing. Hosts register their nodes,
//! forward pointer input, and write the resulting offsets back to the nodes.
//!
//! - [`layout`]: pixel-snapped geometry and the pure helpers used everywhere else.
//! - [`collision`]: pluggable detectors that pick the droppable under the drag.
//! - [`DragDrop`]: the coordination engine and its lifecycle [`event`]s.
//! - [`transformer`]: ordered offset steps folded into each item's transform.
//! - [`sensor`]: a pointer sensor with activation delay and distance.
//! - [`binding`] and [`overlay`]: per-node glue that registers nodes and writes
//!   their transforms through [`StyleTarget`].
//! - [`style`] and [`relayout`]: inline style builders and a scroll throttle.
//!
//! ## Model
//!
//! Items are registered with an untransformed [`Layout`]. An item's transform is
//! not stored: it is the fold of its [`Transformer`]s, evaluated on read. Starting
//! a drag installs a transformer that adds the active sensor's pointer delta, so
//! moving the pointer moves the dragged item without touching its layout.
//!
//! Every mutation is a transaction. When the outermost transaction completes the
//! engine re-evaluates its subscriptions and calls handlers whose observed value
//! changed. Collision detection is itself such a subscriber, so the active
//! droppable is always current once a mutating call returns.
//!
//! ## Host loop
//!
//! The engine never schedules anything. A host:
//!
//! - implements [`Element`] (and [`StyleTarget`] for bindings) for its node handle,
//! - routes pointer events into a [`sensor::PointerSensor`] through
//!   [`Listeners::dispatch`],
//! - calls [`DragDrop::run_deferred`] at the end of each turn,
//! - calls `sync` on its bindings after changes.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use understory_drag_drop::{DragDrop, Element, ItemKind, Layout, NewItem};
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Node(Rect);
//! // `Rect` holds `f64`s, so `Eq` and `Hash` (required by `Element`) are written by hand.
//! impl Eq for Node {}
//! impl core::hash::Hash for Node {
//!     fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
//!         for v in [self.0.x0, self.0.y0, self.0.x1, self.0.y1] {
//!             v.to_bits().hash(state);
//!         }
//!     }
//! }
//! impl Element for Node {
//!     fn bounding_rect(&self) -> Rect {
//!         self.0
//!     }
//! }
//!
//! let card = Node(Rect::new(0.0, 0.0, 10.0, 10.0));
//! let bin = Node(Rect::new(30.0, 0.0, 40.0, 10.0));
//!
//! let mut dnd: DragDrop<&str, Node> = DragDrop::default();
//! dnd.add_sensor("pointer", []);
//! dnd.add_draggable(NewItem { id: "card", node: card.clone(), layout: Layout::from_rect(card.0), data: () });
//! dnd.add_droppable(NewItem { id: "bin", node: bin.clone(), layout: Layout::from_rect(bin.0), data: () });
//!
//! dnd.on_drag_end(|_, event| {
//!     let target = event.droppable.as_ref().map(|d| d.id);
//!     assert_eq!((event.draggable.id, target), ("card", Some("bin")));
//! });
//!
//! dnd.sensor_start("pointer", Point::new(5.0, 5.0));
//! dnd.drag_start("card");
//! dnd.sensor_move(Point::new(33.0, 5.0));
//! assert_eq!(dnd.active_droppable_id(), Some("bin"));
//! assert_eq!(
//!     dnd.transformed_of(ItemKind::Draggable, "card"),
//!     Some(Layout::new(28.0, 0.0, 10.0, 10.0)),
//! );
//!
//! dnd.drag_end();
//! dnd.sensor_end();
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod binding;
pub mod collision;
mod element;
mod engine;
pub mod event;
mod item;
pub mod layout;
mod listeners;
pub mod overlay;
pub mod relayout;
pub mod sensor;
pub mod style;
pub mod transformer;

pub use binding::{DraggableBinding, DroppableBinding, TransformWriter};
pub use collision::{CollisionDetector, closest_center, closest_corners, most_intersecting};
pub use element::{Element, StyleTarget};
pub use engine::{DragDrop, DragDropConfig};
pub use event::{DragEvent, DragEventHandler, DragEventKind, SubscriptionId};
pub use item::{
    ActivatorEvent, Coordinates, Draggable, Droppable, Item, ItemKind, ItemSnapshot, NewItem,
    Overlay, OverlaySnapshot, Sensor,
};
pub use layout::{Layout, Transform};
pub use listeners::{Listener, Listeners};
pub use overlay::DragOverlay;
pub use style::{Style, layout_style, maybe_transform_style, transform_style};
pub use transformer::{TransformOp, Transformer, TransformerId, Transformers};
