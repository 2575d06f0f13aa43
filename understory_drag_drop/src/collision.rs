// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision detectors: pick the droppable the dragged item is over.
//!
//! Every detector has the same [`CollisionDetector`] shape so that one can be
//! swapped for another in [`DragDropConfig`](crate::DragDropConfig):
//!
//! - the active item is compared using its `transformed` layout (pointer offset applied),
//! - candidates are compared using their untransformed `layout`,
//! - on an exact tie the currently active droppable wins, so the result does not
//!   flicker between two equally good candidates.
//!
//! A detector returns `None` when nothing qualifies; callers treat that as "not
//! over any droppable".
//!
//! ```
//! use understory_drag_drop::collision::{CollisionContext, CollisionItem, closest_center};
//! use understory_drag_drop::layout::Layout;
//!
//! let dragged = CollisionItem::new("card", Layout::new(0.0, 0.0, 10.0, 10.0));
//! let slots = [
//!     CollisionItem::new("left", Layout::new(-20.0, 0.0, 10.0, 10.0)),
//!     CollisionItem::new("right", Layout::new(20.0, 0.0, 10.0, 10.0)),
//! ];
//!
//! // Equidistant: the active droppable is kept.
//! let ctx = CollisionContext { active_droppable: Some("right") };
//! assert_eq!(closest_center(&dragged, &slots, &ctx), Some("right"));
//! ```

use crate::layout::{Layout, distance_between_points, intersection_ratio_of_layouts};

/// Geometry of one participant in collision detection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionItem<K> {
    /// Item id.
    pub id: K,
    /// Untransformed layout.
    pub layout: Layout,
    /// Layout with the item's current transform applied.
    pub transformed: Layout,
}

impl<K> CollisionItem<K> {
    /// An item whose transformed layout equals its layout.
    pub fn new(id: K, layout: Layout) -> Self {
        Self {
            id,
            layout,
            transformed: layout,
        }
    }

    /// An item with distinct untransformed and transformed layouts.
    pub fn with_transformed(id: K, layout: Layout, transformed: Layout) -> Self {
        Self {
            id,
            layout,
            transformed,
        }
    }
}

/// Extra state a detector may consult.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionContext<K> {
    /// The droppable currently under the drag, used for tie-breaks.
    pub active_droppable: Option<K>,
}

/// `(active item, candidate droppables, context) -> best droppable id`.
pub type CollisionDetector<K> =
    fn(&CollisionItem<K>, &[CollisionItem<K>], &CollisionContext<K>) -> Option<K>;

/// Minimize the distance between the active item's center and each droppable's center.
pub fn closest_center<K: Copy + PartialEq>(
    active: &CollisionItem<K>,
    droppables: &[CollisionItem<K>],
    context: &CollisionContext<K>,
) -> Option<K> {
    let center = active.transformed.center();
    closest_by(droppables, context, |droppable| {
        distance_between_points(center, droppable.layout.center())
    })
}

/// Minimize the summed distance between matching corners.
pub fn closest_corners<K: Copy + PartialEq>(
    active: &CollisionItem<K>,
    droppables: &[CollisionItem<K>],
    context: &CollisionContext<K>,
) -> Option<K> {
    let from = active.transformed.corners();
    closest_by(droppables, context, |droppable| {
        let to = droppable.layout.corners();
        distance_between_points(to.top_left, from.top_left)
            + distance_between_points(to.top_right, from.top_right)
            + distance_between_points(to.bottom_right, from.bottom_right)
            + distance_between_points(to.bottom_left, from.bottom_left)
    })
}

/// Maximize the intersection ratio. A ratio of zero never matches.
pub fn most_intersecting<K: Copy + PartialEq>(
    active: &CollisionItem<K>,
    droppables: &[CollisionItem<K>],
    context: &CollisionContext<K>,
) -> Option<K> {
    let mut best_ratio = 0.0;
    let mut best = None;
    for droppable in droppables {
        let ratio = intersection_ratio_of_layouts(&active.transformed, &droppable.layout);
        if ratio > best_ratio {
            best_ratio = ratio;
            best = Some(droppable.id);
        } else if ratio > 0.0
            && ratio == best_ratio
            && context.active_droppable == Some(droppable.id)
        {
            best = Some(droppable.id);
        }
    }
    best
}

fn closest_by<K: Copy + PartialEq>(
    droppables: &[CollisionItem<K>],
    context: &CollisionContext<K>,
    mut distance_to: impl FnMut(&CollisionItem<K>) -> f64,
) -> Option<K> {
    let mut best_distance = f64::INFINITY;
    let mut best = None;
    for droppable in droppables {
        let distance = distance_to(droppable);
        if distance < best_distance {
            best_distance = distance;
            best = Some(droppable.id);
        } else if distance == best_distance && context.active_droppable == Some(droppable.id) {
            best = Some(droppable.id);
        }
    }
    best
}
