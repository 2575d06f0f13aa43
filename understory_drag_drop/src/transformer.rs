// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transformers: ordered steps folded into an item's transform.
//!
//! Independent concerns (pointer movement, a layout correction mid-drag, a
//! sortable slot offset) each contribute one [`Transformer`] to an item. The
//! item's transform is the fold of its transformers, in ascending
//! [`Transformer::order`], starting from the identity.
//!
//! The roles the crate itself uses are closed variants of [`TransformerId`];
//! callers add their own with [`TransformerId::Custom`].

use alloc::rc::Rc;
use core::fmt;

use kurbo::Vec2;
use smallvec::SmallVec;

use crate::layout::Transform;

/// Identifies a transformer on one item. At most one transformer per id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformerId {
    /// Adds the active sensor's pointer delta. Installed by
    /// [`drag_start`](crate::DragDrop::drag_start), removed by
    /// [`drag_end`](crate::DragDrop::drag_end).
    SensorMove,
    /// Cancels a layout jump when the active draggable is re-registered mid-drag.
    /// Never applied to the overlay.
    LayoutCorrection,
    /// Slides a sortable item to its current slot.
    SortableOffset,
    /// Caller-defined.
    Custom(u32),
}

impl TransformerId {
    /// Order used for this role unless the caller chooses another.
    pub const fn default_order(self) -> i32 {
        match self {
            Self::SensorMove => 0,
            Self::LayoutCorrection | Self::SortableOffset => 100,
            Self::Custom(_) => 50,
        }
    }
}

/// What a transformer does to the incoming transform.
#[derive(Clone)]
pub enum TransformOp {
    /// Add the active sensor's `current - origin` delta, if a sensor is active.
    SensorDelta,
    /// Add a fixed offset.
    Offset(Vec2),
    /// Arbitrary pure mapping.
    Map(Rc<dyn Fn(Transform) -> Transform>),
}

impl fmt::Debug for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorDelta => f.write_str("SensorDelta"),
            Self::Offset(offset) => f.debug_tuple("Offset").field(offset).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
        }
    }
}

/// A single ordered step of an item's transform.
#[derive(Clone, Debug)]
pub struct Transformer {
    /// Role of this transformer on its item.
    pub id: TransformerId,
    /// Lower orders are applied first.
    pub order: i32,
    /// The mapping.
    pub op: TransformOp,
}

impl Transformer {
    /// A transformer with the role's default order.
    pub fn new(id: TransformerId, op: TransformOp) -> Self {
        Self {
            id,
            order: id.default_order(),
            op,
        }
    }

    /// Override the order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// The pointer-delta transformer installed on drag start.
    pub fn sensor_move() -> Self {
        Self::new(TransformerId::SensorMove, TransformOp::SensorDelta)
    }

    /// A fixed offset under the given role.
    pub fn offset(id: TransformerId, offset: Vec2) -> Self {
        Self::new(id, TransformOp::Offset(offset))
    }

    /// A closure-backed transformer.
    pub fn map(id: TransformerId, f: impl Fn(Transform) -> Transform + 'static) -> Self {
        Self::new(id, TransformOp::Map(Rc::new(f)))
    }

    /// Apply this step. `sensor_delta` is the active sensor's delta, if any.
    pub fn apply(&self, transform: Transform, sensor_delta: Option<Vec2>) -> Transform {
        match &self.op {
            TransformOp::SensorDelta => match sensor_delta {
                Some(delta) => transform + delta,
                None => transform,
            },
            TransformOp::Offset(offset) => transform + *offset,
            TransformOp::Map(f) => f(transform),
        }
    }
}

/// The transformers of one item, in insertion order.
///
/// Replacing a transformer keeps its original position, which only matters for
/// transformers that share an order.
#[derive(Clone, Debug, Default)]
pub struct Transformers {
    entries: SmallVec<[Transformer; 2]>,
}

impl Transformers {
    /// No transformers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id.
    pub fn insert(&mut self, transformer: Transformer) {
        match self.entries.iter_mut().find(|t| t.id == transformer.id) {
            Some(slot) => *slot = transformer,
            None => self.entries.push(transformer),
        }
    }

    /// Remove by id, returning the removed transformer.
    pub fn remove(&mut self, id: TransformerId) -> Option<Transformer> {
        let index = self.entries.iter().position(|t| t.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Look up by id.
    pub fn get(&self, id: TransformerId) -> Option<&Transformer> {
        self.entries.iter().find(|t| t.id == id)
    }

    /// Whether a transformer with this id is present.
    pub fn contains(&self, id: TransformerId) -> bool {
        self.get(id).is_some()
    }

    /// Number of transformers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no transformers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Transformer> {
        self.entries.iter()
    }

    /// Fold every transformer except those in `exclude`, in ascending order.
    pub fn fold(&self, sensor_delta: Option<Vec2>, exclude: &[TransformerId]) -> Transform {
        let mut ordered: SmallVec<[&Transformer; 4]> = self
            .entries
            .iter()
            .filter(|t| !exclude.contains(&t.id))
            .collect();
        // Stable, so equal orders keep insertion order.
        ordered.sort_by_key(|t| t.order);
        ordered
            .into_iter()
            .fold(Vec2::ZERO, |transform, t| t.apply(transform, sensor_delta))
    }
}
