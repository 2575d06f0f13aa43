// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host element traits.
//!
//! The engine never talks to a DOM (or any other retained tree) directly. Hosts
//! implement [`Element`] for their node handle so the engine can measure it, and
//! [`StyleTarget`] so bindings can write the resulting visual offset back and
//! manage activator listeners.

use alloc::string::String;
use core::hash::Hash;

use kurbo::Rect;

/// A measurable host node.
///
/// Handles are compared and hashed so that a node shared by several roles (for
/// example a sortable item that is both draggable and droppable) is measured once
/// per [`recompute_layouts`](crate::DragDrop::recompute_layouts) pass.
pub trait Element: Clone + Eq + Hash {
    /// The rendered bounding box in viewport coordinates, transform included.
    fn bounding_rect(&self) -> Rect;

    /// The computed CSS transform, if any (for example `matrix(1, 0, 0, 1, 10, 0)`).
    fn computed_transform(&self) -> Option<String> {
        None
    }
}

/// A node whose inline style and listeners can be written by a binding.
pub trait StyleTarget {
    /// Set an inline style property.
    fn set_style_property(&self, name: &str, value: &str);

    /// Remove an inline style property.
    fn remove_style_property(&self, name: &str);

    /// Start forwarding `event` on this node to the binding's activators.
    fn add_event_listener(&self, event: &str);

    /// Stop forwarding `event` on this node.
    fn remove_event_listener(&self, event: &str);
}
