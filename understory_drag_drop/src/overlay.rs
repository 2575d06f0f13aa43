// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag overlay binding.
//!
//! An overlay is a separate node that follows the pointer instead of the
//! dragged node, typically rendered in a fixed-position layer. While it is set
//! the draggable itself reports an identity transform and collision detection
//! uses the overlay's geometry.
//!
//! [`DragOverlay::install`] wires the overlay into the drag lifecycle:
//!
//! - on drag start the overlay takes the draggable's node and layout, then a
//!   deferred task measures the overlay node and centers it on the draggable,
//! - on drag end a deferred task clears the overlay.
//!
//! Both deferred steps run on the host's next
//! [`run_deferred`](crate::DragDrop::run_deferred), after the overlay node has
//! been rendered and can be measured.

use alloc::format;
use alloc::string::String;
use core::fmt::Debug;

use crate::DragDrop;
use crate::element::Element;
use crate::event::SubscriptionId;
use crate::layout::{Layout, element_layout};
use crate::style::{Style, transform_style};

/// Subscriptions backing an installed overlay.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DragOverlay {
    start: SubscriptionId,
    end: SubscriptionId,
}

impl DragOverlay {
    /// Drive the engine's overlay from `node` for every drag.
    pub fn install<K, N, D>(dnd: &mut DragDrop<K, N, D>, node: N) -> Self
    where
        K: Copy + Eq + Debug + 'static,
        N: Element + 'static,
        D: Clone + 'static,
    {
        let start = dnd.on_drag_start(move |dnd, event| {
            let draggable = event.draggable.clone();
            dnd.set_overlay(draggable.node.clone(), draggable.layout);
            let node = node.clone();
            dnd.defer(move |dnd| {
                if dnd.active_draggable_id() != Some(draggable.id) {
                    // The drag ended before the overlay was rendered.
                    return;
                }
                let measured = element_layout(&node);
                let centered = Layout::new(
                    measured.x() + (draggable.layout.width() - measured.width()) / 2.0,
                    measured.y() + (draggable.layout.height() - measured.height()) / 2.0,
                    measured.width(),
                    measured.height(),
                );
                tracing::trace!(?centered, "overlay measured");
                dnd.set_overlay(node, centered);
            });
        });
        let end = dnd.on_drag_end(|dnd, _| dnd.defer(|dnd| dnd.clear_overlay()));
        Self { start, end }
    }

    /// Stop driving the overlay.
    pub fn uninstall<K, N, D>(self, dnd: &mut DragDrop<K, N, D>)
    where
        K: Copy + Eq + Debug + 'static,
        N: Element + 'static,
        D: Clone + 'static,
    {
        dnd.unsubscribe(self.start);
        dnd.unsubscribe(self.end);
    }

    /// Inline style for the overlay node: fixed at the overlay layout, at least
    /// as large as the draggable, offset by the overlay transform.
    ///
    /// Empty unless both an overlay and an active draggable exist.
    pub fn style<K, N, D>(dnd: &DragDrop<K, N, D>) -> Style
    where
        K: Copy + Eq + Debug + 'static,
        N: Element + 'static,
        D: Clone + 'static,
    {
        let (Some(overlay), Some(draggable), Some(transform)) = (
            dnd.overlay(),
            dnd.active_draggable(),
            dnd.overlay_transform(),
        ) else {
            return Style::new();
        };
        let px = |value: f64| -> String { format!("{value}px") };
        let mut style = Style::new()
            .with("position", String::from("fixed"))
            .with("transition", String::from("transform 0s"))
            .with("top", px(overlay.layout().top()))
            .with("left", px(overlay.layout().left()))
            .with("min-width", px(draggable.layout().width()))
            .with("min-height", px(draggable.layout().height()));
        style.extend(transform_style(transform));
        style
    }
}
