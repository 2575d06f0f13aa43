// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll-driven relayout.
//!
//! Scrolling moves every registered node without the engine noticing. Feed
//! scroll notifications to a [`RelayoutThrottle`]; it asks the host for one
//! animation frame per burst and re-measures once when that frame arrives.

use core::fmt::Debug;

use crate::DragDrop;
use crate::element::Element;

/// Host frame scheduling.
pub trait FrameHost {
    /// Call [`RelayoutThrottle::on_frame`] before the next paint.
    fn request_animation_frame(&mut self);
}

/// Coalesces scroll notifications into at most one
/// [`recompute_layouts`](DragDrop::recompute_layouts) per frame.
#[derive(Clone, Debug, Default)]
pub struct RelayoutThrottle {
    ticking: bool,
}

impl RelayoutThrottle {
    /// A throttle with no frame pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame has been requested and not yet delivered.
    pub fn is_pending(&self) -> bool {
        self.ticking
    }

    /// A scroll happened. Returns whether a frame was requested.
    pub fn on_scroll<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.ticking {
            return false;
        }
        host.request_animation_frame();
        self.ticking = true;
        true
    }

    /// The requested frame arrived. Returns whether any layout changed.
    pub fn on_frame<K, N, D>(&mut self, dnd: &mut DragDrop<K, N, D>) -> bool
    where
        K: Copy + Eq + Debug + 'static,
        N: Element + 'static,
        D: Clone + 'static,
    {
        let changed = dnd.recompute_layouts();
        self.ticking = false;
        changed
    }
}
