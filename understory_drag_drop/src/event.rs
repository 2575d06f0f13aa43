// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle events and subscriptions.
//!
//! Subscriptions are re-evaluated whenever an engine transaction completes. Each
//! one remembers what it last observed, so a handler only runs when the value it
//! watches actually changed:
//!
//! | Kind | Watches | Fires when |
//! | --- | --- | --- |
//! | [`Start`](DragEventKind::Start) | active draggable | it becomes (another) `Some` |
//! | [`Move`](DragEventKind::Move) | active draggable, effective transform, active item layout | any changes during a drag |
//! | [`Over`](DragEventKind::Over) | active draggable + active droppable | either changes during a drag |
//! | [`End`](DragEventKind::End) | active draggable | it becomes `None`; receives the last values seen |
//!
//! Handlers get `&mut DragDrop` and may mutate it; the resulting changes are
//! evaluated in a further pass before the transaction returns.

use alloc::boxed::Box;

use crate::DragDrop;
use crate::item::{ItemSnapshot, OverlaySnapshot};
use crate::layout::{Layout, Transform};

/// Payload handed to lifecycle handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct DragEvent<K, N, D> {
    /// The dragged item.
    pub draggable: ItemSnapshot<K, N, D>,
    /// The droppable under the drag. Only populated for over and end events.
    pub droppable: Option<ItemSnapshot<K, N, D>>,
    /// The overlay, if one is in use. Not populated for start events.
    pub overlay: Option<OverlaySnapshot<K, N, D>>,
}

/// The four lifecycle subscription points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    /// A draggable became active.
    Start,
    /// The active item's effective transform or geometry changed, including
    /// the overlay being set, re-measured or cleared.
    Move,
    /// The active draggable or droppable changed.
    Over,
    /// The active draggable was cleared.
    End,
}

/// Handle returned by the `on_drag_*` methods, used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A lifecycle handler.
pub type DragEventHandler<K, N, D> = Box<dyn FnMut(&mut DragDrop<K, N, D>, &DragEvent<K, N, D>)>;

/// Last observation of one subscription.
pub(crate) enum Observed<K, N, D> {
    Start(Option<K>),
    Move(Option<(K, Transform, Layout)>),
    Over(Option<(K, Option<K>)>),
    End(Option<DragEvent<K, N, D>>),
}

impl<K, N, D> Observed<K, N, D> {
    pub(crate) fn empty(kind: DragEventKind) -> Self {
        match kind {
            DragEventKind::Start => Self::Start(None),
            DragEventKind::Move => Self::Move(None),
            DragEventKind::Over => Self::Over(None),
            DragEventKind::End => Self::End(None),
        }
    }
}

pub(crate) struct Subscription<K, N, D> {
    pub(crate) id: SubscriptionId,
    pub(crate) observed: Observed<K, N, D>,
    pub(crate) handler: DragEventHandler<K, N, D>,
}
