// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Activator listeners for one draggable.

use smallvec::SmallVec;

use crate::DragDrop;
use crate::element::Element;
use crate::item::ActivatorEvent;

/// One event type and the sensors it can activate, in registration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Listener<K> {
    /// Event name, with an `on` prefix when requested as handlers.
    pub name: &'static str,
    /// The activating event.
    pub event: ActivatorEvent,
    /// Sensors with an activator for `event`.
    pub sensors: SmallVec<[K; 2]>,
}

/// Activator listeners returned by [`DragDrop::draggable_activators`].
#[derive(Clone, Debug, PartialEq)]
pub struct Listeners<K> {
    draggable: K,
    as_handlers: bool,
    entries: SmallVec<[Listener<K>; 1]>,
}

impl<K: Copy + PartialEq> Listeners<K> {
    pub(crate) fn new(draggable: K, as_handlers: bool) -> Self {
        Self {
            draggable,
            as_handlers,
            entries: SmallVec::new(),
        }
    }

    pub(crate) fn push(&mut self, event: ActivatorEvent, sensor: K) {
        if let Some(entry) = self.entries.iter_mut().find(|l| l.event == event) {
            entry.sensors.push(sensor);
            return;
        }
        let name = if self.as_handlers {
            event.handler_name()
        } else {
            event.name()
        };
        let mut sensors = SmallVec::new();
        sensors.push(sensor);
        self.entries.push(Listener {
            name,
            event,
            sensors,
        });
    }

    /// The draggable these listeners activate.
    pub fn draggable(&self) -> K {
        self.draggable
    }

    /// Number of distinct events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sensor has an activator.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Listener<K>> {
        self.entries.iter()
    }

    /// Listener names, for attaching to a node.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|l| l.name)
    }

    /// Look up by event.
    pub fn get(&self, event: ActivatorEvent) -> Option<&Listener<K>> {
        self.entries.iter().find(|l| l.event == event)
    }

    /// Look up by (possibly `on`-prefixed) name.
    pub fn get_by_name(&self, name: &str) -> Option<&Listener<K>> {
        self.entries.iter().find(|l| l.name == name)
    }

    /// Offer `event` to each sensor that listens for it.
    ///
    /// `activate` receives the engine, the sensor id and the draggable id. Once
    /// any sensor is active the remaining sensors are skipped. Returns how many
    /// activators ran.
    pub fn dispatch<N, D>(
        &self,
        event: ActivatorEvent,
        dnd: &mut DragDrop<K, N, D>,
        mut activate: impl FnMut(&mut DragDrop<K, N, D>, K, K),
    ) -> usize
    where
        K: core::fmt::Debug + Eq + 'static,
        N: Element + 'static,
        D: Clone + 'static,
    {
        let Some(listener) = self.get(event) else {
            return 0;
        };
        let mut ran = 0;
        for &sensor in &listener.sensors {
            if dnd.active_sensor_id().is_some() {
                break;
            }
            activate(dnd, sensor, self.draggable);
            ran += 1;
        }
        ran
    }
}
