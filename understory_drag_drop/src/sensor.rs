// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer sensor: turns raw pointer input into sensor and drag transitions.
//!
//! ## State machine
//!
//! ```text
//!            pointer-down (button 0)
//!   Idle ──────────────────────────────► Armed
//!    ▲  ◄── pointer-up / another sensor won ──┤
//!    │                                        │ delay elapsed, or moved past
//!    │                                        │ the activation distance
//!    │            pointer-up                  ▼
//!    └─────────────────────────────────── Active
//! ```
//!
//! The sensor does not own a clock or the document. The host implements
//! [`SensorHost`] to start and cancel the activation timer and to route
//! document-level pointer events back into [`PointerSensor`]. The sensor asks
//! the host to listen for a [`DocumentListener`] while it needs one and stops
//! listening before acting on pointer-up.

use core::time::Duration;

use kurbo::Point;

use crate::DragDrop;
use crate::element::Element;
use crate::item::ActivatorEvent;
use crate::layout::distance_between_points;

/// Document-level events a sensor listens to while armed or active.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocumentListener {
    /// `pointermove`
    PointerMove,
    /// `pointerup`
    PointerUp,
    /// `selectionchange`, only while a drag is active.
    SelectionChange,
}

/// Host services a [`PointerSensor`] needs.
pub trait SensorHost {
    /// Handle for a pending activation timer.
    type Timer;

    /// Call [`PointerSensor::on_activation_timeout`] after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> Self::Timer;

    /// Cancel a timer. Cancelling a timer that already fired must be harmless.
    fn clear_timeout(&mut self, timer: Self::Timer);

    /// Start forwarding a document event to the sensor.
    fn listen(&mut self, listener: DocumentListener);

    /// Stop forwarding a document event. Must tolerate listeners not attached.
    fn unlisten(&mut self, listener: DocumentListener);

    /// Clear the page's text selection.
    fn clear_selection(&mut self);
}

/// Pointer input relevant to a sensor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// DOM button code; only `0` (primary) arms a sensor.
    pub button: i16,
    /// Client coordinates.
    pub position: Point,
}

impl PointerEvent {
    /// A primary-button event at `position`.
    pub fn primary(position: Point) -> Self {
        Self {
            button: 0,
            position,
        }
    }
}

/// Activation thresholds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSensorConfig {
    /// Time after pointer-down before the drag starts on its own.
    pub activation_delay: Duration,
    /// Pointer travel, in pixels, that starts the drag before the delay elapses.
    pub activation_distance: f64,
}

impl Default for PointerSensorConfig {
    fn default() -> Self {
        Self {
            activation_delay: Duration::from_millis(250),
            activation_distance: 10.0,
        }
    }
}

impl PointerSensorConfig {
    /// Set the activation delay.
    #[must_use]
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    /// Set the activation distance.
    #[must_use]
    pub fn with_activation_distance(mut self, distance: f64) -> Self {
        self.activation_distance = distance;
        self
    }
}

/// Observable state of a [`PointerSensor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SensorPhase {
    /// Waiting for a pointer-down.
    Idle,
    /// Pointer is down on a draggable; waiting for the delay or distance.
    Armed,
    /// Driving a drag.
    Active,
}

#[derive(Debug)]
enum State<K, T> {
    Idle,
    Armed {
        draggable: K,
        origin: Point,
        timer: Option<T>,
    },
    Active,
}

/// A pointer sensor registered with one engine.
#[derive(Debug)]
pub struct PointerSensor<K, T> {
    id: K,
    config: PointerSensorConfig,
    state: State<K, T>,
}

impl<K, T> PointerSensor<K, T>
where
    K: Copy + Eq + core::fmt::Debug + 'static,
{
    /// A sensor with the given id. Call [`mount`](Self::mount) to register it.
    pub fn new(id: K, config: PointerSensorConfig) -> Self {
        Self {
            id,
            config,
            state: State::Idle,
        }
    }

    /// Sensor id.
    pub fn id(&self) -> K {
        self.id
    }

    /// Thresholds in use.
    pub fn config(&self) -> &PointerSensorConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> SensorPhase {
        match self.state {
            State::Idle => SensorPhase::Idle,
            State::Armed { .. } => SensorPhase::Armed,
            State::Active => SensorPhase::Active,
        }
    }

    /// Register with `dnd`, activated by `pointerdown`.
    pub fn mount<N, D>(&self, dnd: &mut DragDrop<K, N, D>)
    where
        N: Element + 'static,
        D: Clone + 'static,
    {
        dnd.add_sensor(self.id, [ActivatorEvent::PointerDown]);
    }

    /// Detach from the document and deregister.
    pub fn unmount<N, D, H>(&mut self, dnd: &mut DragDrop<K, N, D>, host: &mut H)
    where
        N: Element + 'static,
        D: Clone + 'static,
        H: SensorHost<Timer = T>,
    {
        self.detach(host);
        dnd.remove_sensor(self.id);
    }

    fn is_active_sensor<N, D>(&self, dnd: &DragDrop<K, N, D>) -> bool
    where
        N: Element + 'static,
        D: Clone + 'static,
    {
        dnd.active_sensor_id() == Some(self.id)
    }

    /// The `pointerdown` activator: arm on a primary-button press over `draggable`.
    ///
    /// Returns whether the sensor armed.
    pub fn activate<H>(&mut self, host: &mut H, event: &PointerEvent, draggable: K) -> bool
    where
        H: SensorHost<Timer = T>,
    {
        if event.button != 0 {
            return false;
        }
        // A stray second press re-arms from scratch.
        self.detach(host);
        host.listen(DocumentListener::PointerMove);
        host.listen(DocumentListener::PointerUp);
        let timer = host.set_timeout(self.config.activation_delay);
        self.state = State::Armed {
            draggable,
            origin: event.position,
            timer: Some(timer),
        };
        tracing::trace!(sensor = ?self.id, ?draggable, "pointer sensor armed");
        true
    }

    /// The activation timer elapsed.
    pub fn on_activation_timeout<N, D, H>(&mut self, dnd: &mut DragDrop<K, N, D>, host: &mut H)
    where
        N: Element + 'static,
        D: Clone + 'static,
        H: SensorHost<Timer = T>,
    {
        if let State::Armed { timer, .. } = &mut self.state {
            // Already fired.
            timer.take();
        }
        self.try_start(dnd, host);
    }

    fn try_start<N, D, H>(&mut self, dnd: &mut DragDrop<K, N, D>, host: &mut H)
    where
        N: Element + 'static,
        D: Clone + 'static,
        H: SensorHost<Timer = T>,
    {
        let State::Armed { draggable, origin, .. } = self.state else {
            return;
        };
        if dnd.active_sensor_id().is_some() {
            if !self.is_active_sensor(dnd) {
                tracing::debug!(sensor = ?self.id, "another sensor is active; aborting");
                self.detach(host);
            }
            return;
        }
        if let State::Armed {
            timer: Some(timer), ..
        } = core::mem::replace(&mut self.state, State::Active)
        {
            host.clear_timeout(timer);
        }
        dnd.sensor_start(self.id, origin);
        dnd.drag_start(draggable);
        host.clear_selection();
        host.listen(DocumentListener::SelectionChange);
        tracing::debug!(sensor = ?self.id, ?draggable, "pointer sensor activated");
    }

    /// Document `pointermove`. Returns whether the host should prevent the
    /// default action.
    pub fn on_pointer_move<N, D, H>(
        &mut self,
        dnd: &mut DragDrop<K, N, D>,
        host: &mut H,
        event: &PointerEvent,
    ) -> bool
    where
        N: Element + 'static,
        D: Clone + 'static,
        H: SensorHost<Timer = T>,
    {
        if let State::Armed { origin, .. } = self.state {
            if dnd.active_sensor_id().is_none()
                && distance_between_points(origin, event.position)
                    > self.config.activation_distance
            {
                self.try_start(dnd, host);
            }
        }
        if self.is_active_sensor(dnd) {
            dnd.sensor_move(event.position);
            return true;
        }
        false
    }

    /// Document `pointerup`. Detaches, then ends the drag if this sensor drove
    /// one. Returns whether the host should prevent the default action.
    pub fn on_pointer_up<N, D, H>(&mut self, dnd: &mut DragDrop<K, N, D>, host: &mut H) -> bool
    where
        N: Element + 'static,
        D: Clone + 'static,
        H: SensorHost<Timer = T>,
    {
        self.detach(host);
        if self.is_active_sensor(dnd) {
            dnd.drag_end();
            dnd.sensor_end();
            tracing::debug!(sensor = ?self.id, "pointer sensor released");
            return true;
        }
        false
    }

    /// Document `selectionchange` during a drag.
    pub fn on_selection_change<H>(&self, host: &mut H)
    where
        H: SensorHost<Timer = T>,
    {
        if matches!(self.state, State::Active) {
            host.clear_selection();
        }
    }

    fn detach<H>(&mut self, host: &mut H)
    where
        H: SensorHost<Timer = T>,
    {
        match core::mem::replace(&mut self.state, State::Idle) {
            State::Idle => return,
            State::Armed {
                timer: Some(timer), ..
            } => host.clear_timeout(timer),
            State::Armed { timer: None, .. } | State::Active => {}
        }
        host.unlisten(DocumentListener::PointerMove);
        host.unlisten(DocumentListener::PointerUp);
        host.unlisten(DocumentListener::SelectionChange);
    }
}
