//! Logical controller boundary.
//!
//! Drivers report to a [`ControllerTarget`]: fixed capabilities once at open,
//! then a stream of [`InputKind`] deltas. [`Joystick`] is the concrete target the
//! [`DeviceManager`](crate::manager::DeviceManager) uses; it timestamps events
//! and tracks the last power level and pressed buttons.

use crate::event::{InputEvent, InputKind, JoystickCaps, PowerLevel};
use crate::metadata::DeviceId;
use crate::snapshot::ButtonSet;
use std::time::Instant;

/// What a driver needs from the owning controller manager.
pub trait ControllerTarget {
    /// Player slot assigned by the manager; negative when unassigned.
    fn player_index(&self) -> i32;

    fn set_capabilities(&mut self, caps: JoystickCaps);

    fn emit(&mut self, kind: InputKind);
}

/// A logical controller backed by one device.
#[derive(Debug)]
pub struct Joystick {
    id: DeviceId,
    name: String,
    player_index: i32,
    caps: JoystickCaps,
    power: PowerLevel,
    pressed: ButtonSet,
    connected: bool,
    pending: Vec<InputEvent>,
}

impl Joystick {
    pub fn new(id: DeviceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            player_index: -1,
            caps: JoystickCaps::default(),
            power: PowerLevel::default(),
            pressed: ButtonSet::default(),
            connected: true,
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn caps(&self) -> JoystickCaps {
        self.caps
    }

    pub fn power(&self) -> PowerLevel {
        self.power
    }

    pub fn pressed(&self) -> ButtonSet {
        self.pressed
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_player_index(&mut self, index: i32) {
        self.player_index = index;
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl ControllerTarget for Joystick {
    fn player_index(&self) -> i32 {
        self.player_index
    }

    fn set_capabilities(&mut self, caps: JoystickCaps) {
        self.caps = caps;
        self.power = caps.power;
    }

    fn emit(&mut self, kind: InputKind) {
        match &kind {
            InputKind::ButtonPressed { button } => self.pressed.set(*button, true),
            InputKind::ButtonReleased { button } => self.pressed.set(*button, false),
            InputKind::PowerChanged { level } => self.power = *level,
            InputKind::Disconnected => self.connected = false,
            InputKind::AxisMoved { .. } | InputKind::Touchpad { .. } => {}
        }
        self.pending.push(InputEvent {
            device: self.id,
            at: Instant::now(),
            kind,
        });
    }
}
