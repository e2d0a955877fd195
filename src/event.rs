//! Events and channel descriptions.
//!
//! Drivers report input changes as small, family-agnostic deltas ([`InputKind`]);
//! the logical controller timestamps them ([`InputEvent`]).
//!
//! ## Value conventions
//! - **Axes:** signed 16-bit, full range `-32768..=32767` whatever the source bit width.
//!   Triggers rest at `-32768`.
//! - **Buttons:** press/release edges only.
//! - **D-pad:** reported as the four `DPad*` buttons.
//! - **Touchpad:** positions in `[0, 1] x [0, 1]`, pressure `0.0` or `1.0` on families
//!   without a pressure sensor.

use crate::metadata::DeviceId;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Logical buttons, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    /// Touchpad click on PS4-class pads.
    Misc,
}

impl Button {
    pub const COUNT: usize = 16;

    pub const ALL: [Button; Button::COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Back,
        Button::Guide,
        Button::Start,
        Button::LeftStick,
        Button::RightStick,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
        Button::Misc,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Logical axes, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

impl Axis {
    pub const COUNT: usize = 6;

    pub const ALL: [Axis; Axis::COUNT] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::TriggerLeft,
        Axis::TriggerRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Battery bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerLevel {
    Empty,
    Low,
    Medium,
    Full,
    /// Running from the cable; level is not meaningful.
    #[default]
    Wired,
}

impl PowerLevel {
    /// Bucket a 0..=10 battery level, or force `Wired` when charging from the cable.
    pub fn from_level(level: u8, wired: bool) -> Self {
        if wired {
            return PowerLevel::Wired;
        }
        match level {
            0 => PowerLevel::Empty,
            1..=2 => PowerLevel::Low,
            3..=7 => PowerLevel::Medium,
            _ => PowerLevel::Full,
        }
    }
}

/// Fixed capability metadata a driver reports to its logical controller at open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickCaps {
    pub buttons: u16,
    pub axes: u16,
    pub power: PowerLevel,
    /// Number of touchpads and contacts per touchpad (0 when absent).
    pub touchpads: u8,
    pub touchpad_fingers: u8,
}

/// Per-device input change (delta).
#[derive(Clone, Debug, PartialEq)]
pub enum InputKind {
    ButtonPressed { button: Button },
    ButtonReleased { button: Button },

    /// Re-emitted on every decoded report, changed or not.
    AxisMoved { axis: Axis, value: i16 },

    /// One touch contact sample. Re-emitted on every decoded report.
    Touchpad {
        touchpad: u8,
        finger: u8,
        down: bool,
        x: f32,
        y: f32,
        pressure: f32,
    },

    /// Battery bucket changed.
    PowerChanged { level: PowerLevel },

    /// The device vanished. Emitted exactly once per context.
    Disconnected,
}

impl InputKind {
    pub fn button(button: Button, pressed: bool) -> Self {
        if pressed {
            InputKind::ButtonPressed { button }
        } else {
            InputKind::ButtonReleased { button }
        }
    }
}

/// Timestamped input event captured by a logical controller.
#[derive(Clone, Debug)]
pub struct InputEvent {
    pub device: DeviceId,
    /// Capture time (monotonic).
    pub at: Instant,
    pub kind: InputKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_buckets() {
        assert_eq!(PowerLevel::from_level(0, false), PowerLevel::Empty);
        assert_eq!(PowerLevel::from_level(1, false), PowerLevel::Low);
        assert_eq!(PowerLevel::from_level(2, false), PowerLevel::Low);
        assert_eq!(PowerLevel::from_level(3, false), PowerLevel::Medium);
        assert_eq!(PowerLevel::from_level(5, false), PowerLevel::Medium);
        assert_eq!(PowerLevel::from_level(7, false), PowerLevel::Medium);
        assert_eq!(PowerLevel::from_level(8, false), PowerLevel::Full);
        assert_eq!(PowerLevel::from_level(10, false), PowerLevel::Full);
        for level in 0..=15 {
            assert_eq!(PowerLevel::from_level(level, true), PowerLevel::Wired);
        }
    }

    #[test]
    fn canonical_indices() {
        for (i, b) in Button::ALL.iter().enumerate() {
            assert_eq!(b.index(), i);
        }
        for (i, a) in Axis::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
        }
    }
}
