//! Decoded device state and pending output.
//!
//! [`NormalizedState`] is an **owned**, immutable view of one decoded input
//! report. The driver keeps the previous one in its
//! [`DeviceContext`](crate::context::DeviceContext) and diffs the next one
//! against it (see [`diff`](crate::diff)); after that the new snapshot replaces
//! the old one wholesale.
//!
//! [`EffectCommand`] is the desired output state (rumble, LED, volume). The
//! wire codec reads it; only driver setters write it.

use crate::event::{Axis, Button, PowerLevel};

/// Maximum number of packed button bytes a family may expose.
pub const MAX_BUTTON_GROUPS: usize = 4;

/// Number of touch contacts tracked per snapshot.
pub const MAX_TOUCH_CONTACTS: usize = 2;

/// Map an 8-bit raw axis onto the full signed 16-bit range.
///
/// `0 -> -32768`, `255 -> 32767`.
#[inline]
pub fn normalize_axis_u8(raw: u8) -> i16 {
    (i32::from(raw) * 257 - 32768) as i16
}

/// Directional pad: centered or one of 8 compass points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DPad {
    #[default]
    Centered,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

/// Direction flags for a [`DPad`] position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DPadFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

const HAT_TABLE: [DPad; 8] = [
    DPad::Up,
    DPad::UpRight,
    DPad::Right,
    DPad::DownRight,
    DPad::Down,
    DPad::DownLeft,
    DPad::Left,
    DPad::UpLeft,
];

impl DPad {
    /// Decode a 4-bit hat code (0 = up, clockwise). Anything outside 0..=7 is centered.
    #[inline]
    pub fn from_hat(code: u8) -> Self {
        HAT_TABLE
            .get(usize::from(code))
            .copied()
            .unwrap_or(DPad::Centered)
    }

    pub fn flags(self) -> DPadFlags {
        let (up, down, left, right) = match self {
            DPad::Centered => (false, false, false, false),
            DPad::Up => (true, false, false, false),
            DPad::UpRight => (true, false, false, true),
            DPad::Right => (false, false, false, true),
            DPad::DownRight => (false, true, false, true),
            DPad::Down => (false, true, false, false),
            DPad::DownLeft => (false, true, true, false),
            DPad::Left => (false, false, true, false),
            DPad::UpLeft => (true, false, true, false),
        };
        DPadFlags {
            up,
            down,
            left,
            right,
        }
    }
}

/// Bitset over [`Button`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet(u32);

impl ButtonSet {
    #[inline]
    pub fn contains(self, button: Button) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.0 |= 1 << button.index();
        } else {
            self.0 &= !(1 << button.index());
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

/// One touch contact.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchContact {
    pub down: bool,
    /// Normalized to `[0, 1]`.
    pub x: f32,
    /// Normalized to `[0, 1]`.
    pub y: f32,
    pub pressure: f32,
}

/// Decoded snapshot of one input report.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedState {
    /// Button-carrying bytes as decoded, masked to button bits. The differ
    /// compares these group by group before looking at individual buttons.
    pub button_groups: [u8; MAX_BUTTON_GROUPS],
    pub buttons: ButtonSet,
    pub dpad: DPad,
    pub axes: [i16; Axis::COUNT],
    pub touches: [TouchContact; MAX_TOUCH_CONTACTS],
    pub battery: PowerLevel,
    /// Source report counter. Only used to drop duplicate deliveries.
    pub sequence: u8,
}

impl NormalizedState {
    #[inline]
    pub fn axis(&self, axis: Axis) -> i16 {
        self.axes[axis.index()]
    }

    #[inline]
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons.contains(button)
    }
}

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Desired output state for one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectCommand {
    /// Low-frequency (large) motor.
    pub rumble_left: u8,
    /// High-frequency (small) motor.
    pub rumble_right: u8,
    /// Explicit LED color. `None` = derive from `player_index`.
    pub color: Option<Rgb>,
    /// Negative = unset.
    pub player_index: i32,
    /// Headset/speaker volume. `None` = leave the device's own setting.
    pub volume: Option<u8>,
}

impl Default for EffectCommand {
    fn default() -> Self {
        Self {
            rumble_left: 0,
            rumble_right: 0,
            color: None,
            player_index: -1,
            volume: None,
        }
    }
}

impl EffectCommand {
    /// LED color to send: the explicit one, or the palette entry for the player slot.
    pub fn led_color(&self, palette: &[Rgb]) -> Rgb {
        match self.color {
            Some(color) => color,
            None => palette_color(palette, self.player_index),
        }
    }
}

/// Palette lookup: index modulo palette size, negative index maps to entry 0.
pub fn palette_color(palette: &[Rgb], player_index: i32) -> Rgb {
    if palette.is_empty() {
        return Rgb::default();
    }
    let slot = if player_index >= 0 {
        player_index as usize % palette.len()
    } else {
        0
    };
    palette[slot]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_endpoints() {
        assert_eq!(normalize_axis_u8(0), i16::MIN);
        assert_eq!(normalize_axis_u8(255), i16::MAX);
        assert_eq!(normalize_axis_u8(128), 128);
        assert_eq!(normalize_axis_u8(127), -129);
    }

    #[test]
    fn hat_codes() {
        assert_eq!(DPad::from_hat(0), DPad::Up);
        assert_eq!(DPad::from_hat(3), DPad::DownRight);
        assert_eq!(DPad::from_hat(7), DPad::UpLeft);
        for code in 8..=15 {
            assert_eq!(DPad::from_hat(code), DPad::Centered);
            assert_eq!(DPad::from_hat(code).flags(), DPadFlags::default());
        }
    }

    #[test]
    fn button_set_roundtrip() {
        let mut set = ButtonSet::default();
        set.set(Button::Start, true);
        set.set(Button::Misc, true);
        assert!(set.contains(Button::Start));
        assert!(!set.contains(Button::A));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Button::Start, Button::Misc]);
        set.set(Button::Start, false);
        assert!(!set.contains(Button::Start));
    }

    #[test]
    fn palette_wraps_and_clamps() {
        let palette = [Rgb::new(1, 0, 0), Rgb::new(0, 1, 0), Rgb::new(0, 0, 1)];
        assert_eq!(palette_color(&palette, -1), palette[0]);
        assert_eq!(palette_color(&palette, -42), palette[0]);
        assert_eq!(palette_color(&palette, 1), palette[1]);
        assert_eq!(palette_color(&palette, 5), palette[2]);
    }

    #[test]
    fn explicit_color_wins() {
        let palette = [Rgb::new(1, 0, 0)];
        let mut cmd = EffectCommand::default();
        assert_eq!(cmd.led_color(&palette), palette[0]);
        cmd.color = Some(Rgb::new(9, 9, 9));
        assert_eq!(cmd.led_color(&palette), Rgb::new(9, 9, 9));
    }
}
