//! DualShock 4 wire format.
//!
//! Pure functions: input report bytes to [`NormalizedState`], and
//! [`EffectCommand`] to output report bytes. No I/O.
//!
//! ## Input
//! - USB: report `0x01`, state packet at offset 1.
//! - Bluetooth: reports `0x11..=0x19`, two prefix bytes, state packet at offset 3.
//!   Bit 7 of the first prefix byte says whether the packet carries HID data.
//!
//! ## Output
//! - USB: report `0x05`, 32 bytes, effects block at offset 4.
//! - Bluetooth: report `0x11`, 78 bytes, effects block at offset 6, CRC-32 trailer
//!   over `0xA2` (HIDP output header) followed by the first 74 bytes.

use crate::context::DriverCapabilities;
use crate::diff::ButtonLayout;
use crate::event::{Axis, Button, PowerLevel};
use crate::snapshot::{
    normalize_axis_u8, ButtonSet, DPad, EffectCommand, NormalizedState, Rgb,
    TouchContact,
};
use crc32fast::Hasher;
use tracing::trace;

pub const REPORT_ID_USB_STATE: u8 = 0x01;
pub const REPORT_ID_USB_EFFECTS: u8 = 0x05;
pub const REPORT_ID_BT_STATE_FIRST: u8 = 0x11;
pub const REPORT_ID_BT_STATE_LAST: u8 = 0x19;
pub const REPORT_ID_BT_EFFECTS: u8 = 0x11;

/// Feature report that only answers over USB.
pub const FEATURE_REPORT_SERIAL_NUMBER: u8 = 0x12;

pub const USB_EFFECTS_LEN: usize = 32;
pub const BT_EFFECTS_LEN: usize = 78;
const USB_EFFECTS_OFFSET: usize = 4;
const BT_EFFECTS_OFFSET: usize = 6;

/// Rumble | lightbar | blink interval.
const USB_EFFECTS_FLAGS: u8 = 0x07;
/// HID + CRC present, 4 ms sample interval.
const BT_EFFECTS_HEADER: u8 = 0xC0 | 0x04;
/// Rumble | lightbar.
const BT_EFFECTS_FLAGS: u8 = 0x03;
/// Headset | speaker volume.
const EFFECTS_FLAG_VOLUME: u8 = 0x10 | 0x40;

const BT_CRC_HEADER: u8 = 0xA2;
const CRC_LEN: usize = 4;

const BT_HID_PRESENT: u8 = 0x80;
const USB_STATE_OFFSET: usize = 1;
const BT_STATE_OFFSET: usize = 3;

// State packet layout.
const STATE_LEN: usize = 42;
const OFF_LEFT_X: usize = 0;
const OFF_LEFT_Y: usize = 1;
const OFF_RIGHT_X: usize = 2;
const OFF_RIGHT_Y: usize = 3;
const OFF_BUTTONS: usize = 4;
const OFF_TRIGGER_LEFT: usize = 7;
const OFF_TRIGGER_RIGHT: usize = 8;
const OFF_BATTERY: usize = 29;
const OFF_TOUCH: [usize; 2] = [34, 38];

// Effects block layout (relative to the transport offset).
const FX_RUMBLE_RIGHT: usize = 0;
const FX_RUMBLE_LEFT: usize = 1;
const FX_LED_RED: usize = 2;
const FX_LED_GREEN: usize = 3;
const FX_LED_BLUE: usize = 4;
const FX_VOLUME_LEFT: usize = 15;
const FX_VOLUME_RIGHT: usize = 16;
const FX_VOLUME_SPEAKER: usize = 18;

const TOUCHPAD_SCALE_X: f32 = 1.0 / 1920.0;
// Panel is nominally 944 high; 920 maps the reachable area better.
const TOUCHPAD_SCALE_Y: f32 = 1.0 / 920.0;

/// Same table as the Linux hid-sony driver; the first four match the console.
pub const PLAYER_COLORS: [Rgb; 7] = [
    Rgb::new(0x00, 0x00, 0x40), // blue
    Rgb::new(0x40, 0x00, 0x00), // red
    Rgb::new(0x00, 0x40, 0x00), // green
    Rgb::new(0x20, 0x00, 0x20), // pink
    Rgb::new(0x02, 0x01, 0x00), // orange
    Rgb::new(0x00, 0x01, 0x01), // teal
    Rgb::new(0x01, 0x01, 0x01), // white
];

/// Button bits per packed byte (group 0 low nibble is the hat).
pub const BUTTON_LAYOUT: ButtonLayout = ButtonLayout {
    groups: &[
        &[
            Button::X,
            Button::A,
            Button::B,
            Button::Y,
            Button::DPadUp,
            Button::DPadDown,
            Button::DPadLeft,
            Button::DPadRight,
        ],
        &[
            Button::LeftShoulder,
            Button::RightShoulder,
            Button::Back,
            Button::Start,
            Button::LeftStick,
            Button::RightStick,
        ],
        &[Button::Guide, Button::Misc],
    ],
};

// Group 1 also carries the digital L2/R2 bits, which are not buttons.
const GROUP1_BUTTON_MASK: u8 = 0xF3;
const GROUP1_TRIGGER_LEFT: u8 = 0x04;
const GROUP1_TRIGGER_RIGHT: u8 = 0x08;
// Group 2 upper six bits are the report counter.
const GROUP2_BUTTON_MASK: u8 = 0x03;

/// Decode one input report (leading report id included).
///
/// Returns `None` for unknown report ids, Bluetooth packets without HID data,
/// and buffers too short for a state packet.
pub fn decode_input(data: &[u8]) -> Option<NormalizedState> {
    let (&id, _) = data.split_first()?;
    let offset = match id {
        REPORT_ID_USB_STATE => USB_STATE_OFFSET,
        REPORT_ID_BT_STATE_FIRST..=REPORT_ID_BT_STATE_LAST => {
            if data.get(1).copied().unwrap_or(0) & BT_HID_PRESENT == 0 {
                return None;
            }
            BT_STATE_OFFSET
        }
        _ => {
            trace!("unknown PS4 packet: 0x{id:02x}");
            return None;
        }
    };
    match data.get(offset..offset + STATE_LEN) {
        Some(packet) => Some(decode_state(packet)),
        None => {
            trace!("truncated PS4 packet 0x{id:02x}: {} bytes", data.len());
            None
        }
    }
}

/// Decode a bare 42-byte state packet.
fn decode_state(p: &[u8]) -> NormalizedState {
    let b0 = p[OFF_BUTTONS];
    let b1 = p[OFF_BUTTONS + 1];
    let b2 = p[OFF_BUTTONS + 2];

    let mut buttons = ButtonSet::default();
    let face = b0 >> 4;
    buttons.set(Button::X, face & 0x01 != 0);
    buttons.set(Button::A, face & 0x02 != 0);
    buttons.set(Button::B, face & 0x04 != 0);
    buttons.set(Button::Y, face & 0x08 != 0);

    let dpad = DPad::from_hat(b0 & 0x0F);
    let flags = dpad.flags();
    buttons.set(Button::DPadUp, flags.up);
    buttons.set(Button::DPadDown, flags.down);
    buttons.set(Button::DPadLeft, flags.left);
    buttons.set(Button::DPadRight, flags.right);

    buttons.set(Button::LeftShoulder, b1 & 0x01 != 0);
    buttons.set(Button::RightShoulder, b1 & 0x02 != 0);
    buttons.set(Button::Back, b1 & 0x10 != 0);
    buttons.set(Button::Start, b1 & 0x20 != 0);
    buttons.set(Button::LeftStick, b1 & 0x40 != 0);
    buttons.set(Button::RightStick, b1 & 0x80 != 0);

    buttons.set(Button::Guide, b2 & 0x01 != 0);
    buttons.set(Button::Misc, b2 & 0x02 != 0);

    // Some fight sticks only set the digital trigger bits and leave the analog byte at 0.
    let trigger_left = synthesize_trigger(p[OFF_TRIGGER_LEFT], b1 & GROUP1_TRIGGER_LEFT != 0);
    let trigger_right = synthesize_trigger(p[OFF_TRIGGER_RIGHT], b1 & GROUP1_TRIGGER_RIGHT != 0);

    let mut axes = [0i16; Axis::COUNT];
    axes[Axis::LeftX.index()] = normalize_axis_u8(p[OFF_LEFT_X]);
    axes[Axis::LeftY.index()] = normalize_axis_u8(p[OFF_LEFT_Y]);
    axes[Axis::RightX.index()] = normalize_axis_u8(p[OFF_RIGHT_X]);
    axes[Axis::RightY.index()] = normalize_axis_u8(p[OFF_RIGHT_Y]);
    axes[Axis::TriggerLeft.index()] = normalize_axis_u8(trigger_left);
    axes[Axis::TriggerRight.index()] = normalize_axis_u8(trigger_right);

    let battery = p[OFF_BATTERY];
    let battery = PowerLevel::from_level(battery & 0x0F, battery & 0x10 != 0);

    let touches = OFF_TOUCH.map(|off| decode_touch(p[off], [p[off + 1], p[off + 2], p[off + 3]]));

    NormalizedState {
        button_groups: [b0, b1 & GROUP1_BUTTON_MASK, b2 & GROUP2_BUTTON_MASK, 0],
        buttons,
        dpad,
        axes,
        touches,
        battery,
        sequence: b2 >> 2,
    }
}

#[inline]
fn synthesize_trigger(analog: u8, digital: bool) -> u8 {
    if digital && analog == 0 {
        u8::MAX
    } else {
        analog
    }
}

fn decode_touch(counter: u8, data: [u8; 3]) -> TouchContact {
    let down = counter & 0x80 == 0;
    let x = u16::from(data[0]) | (u16::from(data[1] & 0x0F) << 8);
    let y = u16::from(data[1] >> 4) | (u16::from(data[2]) << 4);
    TouchContact {
        down,
        x: (f32::from(x) * TOUCHPAD_SCALE_X).clamp(0.0, 1.0),
        y: (f32::from(y) * TOUCHPAD_SCALE_Y).clamp(0.0, 1.0),
        pressure: if down { 1.0 } else { 0.0 },
    }
}

/// Encoded output report, sized for the transport it was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectsReport {
    buf: [u8; BT_EFFECTS_LEN],
    len: usize,
}

impl EffectsReport {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn report_id(&self) -> u8 {
        self.buf[0]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Build the output report for `cmd` on the transport described by `caps`.
pub fn encode_effects(cmd: &EffectCommand, caps: &DriverCapabilities) -> EffectsReport {
    let mut buf = [0u8; BT_EFFECTS_LEN];

    let (len, offset, flags_at) = if caps.is_bluetooth {
        buf[0] = REPORT_ID_BT_EFFECTS;
        buf[1] = BT_EFFECTS_HEADER;
        buf[3] = BT_EFFECTS_FLAGS;
        (BT_EFFECTS_LEN, BT_EFFECTS_OFFSET, 3)
    } else {
        buf[0] = REPORT_ID_USB_EFFECTS;
        buf[1] = USB_EFFECTS_FLAGS;
        (USB_EFFECTS_LEN, USB_EFFECTS_OFFSET, 1)
    };

    let fx = &mut buf[offset..];
    fx[FX_RUMBLE_LEFT] = cmd.rumble_left;
    fx[FX_RUMBLE_RIGHT] = cmd.rumble_right;

    let color = cmd.led_color(&PLAYER_COLORS);
    fx[FX_LED_RED] = color.r;
    fx[FX_LED_GREEN] = color.g;
    fx[FX_LED_BLUE] = color.b;

    if let (true, Some(volume)) = (caps.supports_audio, cmd.volume) {
        fx[FX_VOLUME_LEFT] = volume;
        fx[FX_VOLUME_RIGHT] = volume;
        fx[FX_VOLUME_SPEAKER] = volume;
        buf[flags_at] |= EFFECTS_FLAG_VOLUME;
    }

    if caps.is_bluetooth {
        let crc = bluetooth_crc(&buf[..len - CRC_LEN]);
        buf[len - CRC_LEN..len].copy_from_slice(&crc.to_le_bytes());
    }

    EffectsReport { buf, len }
}

/// CRC-32 (ISO-HDLC) over the HIDP output header byte followed by `data`.
pub fn bluetooth_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[BT_CRC_HEADER]);
    hasher.update(data);
    hasher.finalize()
}
