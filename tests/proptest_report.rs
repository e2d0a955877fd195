//! Property-based tests for the PS4 report codec and the state differ.

use padlink::diff::diff_states;
use padlink::drivers::ps4::report::{bluetooth_crc, decode_input, encode_effects, BUTTON_LAYOUT};
use padlink::probe::ConnectionKind;
use padlink::snapshot::{normalize_axis_u8, DPad, EffectCommand, Rgb};
use padlink::{DriverCapabilities, InputKind, PowerLevel};
use proptest::prelude::*;

fn usb_report(b0: u8, b1: u8, b2: u8) -> Vec<u8> {
    let mut r = vec![0u8; 64];
    r[0] = 0x01;
    r[1..5].fill(0x80);
    r[5] = b0;
    r[6] = b1;
    r[7] = b2;
    r[35] = 0x80;
    r[39] = 0x80;
    r
}

fn button_events(events: &[InputKind]) -> usize {
    events
        .iter()
        .filter(|k| matches!(k, InputKind::ButtonPressed { .. } | InputKind::ButtonReleased { .. }))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Axis normalization is strictly increasing, so it is also injective.
    #[test]
    fn prop_axis_strictly_increasing(a in 0u8..255) {
        prop_assert!(normalize_axis_u8(a) < normalize_axis_u8(a + 1));
    }

    /// Hat codes 8..=15 are centered; 0..=7 never set opposite directions.
    #[test]
    fn prop_hat_codes(code in 0u8..16) {
        let dpad = DPad::from_hat(code);
        let flags = dpad.flags();
        if code >= 8 {
            prop_assert_eq!(dpad, DPad::Centered);
        } else {
            prop_assert_ne!(dpad, DPad::Centered);
        }
        prop_assert!(!(flags.up && flags.down));
        prop_assert!(!(flags.left && flags.right));
    }

    /// The cable always wins; otherwise higher levels never bucket lower.
    #[test]
    fn prop_battery_buckets(level in 0u8..16) {
        prop_assert_eq!(PowerLevel::from_level(level, true), PowerLevel::Wired);
        let rank = |p: PowerLevel| match p {
            PowerLevel::Empty => 0,
            PowerLevel::Low => 1,
            PowerLevel::Medium => 2,
            PowerLevel::Full => 3,
            PowerLevel::Wired => 4,
        };
        if level < 15 {
            prop_assert!(
                rank(PowerLevel::from_level(level, false)) <= rank(PowerLevel::from_level(level + 1, false))
            );
        }
    }

    /// Decoding arbitrary bytes never panics.
    #[test]
    fn prop_decode_total(data in proptest::collection::vec(any::<u8>(), 0..80)) {
        let _ = decode_input(&data);
    }

    /// Flipping one button bit between two reports yields exactly one button event.
    #[test]
    fn prop_one_bit_one_event(b0 in 0u8..=255, b1 in 0u8..=255, b2 in 0u8..4, bit in 0usize..12) {
        // Face buttons (b0 high nibble), b1 minus the trigger bits, b2 low two bits.
        let (byte, mask) = match bit {
            0..=3 => (0, 0x10u8 << bit),
            4..=5 => (1, 1u8 << (bit - 4)),
            6..=9 => (1, 0x10u8 << (bit - 6)),
            _ => (2, 1u8 << (bit - 10)),
        };
        let before = usb_report(b0, b1, b2);
        let mut after = before.clone();
        after[5 + byte] ^= mask;

        let prev = decode_input(&before).unwrap();
        let cur = decode_input(&after).unwrap();
        let mut events = Vec::new();
        diff_states(Some(&prev), &cur, &BUTTON_LAYOUT, &mut events);
        prop_assert_eq!(button_events(&events), 1);
    }

    /// The trailing CRC always matches the rest of a Bluetooth report.
    #[test]
    fn prop_bt_crc_matches(
        left in any::<u8>(),
        right in any::<u8>(),
        r in any::<u8>(),
        g in any::<u8>(),
        b in any::<u8>(),
    ) {
        let cmd = EffectCommand {
            rumble_left: left,
            rumble_right: right,
            color: Some(Rgb::new(r, g, b)),
            ..EffectCommand::default()
        };
        let caps = DriverCapabilities::for_connection(ConnectionKind::Bluetooth);
        let report = encode_effects(&cmd, &caps);
        let bytes = report.as_bytes();
        prop_assert_eq!(bytes.len(), 78);
        let crc = bluetooth_crc(&bytes[..74]);
        prop_assert_eq!(&bytes[74..], &crc.to_le_bytes()[..]);
    }

    /// Any single-byte change alters the CRC.
    #[test]
    fn prop_crc_detects_byte_change(
        data in proptest::collection::vec(any::<u8>(), 1..80),
        idx in any::<prop::sample::Index>(),
        delta in 1u8..=255,
    ) {
        let mut changed = data.clone();
        let i = idx.index(data.len());
        changed[i] = changed[i].wrapping_add(delta);
        prop_assert_ne!(bluetooth_crc(&data), bluetooth_crc(&changed));
    }
}
