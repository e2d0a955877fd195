//! State differ.
//!
//! Turns a `(previous, current)` pair of [`NormalizedState`]s into the events a
//! logical controller needs:
//! - buttons: per group, skip entirely if the group byte is unchanged, else
//!   emit one edge per button whose state differs;
//! - axes and touch contacts: always re-emitted;
//! - battery: only when the bucket changes.
//!
//! With no previous snapshot every group counts as changed against an all-released state.

use crate::event::{Axis, Button, InputKind};
use crate::snapshot::{ButtonSet, NormalizedState};

/// Which logical buttons live in which packed group byte.
///
/// `groups[i]` lists the buttons decoded from `NormalizedState::button_groups[i]`.
#[derive(Clone, Copy, Debug)]
pub struct ButtonLayout {
    pub groups: &'static [&'static [Button]],
}

pub fn diff_states(
    prev: Option<&NormalizedState>,
    cur: &NormalizedState,
    layout: &ButtonLayout,
    out: &mut Vec<InputKind>,
) {
    let prev_buttons = prev.map(|p| p.buttons).unwrap_or_default();

    for (group, members) in layout.groups.iter().enumerate() {
        if let Some(prev) = prev {
            if prev.button_groups.get(group) == cur.button_groups.get(group) {
                continue;
            }
        }
        emit_changed(prev_buttons, cur.buttons, members, out);
    }

    for axis in Axis::ALL {
        out.push(InputKind::AxisMoved {
            axis,
            value: cur.axis(axis),
        });
    }

    for (finger, contact) in cur.touches.iter().enumerate() {
        out.push(InputKind::Touchpad {
            touchpad: 0,
            finger: finger as u8,
            down: contact.down,
            x: contact.x,
            y: contact.y,
            pressure: contact.pressure,
        });
    }

    if prev.map(|p| p.battery) != Some(cur.battery) {
        out.push(InputKind::PowerChanged { level: cur.battery });
    }
}

fn emit_changed(prev: ButtonSet, cur: ButtonSet, members: &[Button], out: &mut Vec<InputKind>) {
    for &button in members {
        let pressed = cur.contains(button);
        if prev.contains(button) != pressed {
            out.push(InputKind::button(button, pressed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PowerLevel;

    const LAYOUT: ButtonLayout = ButtonLayout {
        groups: &[&[Button::A, Button::B], &[Button::Start]],
    };

    fn buttons_of(events: &[InputKind]) -> Vec<InputKind> {
        events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    InputKind::ButtonPressed { .. } | InputKind::ButtonReleased { .. }
                )
            })
            .cloned()
            .collect()
    }

    fn state(group0: u8, group1: u8) -> NormalizedState {
        let mut s = NormalizedState::default();
        s.button_groups[0] = group0;
        s.button_groups[1] = group1;
        s.buttons.set(Button::A, group0 & 0x01 != 0);
        s.buttons.set(Button::B, group0 & 0x02 != 0);
        s.buttons.set(Button::Start, group1 & 0x01 != 0);
        s
    }

    #[test]
    fn unchanged_groups_emit_no_buttons() {
        let a = state(0x03, 0x01);
        let mut out = Vec::new();
        diff_states(Some(&a), &a, &LAYOUT, &mut out);
        assert!(buttons_of(&out).is_empty());
    }

    #[test]
    fn one_bit_one_event() {
        let a = state(0x01, 0x00);
        let b = state(0x03, 0x00);
        let mut out = Vec::new();
        diff_states(Some(&a), &b, &LAYOUT, &mut out);
        assert_eq!(
            buttons_of(&out),
            vec![InputKind::ButtonPressed { button: Button::B }]
        );
    }

    #[test]
    fn unchanged_group_is_skipped_even_if_buttons_disagree() {
        // Group byte is the pre-filter: identical bytes mean no events for that group.
        let a = state(0x01, 0x00);
        let mut b = a;
        b.buttons.set(Button::A, false);
        let mut out = Vec::new();
        diff_states(Some(&a), &b, &LAYOUT, &mut out);
        assert!(buttons_of(&out).is_empty());
    }

    #[test]
    fn axes_and_touch_always_emitted() {
        let a = state(0, 0);
        let mut out = Vec::new();
        diff_states(Some(&a), &a, &LAYOUT, &mut out);
        let axes = out
            .iter()
            .filter(|e| matches!(e, InputKind::AxisMoved { .. }))
            .count();
        let touches = out
            .iter()
            .filter(|e| matches!(e, InputKind::Touchpad { .. }))
            .count();
        assert_eq!(axes, Axis::COUNT);
        assert_eq!(touches, 2);
    }

    #[test]
    fn battery_only_on_bucket_change() {
        let mut a = state(0, 0);
        a.battery = PowerLevel::Medium;
        let mut out = Vec::new();
        diff_states(Some(&a), &a, &LAYOUT, &mut out);
        assert!(!out
            .iter()
            .any(|e| matches!(e, InputKind::PowerChanged { .. })));

        let mut b = a;
        b.battery = PowerLevel::Low;
        out.clear();
        diff_states(Some(&a), &b, &LAYOUT, &mut out);
        assert!(out.contains(&InputKind::PowerChanged {
            level: PowerLevel::Low
        }));
    }

    #[test]
    fn first_snapshot_reports_pressed_buttons_and_battery() {
        let a = state(0x01, 0x01);
        let mut out = Vec::new();
        diff_states(None, &a, &LAYOUT, &mut out);
        assert_eq!(
            buttons_of(&out),
            vec![
                InputKind::ButtonPressed { button: Button::A },
                InputKind::ButtonPressed {
                    button: Button::Start
                },
            ]
        );
        assert!(out.contains(&InputKind::PowerChanged {
            level: PowerLevel::Wired
        }));
    }
}
