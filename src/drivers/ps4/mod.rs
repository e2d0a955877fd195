//! PS4-class controllers (DualShock 4 and compatible pads).
//!
//! Handles both the simplified USB report and the extended Bluetooth reports.
//! Connection type is not in the enumeration data: the wireless adapter is
//! known by id, Sony pads are probed with the serial-number feature report,
//! and third-party pads are always wired.

pub mod report;

use crate::config::Ps4Config;
use crate::context::{DeviceContext, DriverCapabilities};
use crate::diff::diff_states;
use crate::drivers::ControllerDriver;
use crate::error::{DriverError, Result};
use crate::event::{Axis, Button, InputKind, JoystickCaps, PowerLevel};
use crate::joystick::ControllerTarget;
use crate::metadata::{
    ControllerType, DeviceDescriptor, USB_PRODUCT_RAZER_PANTHERA, USB_PRODUCT_RAZER_PANTHERA_EVO,
    USB_PRODUCT_SONY_DS4_DONGLE, USB_PRODUCT_SONY_DS4_SLIM, USB_VENDOR_RAZER, USB_VENDOR_SONY,
};
use crate::probe::{probe_connection, ConnectionKind};
use crate::snapshot::{EffectCommand, NormalizedState, Rgb};
use crate::transport::{HidBackend, MAX_REPORT_LEN};
use tracing::{debug, warn};

#[derive(Clone, Debug, Default)]
pub struct Ps4Driver {
    config: Ps4Config,
}

impl Ps4Driver {
    pub fn new(config: Ps4Config) -> Self {
        Self { config }
    }

    /// The Razer Panthera fight sticks hang when rumbled.
    fn can_rumble(vendor_id: u16, product_id: u16) -> bool {
        !(vendor_id == USB_VENDOR_RAZER
            && (product_id == USB_PRODUCT_RAZER_PANTHERA
                || product_id == USB_PRODUCT_RAZER_PANTHERA_EVO))
    }

    fn classify(descriptor: &DeviceDescriptor, probe: impl FnOnce() -> ConnectionKind) -> ConnectionKind {
        if descriptor.vendor_id != USB_VENDOR_SONY {
            ConnectionKind::Usb
        } else if descriptor.product_id == USB_PRODUCT_SONY_DS4_DONGLE {
            ConnectionKind::Dongle
        } else {
            probe()
        }
    }

    fn capabilities(&self, descriptor: &DeviceDescriptor, connection: ConnectionKind) -> DriverCapabilities {
        let mut caps = DriverCapabilities::for_connection(connection);
        caps.supports_audio = descriptor.vendor_id == USB_VENDOR_SONY
            && matches!(
                descriptor.product_id,
                USB_PRODUCT_SONY_DS4_SLIM | USB_PRODUCT_SONY_DS4_DONGLE
            );
        // Writing effects over Bluetooth switches the pad to extended reports, so it is opt-in.
        caps.supports_effects = Self::can_rumble(descriptor.vendor_id, descriptor.product_id)
            && (!caps.is_bluetooth || self.config.rumble_over_bluetooth);
        caps.supports_led = true;
        caps
    }

    fn handle_state(ctx: &mut DeviceContext, state: NormalizedState, target: &mut dyn ControllerTarget) {
        let (advanced, repeated) = match ctx.last_state() {
            Some(prev) => (prev.sequence != state.sequence, *prev == state),
            None => (false, false),
        };
        if advanced {
            ctx.note_counter_advance();
        } else if repeated && ctx.counter_advances() {
            // Same counter on a pad that counts: the report was delivered twice.
            return;
        }
        let mut events = Vec::new();
        diff_states(ctx.last_state(), &state, &report::BUTTON_LAYOUT, &mut events);
        for event in events {
            target.emit(event);
        }
        ctx.replace_state(state);
    }
}

/// Encode the current effect state and write it.
fn update_effects(ctx: &mut DeviceContext) -> Result<()> {
    if !ctx.capabilities().supports_effects {
        return Err(DriverError::Unsupported("effects"));
    }
    let report = report::encode_effects(ctx.effects(), ctx.capabilities());
    ctx.send(report.as_bytes())
}

impl ControllerDriver for Ps4Driver {
    fn hint(&self) -> &'static str {
        "ps4"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn is_supported_device(&self, descriptor: &DeviceDescriptor) -> bool {
        descriptor.controller_type == ControllerType::Ps4
    }

    fn device_name(&self, vendor_id: u16, _product_id: u16) -> Option<&'static str> {
        (vendor_id == USB_VENDOR_SONY).then_some("PS4 Controller")
    }

    fn init_device(&self, _descriptor: &DeviceDescriptor) -> bool {
        true
    }

    fn set_player_index(&self, ctx: &mut DeviceContext, player_index: i32) -> Result<()> {
        ctx.check_live()?;
        ctx.effects_mut().player_index = player_index;
        if ctx.effects().color.is_some() {
            return Ok(());
        }
        update_effects(ctx)
    }

    fn open_joystick(
        &self,
        descriptor: &DeviceDescriptor,
        backend: &dyn HidBackend,
        target: &mut dyn ControllerTarget,
    ) -> Result<DeviceContext> {
        let mut transport = backend
            .open_path(&descriptor.path)
            .map_err(|source| DriverError::Open {
                path: descriptor.path.clone(),
                source,
            })?;

        let connection = Self::classify(descriptor, || {
            probe_connection(transport.as_mut(), report::FEATURE_REPORT_SERIAL_NUMBER)
        });
        let caps = self.capabilities(descriptor, connection);
        debug!(
            "PS4 {}: dongle = {}, bluetooth = {}, effects = {}, audio = {}",
            descriptor.path, caps.is_dongle, caps.is_bluetooth, caps.supports_effects, caps.supports_audio
        );

        let effects = EffectCommand {
            player_index: target.player_index(),
            ..EffectCommand::default()
        };
        let mut ctx = DeviceContext::new(descriptor.path.clone(), transport, caps, effects);

        match update_effects(&mut ctx) {
            Ok(()) => {}
            Err(DriverError::Unsupported(_)) => {}
            Err(e) => warn!("{}: couldn't set initial LED state: {e}", descriptor.path),
        }

        target.set_capabilities(JoystickCaps {
            buttons: Button::COUNT as u16,
            axes: Axis::COUNT as u16,
            power: PowerLevel::Wired,
            touchpads: 1,
            touchpad_fingers: 2,
        });

        Ok(ctx)
    }

    fn update_device(&self, ctx: &mut DeviceContext, target: &mut dyn ControllerTarget) -> bool {
        if ctx.check_live().is_err() {
            return false;
        }
        let mut buf = [0u8; MAX_REPORT_LEN];
        loop {
            match ctx.read(&mut buf) {
                Ok(0) => return true,
                Ok(n) => {
                    let data = &buf[..n];
                    #[cfg(feature = "debug-log")]
                    tracing::trace!("RX {} bytes: {:02x?}", n, data);
                    if let Some(state) = report::decode_input(data) {
                        Self::handle_state(ctx, state, target);
                    }
                }
                Err(e) => {
                    warn!("{}: read failed: {e}", ctx.path());
                    if ctx.mark_disconnected() {
                        target.emit(InputKind::Disconnected);
                    }
                    return false;
                }
            }
        }
    }

    fn rumble(&self, ctx: &mut DeviceContext, low_frequency: u16, high_frequency: u16) -> Result<()> {
        ctx.check_live()?;
        let effects = ctx.effects_mut();
        effects.rumble_left = (low_frequency >> 8) as u8;
        effects.rumble_right = (high_frequency >> 8) as u8;
        update_effects(ctx)
    }

    fn has_led(&self, ctx: &DeviceContext) -> bool {
        ctx.capabilities().supports_led
    }

    fn set_led(&self, ctx: &mut DeviceContext, red: u8, green: u8, blue: u8) -> Result<()> {
        ctx.check_live()?;
        ctx.effects_mut().color = Some(Rgb::new(red, green, blue));
        update_effects(ctx)
    }

    fn set_volume(&self, ctx: &mut DeviceContext, volume: u8) -> Result<()> {
        ctx.check_live()?;
        if !ctx.capabilities().supports_audio {
            return Err(DriverError::Unsupported("audio volume"));
        }
        ctx.effects_mut().volume = Some(volume);
        update_effects(ctx)
    }
}
