//! Controller family drivers.
//!
//! Every family implements [`ControllerDriver`]. The set of families is closed:
//! [`Driver`] has one variant per family and is picked once, when the
//! [`DriverRegistry`](crate::registry::DriverRegistry) matches a descriptor.
//! Calls on a `Driver` are a plain `match`, never a vtable.
//!
//! Lifecycle of one device:
//! 1. `is_supported_device` / `init_device`: no I/O.
//! 2. `open_joystick`: opens the transport, probes it, returns the [`DeviceContext`].
//! 3. `update_device`: called every polling pass.
//! 4. `rumble` / `set_led` / `set_player_index`: output writes on demand.
//! 5. `close_joystick`: releases the transport; idempotent.

pub mod ps4;

use crate::context::DeviceContext;
use crate::error::{DriverError, Result};
use crate::joystick::ControllerTarget;
use crate::metadata::DeviceDescriptor;
use crate::transport::HidBackend;

pub use ps4::Ps4Driver;

/// The capability set every controller family provides.
pub trait ControllerDriver {
    /// Config section / hint name, e.g. `"ps4"`.
    fn hint(&self) -> &'static str;

    /// Disabled drivers never match.
    fn enabled(&self) -> bool;

    /// Pure predicate on enumeration metadata.
    fn is_supported_device(&self, descriptor: &DeviceDescriptor) -> bool;

    fn device_name(&self, vendor_id: u16, product_id: u16) -> Option<&'static str>;

    /// Whether the device should be exposed as present. Does not open it.
    fn init_device(&self, descriptor: &DeviceDescriptor) -> bool;

    /// Player slot the device itself reports, or `-1`.
    fn device_player_index(&self) -> i32 {
        -1
    }

    fn set_player_index(&self, ctx: &mut DeviceContext, player_index: i32) -> Result<()>;

    /// Open, probe and configure. Either the full context is returned or nothing is.
    fn open_joystick(
        &self,
        descriptor: &DeviceDescriptor,
        backend: &dyn HidBackend,
        target: &mut dyn ControllerTarget,
    ) -> Result<DeviceContext>;

    /// Drain buffered input. `false` once the device is gone.
    fn update_device(&self, ctx: &mut DeviceContext, target: &mut dyn ControllerTarget) -> bool;

    /// Intensities are 16-bit; families keep as many high bits as they can use.
    fn rumble(&self, ctx: &mut DeviceContext, low_frequency: u16, high_frequency: u16) -> Result<()>;

    fn rumble_triggers(&self, _ctx: &mut DeviceContext, _left: u16, _right: u16) -> Result<()> {
        Err(DriverError::Unsupported("trigger rumble"))
    }

    fn has_led(&self, ctx: &DeviceContext) -> bool;

    fn set_led(&self, ctx: &mut DeviceContext, red: u8, green: u8, blue: u8) -> Result<()>;

    fn set_volume(&self, _ctx: &mut DeviceContext, _volume: u8) -> Result<()> {
        Err(DriverError::Unsupported("audio volume"))
    }

    fn close_joystick(&self, ctx: &mut DeviceContext) {
        ctx.close();
    }

    /// Release per-device resources held outside the context.
    fn free_device(&self, _descriptor: &DeviceDescriptor) {}
}

/// One variant per supported controller family.
#[derive(Clone, Debug)]
pub enum Driver {
    Ps4(Ps4Driver),
}

macro_rules! dispatch {
    ($self:ident, $d:ident => $body:expr) => {
        match $self {
            Driver::Ps4($d) => $body,
        }
    };
}

impl ControllerDriver for Driver {
    fn hint(&self) -> &'static str {
        dispatch!(self, d => d.hint())
    }

    fn enabled(&self) -> bool {
        dispatch!(self, d => d.enabled())
    }

    fn is_supported_device(&self, descriptor: &DeviceDescriptor) -> bool {
        dispatch!(self, d => d.is_supported_device(descriptor))
    }

    fn device_name(&self, vendor_id: u16, product_id: u16) -> Option<&'static str> {
        dispatch!(self, d => d.device_name(vendor_id, product_id))
    }

    fn init_device(&self, descriptor: &DeviceDescriptor) -> bool {
        dispatch!(self, d => d.init_device(descriptor))
    }

    fn device_player_index(&self) -> i32 {
        dispatch!(self, d => d.device_player_index())
    }

    fn set_player_index(&self, ctx: &mut DeviceContext, player_index: i32) -> Result<()> {
        dispatch!(self, d => d.set_player_index(ctx, player_index))
    }

    fn open_joystick(
        &self,
        descriptor: &DeviceDescriptor,
        backend: &dyn HidBackend,
        target: &mut dyn ControllerTarget,
    ) -> Result<DeviceContext> {
        dispatch!(self, d => d.open_joystick(descriptor, backend, target))
    }

    fn update_device(&self, ctx: &mut DeviceContext, target: &mut dyn ControllerTarget) -> bool {
        dispatch!(self, d => d.update_device(ctx, target))
    }

    fn rumble(&self, ctx: &mut DeviceContext, low_frequency: u16, high_frequency: u16) -> Result<()> {
        dispatch!(self, d => d.rumble(ctx, low_frequency, high_frequency))
    }

    fn rumble_triggers(&self, ctx: &mut DeviceContext, left: u16, right: u16) -> Result<()> {
        dispatch!(self, d => d.rumble_triggers(ctx, left, right))
    }

    fn has_led(&self, ctx: &DeviceContext) -> bool {
        dispatch!(self, d => d.has_led(ctx))
    }

    fn set_led(&self, ctx: &mut DeviceContext, red: u8, green: u8, blue: u8) -> Result<()> {
        dispatch!(self, d => d.set_led(ctx, red, green, blue))
    }

    fn set_volume(&self, ctx: &mut DeviceContext, volume: u8) -> Result<()> {
        dispatch!(self, d => d.set_volume(ctx, volume))
    }

    fn close_joystick(&self, ctx: &mut DeviceContext) {
        dispatch!(self, d => d.close_joystick(ctx))
    }

    fn free_device(&self, descriptor: &DeviceDescriptor) {
        dispatch!(self, d => d.free_device(descriptor))
    }
}
