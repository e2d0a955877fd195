//! Device discovery and the polling loop.
//!
//! [`DeviceManager`] owns a [`HidBackend`], matches enumerated devices to
//! drivers through the [`DriverRegistry`] and keeps one [`Joystick`] per
//! claimed device. A device failing to open or dropping out never affects the
//! others.

use crate::config::DriverConfig;
use crate::context::DeviceContext;
use crate::drivers::{ControllerDriver, Driver};
use crate::error::{DriverError, Result};
use crate::event::InputEvent;
use crate::eventbus::InputEventBus;
use crate::joystick::{ControllerTarget, Joystick};
use crate::metadata::{DeviceDescriptor, DeviceId};
use crate::registry::DriverRegistry;
use crate::transport::HidBackend;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

struct ManagedDevice {
    descriptor: DeviceDescriptor,
    driver: Driver,
    joystick: Joystick,
    context: Option<DeviceContext>,
}

pub struct DeviceManager<B: HidBackend> {
    backend: B,
    registry: DriverRegistry,
    devices: BTreeMap<DeviceId, ManagedDevice>,
    next_id: u64,
    bus: InputEventBus,
}

impl<B: HidBackend> DeviceManager<B> {
    pub fn new(backend: B, config: &DriverConfig) -> Self {
        Self {
            backend,
            registry: DriverRegistry::new(config),
            devices: BTreeMap::new(),
            next_id: 0,
            bus: InputEventBus::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn event_bus_mut(&mut self) -> &mut InputEventBus {
        &mut self.bus
    }

    /// Enumerate the backend and add every supported, unclaimed device.
    ///
    /// Devices that disconnected since the last pass are removed first, so a
    /// pad that comes back on the same path is added again under a new id.
    /// Returns the ids added by this pass. Devices are added but not opened.
    pub fn discover(&mut self) -> Vec<DeviceId> {
        self.prune_disconnected();
        let found = self.backend.enumerate();
        debug!("enumerated {} HID device(s)", found.len());
        found
            .into_iter()
            .filter_map(|descriptor| self.add_device(descriptor))
            .collect()
    }

    fn prune_disconnected(&mut self) {
        let gone: Vec<DeviceId> = self
            .devices
            .iter()
            .filter(|(_, dev)| dev.context.as_ref().is_some_and(|ctx| ctx.is_disconnected()))
            .map(|(id, _)| *id)
            .collect();
        for id in gone {
            let _ = self.remove(id);
        }
    }

    /// Claim one device. `None` if no driver wants it or it is already managed.
    pub fn add_device(&mut self, descriptor: DeviceDescriptor) -> Option<DeviceId> {
        let driver = self.registry.claim(&descriptor)?;
        if !driver.init_device(&descriptor) {
            self.registry.release(&descriptor.path);
            return None;
        }
        let id = DeviceId(self.next_id);
        self.next_id += 1;

        let name = match (
            driver.device_name(descriptor.vendor_id, descriptor.product_id),
            &descriptor.name,
        ) {
            (Some(name), _) => name.to_string(),
            (None, Some(name)) => name.clone(),
            (None, None) => format!("{:04x}:{:04x}", descriptor.vendor_id, descriptor.product_id),
        };
        let mut joystick = Joystick::new(id, name);
        joystick.set_player_index(driver.device_player_index());
        info!("added {id}: {descriptor}");

        self.devices.insert(
            id,
            ManagedDevice {
                descriptor,
                driver,
                joystick,
                context: None,
            },
        );
        Some(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &DeviceDescriptor)> {
        self.devices.iter().map(|(id, dev)| (*id, &dev.descriptor))
    }

    pub fn joystick(&self, id: DeviceId) -> Option<&Joystick> {
        self.devices.get(&id).map(|dev| &dev.joystick)
    }

    pub fn is_open(&self, id: DeviceId) -> bool {
        self.devices
            .get(&id)
            .and_then(|dev| dev.context.as_ref())
            .is_some_and(|ctx| ctx.is_open())
    }

    /// Open the device. Reopening a device that is already open is a no-op.
    pub fn open(&mut self, id: DeviceId) -> Result<()> {
        let backend = &self.backend;
        let dev = self
            .devices
            .get_mut(&id)
            .ok_or(DriverError::UnknownDevice(id))?;
        if dev.context.as_ref().is_some_and(|ctx| ctx.is_open()) {
            return Ok(());
        }
        let player_index = dev.joystick.player_index();
        dev.joystick = Joystick::new(id, dev.joystick.name().to_string());
        dev.joystick.set_player_index(player_index);

        let ctx = dev
            .driver
            .open_joystick(&dev.descriptor, backend, &mut dev.joystick)?;
        dev.context = Some(ctx);
        Ok(())
    }

    /// Open every managed device that is not open. Failures are logged and skipped.
    pub fn open_all(&mut self) -> usize {
        let ids: Vec<DeviceId> = self.devices.keys().copied().collect();
        let mut opened = 0;
        for id in ids {
            match self.open(id) {
                Ok(()) => opened += 1,
                Err(e) => warn!("{id}: open failed: {e}"),
            }
        }
        opened
    }

    /// One polling pass over every open device.
    ///
    /// Events go to the event bus and are returned. A device that stops
    /// responding is closed; the others keep polling. It stays listed, and
    /// keeps its path claimed, until the next [`discover`](Self::discover) or
    /// an explicit [`remove`](Self::remove).
    pub fn poll(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for (id, dev) in self.devices.iter_mut() {
            if let Some(ctx) = dev.context.as_mut() {
                if ctx.is_open() && !dev.driver.update_device(ctx, &mut dev.joystick) {
                    warn!("{id} stopped responding, closing");
                    dev.driver.close_joystick(ctx);
                }
            }
            events.extend(dev.joystick.drain_events());
        }
        self.bus.emit_all(&events);
        events
    }

    fn context_mut(&mut self, id: DeviceId) -> Result<(&Driver, &mut DeviceContext)> {
        let dev = self
            .devices
            .get_mut(&id)
            .ok_or(DriverError::UnknownDevice(id))?;
        let ctx = dev.context.as_mut().ok_or(DriverError::Closed)?;
        Ok((&dev.driver, ctx))
    }

    /// Whether the device has a controllable light. `false` while closed.
    pub fn has_led(&self, id: DeviceId) -> bool {
        self.devices
            .get(&id)
            .and_then(|dev| dev.context.as_ref().map(|ctx| dev.driver.has_led(ctx)))
            .unwrap_or(false)
    }

    pub fn rumble(&mut self, id: DeviceId, low_frequency: u16, high_frequency: u16) -> Result<()> {
        let (driver, ctx) = self.context_mut(id)?;
        driver.rumble(ctx, low_frequency, high_frequency)
    }

    pub fn set_led(&mut self, id: DeviceId, red: u8, green: u8, blue: u8) -> Result<()> {
        let (driver, ctx) = self.context_mut(id)?;
        driver.set_led(ctx, red, green, blue)
    }

    pub fn set_volume(&mut self, id: DeviceId, volume: u8) -> Result<()> {
        let (driver, ctx) = self.context_mut(id)?;
        driver.set_volume(ctx, volume)
    }

    /// Assign a player slot. Stored even while the device is closed and applied
    /// on the next open.
    pub fn set_player_index(&mut self, id: DeviceId, player_index: i32) -> Result<()> {
        let dev = self
            .devices
            .get_mut(&id)
            .ok_or(DriverError::UnknownDevice(id))?;
        dev.joystick.set_player_index(player_index);
        match dev.context.as_mut() {
            Some(ctx) if ctx.is_open() => dev.driver.set_player_index(ctx, player_index),
            _ => Ok(()),
        }
    }

    /// Release the transport. Closing twice is harmless.
    pub fn close(&mut self, id: DeviceId) -> Result<()> {
        let dev = self
            .devices
            .get_mut(&id)
            .ok_or(DriverError::UnknownDevice(id))?;
        if let Some(ctx) = dev.context.as_mut() {
            dev.driver.close_joystick(ctx);
        }
        Ok(())
    }

    /// Close and forget the device, releasing its claim.
    pub fn remove(&mut self, id: DeviceId) -> Result<DeviceDescriptor> {
        let mut dev = self
            .devices
            .remove(&id)
            .ok_or(DriverError::UnknownDevice(id))?;
        if let Some(ctx) = dev.context.as_mut() {
            dev.driver.close_joystick(ctx);
        }
        dev.driver.free_device(&dev.descriptor);
        self.registry.release(&dev.descriptor.path);
        info!("removed {id}");
        Ok(dev.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualBackend;

    fn manager() -> DeviceManager<VirtualBackend> {
        DeviceManager::new(VirtualBackend::new(), &DriverConfig::default())
    }

    #[test]
    fn discover_skips_unsupported_and_claimed() {
        let mut mgr = manager();
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "pad"));
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x045e, 0x028e, "other"));
        assert_eq!(mgr.discover().len(), 1);
        assert!(mgr.discover().is_empty());
        assert_eq!(mgr.devices().count(), 1);
    }

    #[test]
    fn names_fall_back_to_ids() {
        let mut mgr = manager();
        let id = mgr
            .add_device(DeviceDescriptor::new(0x0f0d, 0x0055, "hori"))
            .unwrap();
        assert_eq!(mgr.joystick(id).unwrap().name(), "0f0d:0055");
        let id = mgr
            .add_device(DeviceDescriptor::new(0x054c, 0x05c4, "sony"))
            .unwrap();
        assert_eq!(mgr.joystick(id).unwrap().name(), "PS4 Controller");
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut mgr = manager();
        assert!(matches!(
            mgr.open(DeviceId(9)),
            Err(DriverError::UnknownDevice(DeviceId(9)))
        ));
        assert!(mgr.remove(DeviceId(9)).is_err());
    }

    #[test]
    fn discover_sees_devices_plugged_later() {
        let mut mgr = manager();
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "first"));
        assert_eq!(mgr.discover().len(), 1);
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x09cc, "second"));
        let added = mgr.discover();
        assert_eq!(added.len(), 1);
        assert_eq!(mgr.devices().count(), 2);
    }

    #[test]
    fn disconnected_device_is_rediscovered() {
        let mut mgr = manager();
        let dev = mgr
            .backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "pad"));
        let old = mgr.discover()[0];
        mgr.open(old).unwrap();
        dev.disconnect();
        mgr.poll();
        assert!(!mgr.is_open(old));
        assert!(mgr.registry().is_claimed("pad"));

        mgr.backend_mut().unplug("pad");
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "pad"));
        let added = mgr.discover();
        assert_eq!(added.len(), 1);
        assert_ne!(added[0], old);
        assert!(mgr.joystick(old).is_none());
        mgr.open(added[0]).unwrap();
        assert!(mgr.is_open(added[0]));
    }

    #[test]
    fn remove_releases_claim() {
        let mut mgr = manager();
        mgr.backend_mut()
            .plug(DeviceDescriptor::new(0x054c, 0x0ba0, "pad"));
        let ids = mgr.discover();
        mgr.remove(ids[0]).unwrap();
        assert!(!mgr.registry().is_claimed("pad"));
        assert_eq!(mgr.discover().len(), 1);
    }
}
