//! Driver selection.
//!
//! [`DriverRegistry`] holds every family driver in a fixed priority order and
//! hands out at most one driver per device path. A device that is already
//! claimed cannot be claimed again until it is released.

use crate::config::DriverConfig;
use crate::drivers::{ControllerDriver, Driver, Ps4Driver};
use crate::metadata::DeviceDescriptor;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug)]
pub struct DriverRegistry {
    drivers: Vec<Driver>,
    claimed: HashSet<String>,
}

impl DriverRegistry {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            drivers: vec![Driver::Ps4(Ps4Driver::new(config.ps4.clone()))],
            claimed: HashSet::new(),
        }
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    /// First enabled driver that supports `descriptor`.
    pub fn find(&self, descriptor: &DeviceDescriptor) -> Option<&Driver> {
        self.drivers
            .iter()
            .find(|d| d.enabled() && d.is_supported_device(descriptor))
    }

    /// Friendly name from the first driver that knows the ids.
    pub fn device_name(&self, vendor_id: u16, product_id: u16) -> Option<&'static str> {
        self.drivers
            .iter()
            .find_map(|d| d.device_name(vendor_id, product_id))
    }

    /// Select a driver for `descriptor` and mark its path as owned.
    ///
    /// `None` if no driver matches or the path is already owned.
    pub fn claim(&mut self, descriptor: &DeviceDescriptor) -> Option<Driver> {
        if self.claimed.contains(&descriptor.path) {
            return None;
        }
        let driver = self.find(descriptor)?.clone();
        debug!("{} claimed by {}", descriptor, driver.hint());
        self.claimed.insert(descriptor.path.clone());
        Some(driver)
    }

    pub fn is_claimed(&self, path: &str) -> bool {
        self.claimed.contains(path)
    }

    pub fn release(&mut self, path: &str) {
        self.claimed.remove(path);
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new(&DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ps4Config;

    #[test]
    fn finds_ps4_driver() {
        let registry = DriverRegistry::default();
        let desc = DeviceDescriptor::new(0x054c, 0x05c4, "a");
        assert_eq!(registry.find(&desc).map(|d| d.hint()), Some("ps4"));
        assert!(registry
            .find(&DeviceDescriptor::new(0x045e, 0x028e, "b"))
            .is_none());
        assert_eq!(registry.device_name(0x054c, 0x05c4), Some("PS4 Controller"));
    }

    #[test]
    fn disabled_driver_never_matches() {
        let config = DriverConfig {
            ps4: Ps4Config {
                enabled: false,
                ..Ps4Config::default()
            },
        };
        let registry = DriverRegistry::new(&config);
        assert!(registry
            .find(&DeviceDescriptor::new(0x054c, 0x05c4, "a"))
            .is_none());
    }

    #[test]
    fn a_path_is_claimed_once() {
        let mut registry = DriverRegistry::default();
        let desc = DeviceDescriptor::new(0x054c, 0x05c4, "a");
        assert!(registry.claim(&desc).is_some());
        assert!(registry.is_claimed("a"));
        assert!(registry.claim(&desc).is_none());
        registry.release("a");
        assert!(registry.claim(&desc).is_some());
    }

    #[test]
    fn unsupported_device_is_not_claimed() {
        let mut registry = DriverRegistry::default();
        let desc = DeviceDescriptor::new(0x045e, 0x028e, "x");
        assert!(registry.claim(&desc).is_none());
        assert!(!registry.is_claimed("x"));
    }
}
