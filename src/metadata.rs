//! Device metadata.
//!
//! [`DeviceDescriptor`] is the immutable description of a candidate device
//! produced at enumeration time. Drivers match on it; nothing mutates it
//! after it is built.
//!
//! # Conventions
//! - `path` is an OS/topology path (opaque string). It is the identity the
//!   manager uses for duplicate suppression; it may change across reconnects.
//! - Interface class/subclass/protocol are `0` when the platform does not
//!   report them (hidapi does not).
//! - `controller_type` is inferred from vendor/product ids via
//!   [`ControllerType::from_ids`] unless the caller knows better.
//!
//! # Example
//! ```
//! use padlink::metadata::{ControllerType, DeviceDescriptor};
//!
//! let desc = DeviceDescriptor::new(0x054c, 0x09cc, "/dev/hidraw4");
//! assert_eq!(desc.controller_type, ControllerType::Ps4);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub const USB_VENDOR_SONY: u16 = 0x054c;
pub const USB_PRODUCT_SONY_DS4: u16 = 0x05c4;
pub const USB_PRODUCT_SONY_DS4_SLIM: u16 = 0x09cc;
pub const USB_PRODUCT_SONY_DS4_DONGLE: u16 = 0x0ba0;

pub const USB_VENDOR_RAZER: u16 = 0x1532;
pub const USB_PRODUCT_RAZER_PANTHERA: u16 = 0x0401;
pub const USB_PRODUCT_RAZER_PANTHERA_EVO: u16 = 0x1008;

/// Known PS4-class devices: (vendor, product).
const PS4_DEVICES: &[(u16, u16)] = &[
    (USB_VENDOR_SONY, USB_PRODUCT_SONY_DS4),
    (USB_VENDOR_SONY, USB_PRODUCT_SONY_DS4_SLIM),
    (USB_VENDOR_SONY, USB_PRODUCT_SONY_DS4_DONGLE),
    (USB_VENDOR_RAZER, USB_PRODUCT_RAZER_PANTHERA),
    (USB_VENDOR_RAZER, USB_PRODUCT_RAZER_PANTHERA_EVO),
    (0x0f0d, 0x0055), // HORIPAD 4 FPS
    (0x146b, 0x0d01), // Nacon Revolution Pro
    (0x0738, 0x8250), // Mad Catz FightPad Pro PS4
];

/// Generic controller type inferred by the manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerType {
    #[default]
    Unknown,
    Ps4,
}

impl ControllerType {
    /// Infer the generic type from a vendor/product pair.
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Self {
        if PS4_DEVICES.contains(&(vendor_id, product_id)) {
            ControllerType::Ps4
        } else {
            ControllerType::Unknown
        }
    }
}

/// Stable manager-assigned device identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// Candidate device as seen at enumeration time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Firmware / release number (bcdDevice).
    pub version: u16,
    /// HID interface index; `-1` when not applicable.
    pub interface_number: i32,
    pub interface_class: i32,
    pub interface_subclass: i32,
    pub interface_protocol: i32,
    /// Human-readable product name reported by the device.
    pub name: Option<String>,
    pub controller_type: ControllerType,
    /// OS path used to open the device.
    pub path: String,
}

impl DeviceDescriptor {
    /// Minimal descriptor with an inferred controller type.
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            interface_number: -1,
            controller_type: ControllerType::from_ids(vendor_id, product_id),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} {} ({})",
            self.vendor_id,
            self.product_id,
            self.name.as_deref().unwrap_or("Unknown"),
            self.path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_ps4_class_devices() {
        assert_eq!(ControllerType::from_ids(0x054c, 0x05c4), ControllerType::Ps4);
        assert_eq!(ControllerType::from_ids(0x054c, 0x0ba0), ControllerType::Ps4);
        assert_eq!(ControllerType::from_ids(0x1532, 0x1008), ControllerType::Ps4);
        assert_eq!(ControllerType::from_ids(0x054c, 0x0ce6), ControllerType::Unknown);
        assert_eq!(ControllerType::from_ids(0x045e, 0x028e), ControllerType::Unknown);
    }

    #[test]
    fn descriptor_display() {
        let desc = DeviceDescriptor::new(0x054c, 0x05c4, "usb-1").with_name("Wireless Controller");
        assert_eq!(desc.to_string(), "054c:05c4 Wireless Controller (usb-1)");
        assert_eq!(desc.interface_number, -1);
    }

    #[test]
    fn descriptor_serializes() {
        let desc = DeviceDescriptor::new(0x054c, 0x05c4, "usb-1");
        let json = serde_json::to_string(&desc).unwrap();
        let back: DeviceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
