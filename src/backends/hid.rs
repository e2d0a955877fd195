//! hidapi-backed transport.
//!
//! [`HidapiBackend`] enumerates through `hidapi` and opens devices by path in
//! non-blocking mode; [`HidapiTransport`] wraps the resulting `HidDevice`.
//! Dropping the transport closes the OS handle.

use crate::metadata::{ControllerType, DeviceDescriptor};
use crate::transport::{HidBackend, HidTransport, TransportError};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use std::ffi::CString;
use tracing::warn;

pub struct HidapiTransport {
    raw: HidDevice,
}

impl HidTransport for HidapiTransport {
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError> {
        self.raw
            .read_timeout(buf, timeout_ms)
            .map_err(|e| TransportError::Read(e.to_string()))
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.raw
            .get_feature_report(buf)
            .map_err(|e| TransportError::FeatureReport(e.to_string()))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.raw
            .write(data)
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

pub struct HidapiBackend {
    api: HidApi,
}

impl HidapiBackend {
    pub fn new() -> Result<Self, TransportError> {
        let api = HidApi::new().map_err(|e| TransportError::Open(e.to_string()))?;
        Ok(Self { api })
    }
}

/// Build a [`DeviceDescriptor`] for a `hidapi` device entry.
///
/// Interface class/subclass/protocol are not exposed by hidapi and stay `0`.
fn descriptor(info: &DeviceInfo) -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: info.vendor_id(),
        product_id: info.product_id(),
        version: info.release_number(),
        interface_number: info.interface_number(),
        interface_class: 0,
        interface_subclass: 0,
        interface_protocol: 0,
        name: info.product_string().map(|s| s.to_string()),
        controller_type: ControllerType::from_ids(info.vendor_id(), info.product_id()),
        path: info.path().to_string_lossy().to_string(),
    }
}

impl HidBackend for HidapiBackend {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        // The list hidapi keeps is a snapshot from the last scan.
        if let Err(e) = self.api.refresh_devices() {
            warn!("failed to refresh HID device list: {e}");
        }
        self.api.device_list().map(descriptor).collect()
    }

    fn open_path(&self, path: &str) -> Result<Box<dyn HidTransport>, TransportError> {
        let c_path = CString::new(path).map_err(|e| TransportError::Open(e.to_string()))?;
        let raw = self
            .api
            .open_path(&c_path)
            .map_err(|e| TransportError::Open(e.to_string()))?;
        // Drivers drain with zero-timeout reads; if this fails, reads still honor the timeout.
        if let Err(e) = raw.set_blocking_mode(false) {
            warn!("couldn't make {path} non-blocking: {e}");
        }
        Ok(Box::new(HidapiTransport { raw }))
    }
}
