//! Scripted in-memory HID devices.
//!
//! A [`VirtualDevice`] is a shared handle: the test (or demo) keeps one clone
//! to feed input reports and inspect output writes, while the driver owns a
//! [`VirtualTransport`] obtained from it. [`VirtualBackend`] serves several of
//! them by path, like an OS enumeration would.
//!
//! Feature reports are answered verbatim from what was registered with
//! [`VirtualDevice::set_feature_report`]; unregistered ids are refused.

use crate::metadata::DeviceDescriptor;
use crate::transport::{HidBackend, HidTransport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct VirtualState {
    reads: VecDeque<Vec<u8>>,
    disconnected: bool,
    writes: Vec<Vec<u8>>,
    feature_reports: HashMap<u8, Vec<u8>>,
    feature_requests: Vec<u8>,
    write_limit: Option<usize>,
    fail_writes: bool,
    fail_open: bool,
    open_handles: usize,
}

/// Handle to one scripted device.
#[derive(Clone, Default)]
pub struct VirtualDevice {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a transport onto this device.
    pub fn transport(&self) -> VirtualTransport {
        self.lock().open_handles += 1;
        VirtualTransport {
            device: self.clone(),
        }
    }

    /// Queue one raw input report (leading report id included).
    pub fn feed(&self, report: impl Into<Vec<u8>>) {
        self.lock().reads.push_back(report.into());
    }

    /// After queued reports drain, every read fails.
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Register (or, with `None`, refuse) the answer to feature report `id`.
    pub fn set_feature_report(&self, id: u8, answer: Option<Vec<u8>>) {
        let mut state = self.lock();
        match answer {
            Some(data) => {
                state.feature_reports.insert(id, data);
            }
            None => {
                state.feature_reports.remove(&id);
            }
        }
    }

    /// Accept at most `limit` bytes per write.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.lock().write_limit = limit;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Every output report written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.lock().writes.last().cloned()
    }

    /// Feature report ids requested so far.
    pub fn feature_requests(&self) -> Vec<u8> {
        self.lock().feature_requests.clone()
    }

    /// Number of transports currently open on this device.
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }
}

/// Transport half of a [`VirtualDevice`].
pub struct VirtualTransport {
    device: VirtualDevice,
}

impl HidTransport for VirtualTransport {
    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: i32) -> Result<usize, TransportError> {
        let mut state = self.device.lock();
        match state.reads.pop_front() {
            Some(report) => {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                Ok(n)
            }
            None if state.disconnected => Err(TransportError::Read("device disconnected".into())),
            None => Ok(0),
        }
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.device.lock();
        let id = buf.first().copied().unwrap_or(0);
        state.feature_requests.push(id);
        let answer = state
            .feature_reports
            .get(&id)
            .ok_or_else(|| TransportError::FeatureReport(format!("report 0x{id:02x} refused")))?;
        buf.fill(0);
        let n = answer.len().min(buf.len());
        buf[..n].copy_from_slice(&answer[..n]);
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.device.lock();
        if state.fail_writes {
            return Err(TransportError::Write("device rejected report".into()));
        }
        let n = state.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        state.writes.push(data.to_vec());
        Ok(n)
    }
}

impl Drop for VirtualTransport {
    fn drop(&mut self) {
        let mut state = self.device.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

/// Serves [`VirtualDevice`]s by path.
#[derive(Default)]
pub struct VirtualBackend {
    devices: Vec<(DeviceDescriptor, VirtualDevice)>,
}

impl VirtualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug in a device; returns its scripting handle.
    pub fn plug(&mut self, descriptor: DeviceDescriptor) -> VirtualDevice {
        let device = VirtualDevice::new();
        self.devices.push((descriptor, device.clone()));
        device
    }

    /// Remove the device at `path` from enumeration.
    pub fn unplug(&mut self, path: &str) {
        self.devices.retain(|(desc, _)| desc.path != path);
    }
}

impl HidBackend for VirtualBackend {
    fn enumerate(&mut self) -> Vec<DeviceDescriptor> {
        self.devices.iter().map(|(desc, _)| desc.clone()).collect()
    }

    fn open_path(&self, path: &str) -> Result<Box<dyn HidTransport>, TransportError> {
        let (_, device) = self
            .devices
            .iter()
            .find(|(desc, _)| desc.path == path)
            .ok_or_else(|| TransportError::Open(format!("no device at {path}")))?;
        if device.lock().fail_open {
            return Err(TransportError::Open(format!("{path} is busy")));
        }
        Ok(Box::new(device.transport()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_drain_then_disconnect() {
        let dev = VirtualDevice::new();
        dev.feed(vec![1, 2, 3]);
        dev.disconnect();
        let mut t = dev.transport();
        let mut buf = [0u8; 8];
        assert_eq!(t.read_timeout(&mut buf, 0), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert!(t.read_timeout(&mut buf, 0).is_err());
    }

    #[test]
    fn empty_queue_reads_zero() {
        let dev = VirtualDevice::new();
        let mut t = dev.transport();
        let mut buf = [0u8; 8];
        assert_eq!(t.read_timeout(&mut buf, 0), Ok(0));
    }

    #[test]
    fn write_limit_shortens_writes() {
        let dev = VirtualDevice::new();
        dev.set_write_limit(Some(4));
        let mut t = dev.transport();
        assert_eq!(t.write(&[0u8; 10]), Ok(4));
        assert_eq!(dev.writes().len(), 1);
    }

    #[test]
    fn handles_are_counted() {
        let dev = VirtualDevice::new();
        let t = dev.transport();
        assert_eq!(dev.open_handles(), 1);
        drop(t);
        assert_eq!(dev.open_handles(), 0);
    }

    #[test]
    fn backend_opens_by_path() {
        let mut backend = VirtualBackend::new();
        let dev = backend.plug(DeviceDescriptor::new(0x054c, 0x05c4, "virt-0"));
        assert_eq!(backend.enumerate().len(), 1);
        assert!(backend.open_path("virt-1").is_err());
        let t = backend.open_path("virt-0");
        assert!(t.is_ok());
        assert_eq!(dev.open_handles(), 1);
        dev.set_fail_open(true);
        assert!(backend.open_path("virt-0").is_err());
    }
}
