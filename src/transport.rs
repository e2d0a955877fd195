//! Raw HID transport boundary.
//!
//! Drivers never touch OS handles directly. Everything goes through
//! [`HidTransport`] (one open device) and [`HidBackend`] (enumeration and
//! open-by-path). The hidapi implementation lives in
//! [`backends::hid`](crate::backends); tests use
//! [`backends::virtual_input`](crate::backends::virtual_input).
//!
//! All buffers are bounded by [`MAX_REPORT_LEN`].

use crate::metadata::DeviceDescriptor;
use thiserror::Error;

/// Largest input report any family reads in one call (one USB full-speed packet).
pub const MAX_REPORT_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("open failed: {0}")]
    Open(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("feature report failed: {0}")]
    FeatureReport(String),

    #[error("handle is closed")]
    Closed,
}

/// One open HID device.
///
/// Dropping the transport releases the OS handle.
pub trait HidTransport: Send {
    /// Read one input report into `buf`.
    ///
    /// `Ok(0)` means nothing was buffered within `timeout_ms` (0 = don't wait).
    /// `Err` means the device is gone.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError>;

    /// Fetch a feature report. `buf[0]` carries the report id on entry.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write an output report, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;
}

/// Enumerates devices and opens them by path.
pub trait HidBackend {
    /// Current device list. Implementations rescan the OS on every call, so
    /// devices attached since the last call are included.
    fn enumerate(&mut self) -> Vec<DeviceDescriptor>;

    /// Open `path` exclusively, in non-blocking mode.
    fn open_path(&self, path: &str) -> Result<Box<dyn HidTransport>, TransportError>;
}
