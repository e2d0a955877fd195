//! Error types.
//!
//! Errors are per device: nothing here is ever raised for a device other than
//! the one the failing call was made on.
//!
//! Two outcomes are *not* errors:
//! - a descriptor no driver claims is `None` from [`DriverRegistry::find`](crate::registry::DriverRegistry::find);
//! - an input report with an unknown id, or with its presence bit clear, is skipped silently.

use crate::transport::TransportError;
use thiserror::Error;

/// Failures surfaced by driver entry points.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The transport could not be opened. No context was created.
    #[error("couldn't open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: TransportError,
    },

    /// The operation is not available on this family/transport combination.
    #[error("{0} is not supported on this device")]
    Unsupported(&'static str),

    /// The transport accepted fewer bytes than the report length.
    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The transport rejected the output report.
    #[error("couldn't send output report: {0}")]
    Write(#[source] TransportError),

    /// The device went away during a read. Terminal for the context.
    #[error("device disconnected")]
    Disconnected,

    /// The context was already closed.
    #[error("device is closed")]
    Closed,

    /// No device with this id is known to the manager.
    #[error("unknown device {0}")]
    UnknownDevice(crate::metadata::DeviceId),
}

/// Failures loading a [`DriverConfig`](crate::config::DriverConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T, E = DriverError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_readable() {
        let err = DriverError::ShortWrite {
            written: 12,
            expected: 32,
        };
        assert_eq!(err.to_string(), "short write: sent 12 of 32 bytes");
        assert_eq!(
            DriverError::Unsupported("rumble").to_string(),
            "rumble is not supported on this device"
        );
    }

    #[test]
    fn open_error_keeps_source() {
        use std::error::Error as _;
        let err = DriverError::Open {
            path: "/dev/hidraw3".into(),
            source: TransportError::Open("permission denied".into()),
        };
        assert!(err.to_string().starts_with("couldn't open /dev/hidraw3"));
        assert!(err.source().is_some());
    }
}
