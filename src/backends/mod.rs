//! Transport backends.
//!
//! Implementations of [`HidBackend`](crate::transport::HidBackend) /
//! [`HidTransport`](crate::transport::HidTransport).
//!
//! # Feature flags
//! - **`hid`**: enables the `hidapi` backend (default).
//!
//! [`virtual_input`] is always available; tests and demos script devices with it.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod virtual_input;
