//! Padlink: HID game-controller drivers for Rust.
//!
//! Turns raw HID reports from PS4-class controllers into button, axis, touch
//! and battery events, and sends rumble, lightbar and volume commands back.
//!
//! ```no_run
//! # #[cfg(feature = "hid")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use padlink::backends::hid::HidapiBackend;
//! use padlink::{DeviceManager, DriverConfig};
//!
//! let mut manager = DeviceManager::new(HidapiBackend::new()?, &DriverConfig::default());
//! manager.discover();
//! manager.open_all();
//! loop {
//!     for event in manager.poll() {
//!         println!("{} {:?}", event.device, event.kind);
//!     }
//! }
//! # }
//! # #[cfg(not(feature = "hid"))]
//! # fn main() {}
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod config;
pub mod context;
pub mod diff;
pub mod drivers;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod joystick;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod probe;
pub mod registry;
pub mod snapshot;
pub mod transport;

pub use config::{DriverConfig, Ps4Config};
pub use context::{DeviceContext, DriverCapabilities};
pub use drivers::{ControllerDriver, Driver, Ps4Driver};
pub use error::{ConfigError, DriverError};
pub use event::*;
pub use eventbus::*;
pub use joystick::{ControllerTarget, Joystick};
pub use logger::LogListener;
pub use manager::DeviceManager;
pub use metadata::{ControllerType, DeviceDescriptor, DeviceId};
pub use registry::DriverRegistry;
pub use transport::{HidBackend, HidTransport, TransportError};
