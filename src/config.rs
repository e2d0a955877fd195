//! Driver configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [ps4]
//! enabled = true
//! rumble_over_bluetooth = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the PS4-class driver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ps4Config {
    /// Whether the driver takes part in registry matching.
    pub enabled: bool,
    /// Allow rumble/LED writes over Bluetooth. Doing so switches the pad to
    /// extended input reports, which other software on the host may not expect.
    pub rumble_over_bluetooth: bool,
}

impl Default for Ps4Config {
    fn default() -> Self {
        Self {
            enabled: true,
            rumble_over_bluetooth: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub ps4: Ps4Config,
}

impl DriverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
