//! Device configuration
//!
//! Selects the rover implementation and carries its parameters.
//!
//! ```toml
//! [device]
//! type = "virtual"
//! name = "bench rover"
//!
//! [device.simulation]
//! random_seed = 42
//! block_count = 4
//! bins = ["red", "green", "empty", "blue", "black"]
//! ```

use crate::devices::virtual_rover::config::SimulationConfig;
use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Device selection and parameters
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Implementation name, matched by [`crate::create_rover`]
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Human readable label used in logs
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Virtual rover world (ignored by hardware rovers)
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_device_type() -> String {
    "virtual".to_string()
}
fn default_device_name() -> String {
    "virtual rover".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Load a standalone device section from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_virtual() {
        let config: DeviceConfig = toml::from_str("").unwrap();
        assert_eq!(config.device_type, "virtual");
        assert_eq!(config.simulation.rows, 5);
    }

    #[test]
    fn test_type_rename() {
        let config: DeviceConfig = toml::from_str("type = \"crl200s\"").unwrap();
        assert_eq!(config.device_type, "crl200s");
    }
}
