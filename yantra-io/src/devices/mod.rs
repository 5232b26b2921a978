//! Device implementations

pub mod virtual_rover;

use crate::config::DeviceConfig;
use crate::core::actuator::{EmergencyStop, Rover};
use crate::error::{Error, Result};
use std::sync::Arc;
use virtual_rover::VirtualRover;

/// Create a rover and its emergency stop handle based on configuration
pub fn create_rover(config: &DeviceConfig) -> Result<(Box<dyn Rover>, Arc<dyn EmergencyStop>)> {
    match config.device_type.as_str() {
        "virtual" => {
            let rover = VirtualRover::new(config.simulation.clone())?;
            let stop = rover.emergency_stop();
            Ok((Box::new(rover), stop))
        }
        _ => Err(Error::UnknownDevice(config.device_type.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device() {
        let config = DeviceConfig {
            device_type: "crl200s".to_string(),
            ..DeviceConfig::default()
        };
        assert!(matches!(create_rover(&config), Err(Error::UnknownDevice(_))));
    }

    #[test]
    fn test_virtual_device() {
        let (mut rover, _stop) = create_rover(&DeviceConfig::default()).unwrap();
        assert!(rover.clock().is_ok());
    }
}
