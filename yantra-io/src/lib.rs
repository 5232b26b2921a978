//! YantraIO - Actuator boundary for grid-arena sorting rovers
//!
//! This library provides everything the mission layer needs to drive a rover
//! without knowing which rover it is talking to.
//!
//! ## Modules
//!
//! - [`core`]: The [`Actuator`] and [`StagingLane`] contracts and their value types
//! - [`color`]: Threshold classifiers for line, bin and block readings
//! - [`devices`]: Device factory and the virtual rover used for offline missions
//! - [`supervised`]: Worker-thread wrapper that bounds every actuator call

pub mod color;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod supervised;

// Re-export commonly used types
pub use crate::core::actuator::{Actuator, DistanceProbe, EmergencyStop, Rover, StagingLane};
pub use crate::core::types::{
    Color, DepositStyle, FollowParams, Hsv, LaneTick, LateralDistances, MotorMode, Rgbc, Side,
    TurnMode,
};
pub use config::DeviceConfig;
pub use devices::create_rover;
pub use error::{Error, Result};
pub use supervised::SupervisedRover;
