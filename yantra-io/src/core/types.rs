//! Value types exchanged across the actuator boundary.
//!
//! Key types for rover implementers:
//! - [`Color`]: Discrete labels produced by the classifiers in [`crate::color`]
//! - [`Hsv`] / [`Rgbc`]: Raw color sensor readings
//! - [`FollowParams`]: Parameters of a line-follow to the next intersection
//! - [`LaneTick`]: Result of one line-following step inside the staging lane

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color labels recognised by the classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Black,
    White,
    Brown,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Black => "black",
            Color::White => "white",
            Color::Brown => "brown",
        };
        f.write_str(name)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "yellow" => Ok(Color::Yellow),
            "black" => Ok(Color::Black),
            "white" => Ok(Color::White),
            "brown" => Ok(Color::Brown),
            other => Err(format!("unknown color '{}'", other)),
        }
    }
}

/// Hue/saturation/value reading
///
/// Scale depends on the sensor: line sensors report hue in 0-127,
/// bin and block sensors report hue in 0-360. Saturation and value are 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

/// Raw red/green/blue/clear channel counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgbc {
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub c: u32,
}

impl Rgbc {
    pub const fn new(r: u32, g: u32, b: u32, c: u32) -> Self {
        Self { r, g, b, c }
    }
}

/// Readings of the three lateral distance sensors in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LateralDistances {
    pub left_mm: u32,
    pub front_mm: u32,
    pub right_mm: u32,
}

impl LateralDistances {
    pub const fn new(left_mm: u32, front_mm: u32, right_mm: u32) -> Self {
        Self {
            left_mm,
            front_mm,
            right_mm,
        }
    }

    /// Per-direction maximum of two readings
    pub fn max(self, other: Self) -> Self {
        Self {
            left_mm: self.left_mm.max(other.left_mm),
            front_mm: self.front_mm.max(other.front_mm),
            right_mm: self.right_mm.max(other.right_mm),
        }
    }
}

/// Motor control mode for line following
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorMode {
    Power,
    #[default]
    Velocity,
}

/// Rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnMode {
    /// Fast rotation from wheel encoders
    #[default]
    Encoder,
    /// Slower rotation closed on the gyroscope
    Gyro,
}

/// Line-follow to the next intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowParams {
    /// Forward velocity (mm/s)
    pub velocity: f32,
    pub mode: MotorMode,
    /// Seconds during which intersection patterns are ignored after departure
    pub min_time: f32,
    /// Line sensor reflectance threshold for the intersection pattern
    pub threshold: u8,
    /// Abort with `false` when the terminal marker is confirmed
    pub carrying_block: bool,
}

impl FollowParams {
    pub fn new(velocity: f32) -> Self {
        Self {
            velocity,
            mode: MotorMode::Velocity,
            min_time: 0.0,
            threshold: 50,
            carrying_block: false,
        }
    }

    pub fn with_min_time(mut self, min_time: f32) -> Self {
        self.min_time = min_time;
        self
    }

    pub fn carrying(mut self, carrying_block: bool) -> Self {
        self.carrying_block = carrying_block;
        self
    }
}

/// One line-following step along the staging lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneTick {
    /// Distance covered by this step (mm)
    pub travelled_mm: f32,
    /// Center line sensor reading at the end of the step (0-127 hue scale)
    pub line: Hsv,
}

/// Sensor side relative to the rover's heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Deposit maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositStyle {
    /// Facing the bin, gate kept closed, block pushed straight in
    HeadOn,
    /// Alongside the bin, claw opened sideways
    Side,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lateral_max() {
        let a = LateralDistances::new(200, 1000, 500);
        let b = LateralDistances::new(250, 900, 480);
        assert_eq!(a.max(b), LateralDistances::new(250, 1000, 500));
    }

    #[test]
    fn test_color_from_lowercase_toml() {
        #[derive(Deserialize)]
        struct Wrap {
            bins: Vec<Color>,
        }
        let parsed: Wrap = toml::from_str(r#"bins = ["red", "black", "yellow"]"#).unwrap();
        assert_eq!(parsed.bins, vec![Color::Red, Color::Black, Color::Yellow]);
    }

    #[test]
    fn test_color_display_and_parse() {
        assert_eq!(Color::Brown.to_string(), "brown");
        assert_eq!("Blue".parse::<Color>(), Ok(Color::Blue));
        assert!("purple".parse::<Color>().is_err());
    }
}
