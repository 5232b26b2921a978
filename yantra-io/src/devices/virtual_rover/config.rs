//! Virtual rover world configuration
//!
//! Every parameter has a default, so an empty `[device.simulation]` table
//! produces a 5x6 arena with four mirrored blocks and a full five-bin lane.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! SimulationConfig
//! ├── rows, cols, random_seed     # Arena grid and RNG
//! ├── block_count, palette        # Random mirrored placement
//! ├── blocks                      # Explicit placement (overrides random)
//! ├── bins                        # Lane contents, "empty" for a vacant slot
//! ├── start                       # "lane" or "arena"
//! ├── LaneConfig                  # Lane geometry and sensor model
//! └── NoiseConfig                 # Phantom reads, pickup misses, dropouts
//! ```

use crate::core::types::Color;
use serde::{Deserialize, Deserializer};

/// Where the rover sits when the mission starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartLocation {
    /// Forward end of the staging lane, facing along it
    #[default]
    Lane,
    /// Node (0, 0), having arrived from the staging side
    Arena,
}

/// Explicitly placed block on the edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BlockPlacement {
    pub a: [i32; 2],
    pub b: [i32; 2],
    pub color: Color,
}

/// Lane geometry and sensor model (millimeters)
#[derive(Debug, Clone, Deserialize)]
pub struct LaneConfig {
    /// Center of the first slot from the forward-start end
    #[serde(default = "default_first_slot")]
    pub first_slot_mm: f32,

    /// Distance between neighboring slot centers
    #[serde(default = "default_slot_spacing")]
    pub slot_spacing_mm: f32,

    /// End-to-end lane length; both ends carry a red marker
    #[serde(default = "default_lane_length")]
    pub length_mm: f32,

    /// Half width of the zone where the distance sensor sees a bin
    #[serde(default = "default_detect_half_width")]
    pub detect_half_width_mm: f32,

    /// Side distance reported while a bin is in view
    #[serde(default = "default_bin_reading")]
    pub bin_reading_mm: u32,

    /// Side distance reported with no bin in view
    #[serde(default = "default_open_reading")]
    pub open_reading_mm: u32,

    /// Bin color sensor position behind the distance sensor
    #[serde(default = "default_color_offset")]
    pub color_sensor_offset_mm: f32,

    /// Half width of the zone where the color sensor sees a bin
    #[serde(default = "default_color_half_width")]
    pub color_half_width_mm: f32,

    /// Maximum offset from a slot center at which a deposit lands in that bin
    #[serde(default = "default_deposit_tolerance")]
    pub deposit_tolerance_mm: f32,

    /// Simulated duration of one lane tick
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_first_slot() -> f32 {
    150.0
}
fn default_slot_spacing() -> f32 {
    280.0
}
fn default_lane_length() -> f32 {
    1420.0
}
fn default_detect_half_width() -> f32 {
    30.0
}
fn default_bin_reading() -> u32 {
    60
}
fn default_open_reading() -> u32 {
    400
}
fn default_color_offset() -> f32 {
    70.0
}
fn default_color_half_width() -> f32 {
    45.0
}
fn default_deposit_tolerance() -> f32 {
    140.0
}
fn default_tick_ms() -> u64 {
    20
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            first_slot_mm: default_first_slot(),
            slot_spacing_mm: default_slot_spacing(),
            length_mm: default_lane_length(),
            detect_half_width_mm: default_detect_half_width(),
            bin_reading_mm: default_bin_reading(),
            open_reading_mm: default_open_reading(),
            color_sensor_offset_mm: default_color_offset(),
            color_half_width_mm: default_color_half_width(),
            deposit_tolerance_mm: default_deposit_tolerance(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Sensor and actuator fault injection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoiseConfig {
    /// Probability that a side distance read reports a bin that is not there
    #[serde(default)]
    pub phantom_rate: f32,

    /// Gaussian noise on side distance reads (mm)
    #[serde(default)]
    pub distance_stddev: f32,

    /// Probability that a pickup attempt grabs nothing
    #[serde(default)]
    pub pickup_miss_rate: f32,

    /// Probability that a bin color read returns an unclassifiable value
    #[serde(default)]
    pub bin_dropout_rate: f32,
}

/// Virtual world parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,

    #[serde(default = "default_cols")]
    pub cols: usize,

    /// 0 = random each run
    #[serde(default = "default_seed")]
    pub random_seed: u64,

    /// Number of randomly placed blocks (ignored when `blocks` is set)
    #[serde(default = "default_block_count")]
    pub block_count: usize,

    /// Colors drawn for random blocks
    #[serde(default = "default_palette")]
    pub palette: Vec<Color>,

    #[serde(default)]
    pub blocks: Vec<BlockPlacement>,

    /// Lane contents from the forward-start end; `None` is a vacant slot
    #[serde(default = "default_bins", deserialize_with = "deserialize_bins")]
    pub bins: Vec<Option<Color>>,

    #[serde(default)]
    pub start: StartLocation,

    #[serde(default)]
    pub lane: LaneConfig,

    #[serde(default)]
    pub noise: NoiseConfig,
}

fn default_rows() -> usize {
    5
}
fn default_cols() -> usize {
    6
}
fn default_seed() -> u64 {
    42
}
fn default_block_count() -> usize {
    4
}
fn default_palette() -> Vec<Color> {
    vec![
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Black,
        Color::White,
        Color::Brown,
    ]
}
fn default_bins() -> Vec<Option<Color>> {
    vec![
        Some(Color::Red),
        Some(Color::Green),
        Some(Color::Blue),
        Some(Color::Yellow),
        Some(Color::Black),
    ]
}

fn deserialize_bins<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<Color>>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    names
        .iter()
        .map(|name| match name.as_str() {
            "empty" | "none" => Ok(None),
            other => other.parse().map(Some).map_err(serde::de::Error::custom),
        })
        .collect()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            random_seed: default_seed(),
            block_count: default_block_count(),
            palette: default_palette(),
            blocks: Vec::new(),
            bins: default_bins(),
            start: StartLocation::default(),
            lane: LaneConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_with_empty_slot() {
        let config: SimulationConfig =
            toml::from_str(r#"bins = ["red", "green", "empty", "blue", "black"]"#).unwrap();
        assert_eq!(
            config.bins,
            vec![
                Some(Color::Red),
                Some(Color::Green),
                None,
                Some(Color::Blue),
                Some(Color::Black)
            ]
        );
    }

    #[test]
    fn test_unknown_bin_rejected() {
        let result: std::result::Result<SimulationConfig, _> =
            toml::from_str(r#"bins = ["red", "purple"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_blocks() {
        let config: SimulationConfig = toml::from_str(
            r#"
            start = "arena"
            [[blocks]]
            a = [0, 0]
            b = [1, 0]
            color = "blue"
            "#,
        )
        .unwrap();
        assert_eq!(config.start, StartLocation::Arena);
        assert_eq!(config.blocks[0].color, Color::Blue);
        assert_eq!(config.lane.slot_spacing_mm, 280.0);
    }
}
