//! Configuration loading for MargaNav

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use yantra_io::DeviceConfig;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub exploration: ExplorationConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub supervision: SupervisionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub mission: MissionConfig,
}

/// Arena grid dimensions
#[derive(Clone, Debug, Deserialize)]
pub struct ArenaConfig {
    /// Number of rows (default: 5)
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Number of columns (default: 6)
    #[serde(default = "default_cols")]
    pub cols: usize,
}

/// Velocities in mm/s
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_slow_velocity")]
    pub slow: f32,

    #[serde(default = "default_velocity")]
    pub normal: f32,

    #[serde(default = "default_max_velocity")]
    pub max: f32,

    /// Line sensor threshold for the intersection pattern
    #[serde(default = "default_follow_threshold")]
    pub follow_threshold: u8,
}

/// Arena exploration parameters
#[derive(Clone, Debug, Deserialize)]
pub struct ExplorationConfig {
    /// Distance driven into an intersection before scanning (mm)
    #[serde(default = "default_advance_mm")]
    pub advance_mm: f32,

    /// First pickup approach distance (mm)
    #[serde(default = "default_pickup_start_mm")]
    pub pickup_start_mm: f32,

    /// Approach distance added per retry (mm)
    #[serde(default = "default_pickup_step_mm")]
    pub pickup_step_mm: f32,

    /// Pickup attempts before the block is written off as invalid
    #[serde(default = "default_max_pickup_attempts")]
    pub max_pickup_attempts: usize,

    /// Advance before rescanning after a failed pickup (mm)
    #[serde(default = "default_recheck_advance_mm")]
    pub recheck_advance_mm: f32,

    /// Advance before turning toward a neighboring block (mm)
    #[serde(default = "default_block_turn_advance_mm")]
    pub block_turn_advance_mm: f32,

    /// Upper bound of a NEAR reading (mm)
    #[serde(default = "default_near_mm")]
    pub near_mm: u32,

    /// Upper bound of a MEDIUM reading (mm)
    #[serde(default = "default_medium_mm")]
    pub medium_mm: u32,

    /// Lateral reads per scan; each direction keeps the maximum
    #[serde(default = "default_reads_per_scan")]
    pub reads_per_scan: usize,

    /// Seconds after departure during which intersections are ignored
    #[serde(default = "default_min_follow_time")]
    pub min_follow_time: f32,

    /// Knowledge resets in a row without a grab before the arena counts as cleared
    #[serde(default = "default_max_resets")]
    pub max_resets: usize,

    /// Phases one exploration cycle may run before it is abandoned
    #[serde(default = "default_max_cycle_steps")]
    pub max_cycle_steps: usize,
}

/// Staging lane parameters
#[derive(Clone, Debug, Deserialize)]
pub struct StagingConfig {
    /// Side distance below which a bin is in view (mm)
    #[serde(default = "default_slot_threshold_mm")]
    pub slot_threshold_mm: u32,

    /// Minimum clear time between two bins (seconds)
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: f32,

    /// Re-reads confirming a detection
    #[serde(default = "default_confirm_reads")]
    pub confirm_reads: usize,

    /// Full discovery scans before giving up
    #[serde(default = "default_max_scan_attempts")]
    pub max_scan_attempts: usize,

    /// Lane-end reroutes tolerated while searching for a bin
    #[serde(default = "default_max_route_retries")]
    pub max_route_retries: usize,

    /// Deposit straight into the bin facing the entrance row when possible
    #[serde(default = "default_deposit_head_on")]
    pub deposit_head_on: bool,

    /// Search window per slot during discovery (mm)
    #[serde(default = "default_search_window_mm")]
    pub search_window_mm: f32,

    /// Longest single search run when no window applies (mm)
    #[serde(default = "default_max_search_mm")]
    pub max_search_mm: f32,

    /// Window for passing the target bin when arriving in reverse (mm)
    #[serde(default = "default_reverse_window_mm")]
    pub reverse_window_mm: f32,

    /// Extra run past the target bin before turning around (mm)
    #[serde(default = "default_reverse_overrun_mm")]
    pub reverse_overrun_mm: f32,

    /// Creep from detection to the color sensor (mm)
    #[serde(default = "default_discovery_creep_mm")]
    pub discovery_creep_mm: f32,

    /// Extra creep before the single color re-read (mm)
    #[serde(default = "default_retry_creep_mm")]
    pub retry_creep_mm: f32,

    /// Back-off after passing a bin, indexed by prior deposits (mm)
    #[serde(default = "default_approach_backoff_mm")]
    pub approach_backoff_mm: Vec<f32>,

    /// Centre of the first slot from the forward-start marker (mm)
    #[serde(default = "default_first_slot_mm")]
    pub first_slot_mm: f32,

    /// Distance between neighboring slot centres (mm)
    #[serde(default = "default_slot_spacing_mm")]
    pub slot_spacing_mm: f32,

    /// Creep on the first visit of a bin reached from behind (mm)
    #[serde(default = "default_first_visit_creep_mm")]
    pub first_visit_creep_mm: f32,

    /// Heading trims for head-on deposits, one per slot (degrees)
    #[serde(default = "default_head_on_trim_deg")]
    pub head_on_trim_deg: Vec<f32>,

    /// Poll the side distance sensor from a background thread while searching
    #[serde(default)]
    pub background_polling: bool,

    /// Sleep between background sensor reads (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Known lane layout; skips discovery when set ("empty" for vacant slots)
    #[serde(default)]
    pub preset_bins: Option<Vec<String>>,
}

/// Actuator call supervision
#[derive(Clone, Debug, Deserialize)]
pub struct SupervisionConfig {
    /// Run the rover on a worker thread with bounded calls
    #[serde(default = "default_supervision_enabled")]
    pub enabled: bool,

    /// Longest a single actuator call may take (milliseconds)
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

/// Output configuration
#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    /// Path of the final map snapshot
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Depth of the status display queue
    #[serde(default = "default_status_queue")]
    pub status_queue: usize,
}

/// Mission limits
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MissionConfig {
    /// Stop after this many deposits (0 = run until interrupted)
    #[serde(default)]
    pub max_deliveries: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            slow: default_slow_velocity(),
            normal: default_velocity(),
            max: default_max_velocity(),
            follow_threshold: default_follow_threshold(),
        }
    }
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            advance_mm: default_advance_mm(),
            pickup_start_mm: default_pickup_start_mm(),
            pickup_step_mm: default_pickup_step_mm(),
            max_pickup_attempts: default_max_pickup_attempts(),
            recheck_advance_mm: default_recheck_advance_mm(),
            block_turn_advance_mm: default_block_turn_advance_mm(),
            near_mm: default_near_mm(),
            medium_mm: default_medium_mm(),
            reads_per_scan: default_reads_per_scan(),
            min_follow_time: default_min_follow_time(),
            max_resets: default_max_resets(),
            max_cycle_steps: default_max_cycle_steps(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            slot_threshold_mm: default_slot_threshold_mm(),
            debounce_secs: default_debounce_secs(),
            confirm_reads: default_confirm_reads(),
            max_scan_attempts: default_max_scan_attempts(),
            max_route_retries: default_max_route_retries(),
            deposit_head_on: default_deposit_head_on(),
            search_window_mm: default_search_window_mm(),
            max_search_mm: default_max_search_mm(),
            reverse_window_mm: default_reverse_window_mm(),
            reverse_overrun_mm: default_reverse_overrun_mm(),
            discovery_creep_mm: default_discovery_creep_mm(),
            retry_creep_mm: default_retry_creep_mm(),
            approach_backoff_mm: default_approach_backoff_mm(),
            first_slot_mm: default_first_slot_mm(),
            slot_spacing_mm: default_slot_spacing_mm(),
            first_visit_creep_mm: default_first_visit_creep_mm(),
            head_on_trim_deg: default_head_on_trim_deg(),
            background_polling: false,
            poll_interval_ms: default_poll_interval_ms(),
            preset_bins: None,
        }
    }
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            enabled: default_supervision_enabled(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            status_queue: default_status_queue(),
        }
    }
}

// Default value functions
fn default_rows() -> usize {
    5
}
fn default_cols() -> usize {
    6
}
fn default_slow_velocity() -> f32 {
    100.0
}
fn default_velocity() -> f32 {
    200.0
}
fn default_max_velocity() -> f32 {
    300.0
}
fn default_follow_threshold() -> u8 {
    50
}

// Exploration defaults
fn default_advance_mm() -> f32 {
    40.0
}
fn default_pickup_start_mm() -> f32 {
    45.0
}
fn default_pickup_step_mm() -> f32 {
    5.0
}
fn default_max_pickup_attempts() -> usize {
    6
}
fn default_recheck_advance_mm() -> f32 {
    20.0
}
fn default_block_turn_advance_mm() -> f32 {
    25.0
}
fn default_near_mm() -> u32 {
    250
}
fn default_medium_mm() -> u32 {
    700
}
fn default_reads_per_scan() -> usize {
    3
}
fn default_min_follow_time() -> f32 {
    0.2
}
fn default_max_resets() -> usize {
    3
}
fn default_max_cycle_steps() -> usize {
    5_000
}

// Staging defaults
fn default_slot_threshold_mm() -> u32 {
    100
}
fn default_debounce_secs() -> f32 {
    0.1
}
fn default_confirm_reads() -> usize {
    3
}
fn default_max_scan_attempts() -> usize {
    5
}
fn default_max_route_retries() -> usize {
    3
}
fn default_deposit_head_on() -> bool {
    true
}
fn default_search_window_mm() -> f32 {
    270.0
}
fn default_max_search_mm() -> f32 {
    1500.0
}
fn default_reverse_window_mm() -> f32 {
    300.0
}
fn default_reverse_overrun_mm() -> f32 {
    90.0
}
fn default_poll_interval_ms() -> u64 {
    5
}
fn default_discovery_creep_mm() -> f32 {
    70.0
}
fn default_retry_creep_mm() -> f32 {
    10.0
}
fn default_approach_backoff_mm() -> Vec<f32> {
    vec![130.0, 90.0, 80.0]
}
fn default_first_slot_mm() -> f32 {
    150.0
}
fn default_slot_spacing_mm() -> f32 {
    280.0
}
fn default_first_visit_creep_mm() -> f32 {
    10.0
}
fn default_head_on_trim_deg() -> Vec<f32> {
    vec![12.0, 0.0, 0.0, 0.0, -12.0]
}

fn default_supervision_enabled() -> bool {
    true
}
fn default_call_timeout_ms() -> u64 {
    30_000
}
fn default_snapshot_path() -> String {
    "output/map.json".to_string()
}
fn default_status_queue() -> usize {
    32
}

impl MargaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: MargaConfig = toml::from_str(&contents)?;
        config.sync_device();
        Ok(config)
    }

    /// Keep the virtual world's grid in step with the arena section
    pub fn sync_device(&mut self) {
        self.device.simulation.rows = self.arena.rows;
        self.device.simulation.cols = self.arena.cols;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: MargaConfig = toml::from_str("").unwrap();
        assert_eq!(config.arena.rows, 5);
        assert_eq!(config.exploration.pickup_start_mm, 45.0);
        assert_eq!(config.staging.approach_backoff_mm, vec![130.0, 90.0, 80.0]);
        assert_eq!(config.staging.max_scan_attempts, 5);
        assert_eq!(config.device.device_type, "virtual");
        assert!(config.supervision.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[arena]
rows = 4

[staging]
deposit_head_on = false
preset_bins = ["red", "empty", "blue", "green"]

[mission]
max_deliveries = 2

[device.simulation]
random_seed = 9
"#
        )
        .unwrap();

        let config = MargaConfig::load(file.path()).unwrap();
        assert_eq!(config.arena.rows, 4);
        assert_eq!(config.device.simulation.rows, 4);
        assert_eq!(config.device.simulation.random_seed, 9);
        assert!(!config.staging.deposit_head_on);
        assert_eq!(config.mission.max_deliveries, 2);
        assert_eq!(config.staging.preset_bins.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[arena\nrows = 4").unwrap();
        assert!(matches!(
            MargaConfig::load(file.path()),
            Err(crate::error::NavError::Config(_))
        ));
    }
}
