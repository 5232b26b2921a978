//! Error types for MargaNav

use thiserror::Error;
use yantra_io::Color;

/// MargaNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Actuator error: {0}")]
    Actuator(#[from] yantra_io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bin scan failed after {attempts} attempts")]
    BinScanFailed { attempts: usize },

    #[error("Invalid bin registry: {0}")]
    InvalidRegistry(String),

    #[error("No {color} bin reached after {attempts} reroutes")]
    BinUnreachable { color: Color, attempts: usize },

    #[error("Lane end marker not found after {0:.0} mm")]
    LaneEndMissing(f32),

    #[error("Nothing left to collect after {resets} knowledge resets")]
    ArenaExhausted { resets: usize },

    #[error("Exploration cycle gave up after {steps} phases")]
    ExplorationStalled { steps: usize },

    #[error("Pose lost: {0}")]
    PoseLost(String),

    #[error("No route to the staging lane from {0}")]
    NoRoute(String),

    #[error("Mission interrupted")]
    Interrupted,
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
