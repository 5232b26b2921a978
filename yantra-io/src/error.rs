//! Error types for YantraIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// YantraIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An actuator call did not complete within the supervision window
    #[error("Actuator call timed out: {op}")]
    Timeout {
        /// Name of the primitive that stalled
        op: &'static str,
    },

    /// Motion refused after an emergency stop
    #[error("Rover halted by emergency stop")]
    Halted,

    /// Worker thread is gone or was poisoned by an earlier timeout
    #[error("Rover worker disconnected")]
    Disconnected,

    /// Rover is not oriented for the requested primitive
    #[error("Rover not aligned: {0}")]
    NotAligned(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown device type in configuration
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
