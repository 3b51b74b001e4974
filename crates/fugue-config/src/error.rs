//! Configuration error types

use thiserror::Error;

/// Chain configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown named preset
    #[error("unknown chain preset: {0}")]
    UnknownPreset(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
