//! State error types

use thiserror::Error;

/// State accessor errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Snapshot id was never taken or has already been reverted
    #[error("invalid snapshot id: {0}")]
    InvalidSnapshot(usize),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
