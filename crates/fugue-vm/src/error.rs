//! VM error types

use crate::engine::{Capability, StatusCode};
use fugue_state::StateError;
use thiserror::Error;

/// Errors surfaced by the call primitives and the engine bridge
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Call depth exceeded
    #[error("max call depth exceeded")]
    DepthExceeded,

    /// Insufficient balance for transfer
    #[error("insufficient balance for transfer")]
    InsufficientBalance,

    /// Contract creation collision
    #[error("contract address collision")]
    ContractAddressCollision,

    /// Not enough gas left to deposit the created code
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,

    /// Max code size exceeded (EIP-170)
    #[error("max code size exceeded (limit: 24576 bytes)")]
    MaxCodeSizeExceeded,

    /// No loaded engine accepts the code
    #[error("no compatible interpreter")]
    NoCompatibleInterpreter,

    /// Revert with data
    #[error("execution reverted")]
    Reverted(Vec<u8>),

    /// Engine reported a failure status
    #[error("execution failed: {0}")]
    Execution(StatusCode),

    /// Engine reported an internal error; the ledger keeps running
    #[error("engine internal error: {0}")]
    EngineInternal(String),

    /// State accessor error
    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl VmError {
    /// Whether the error keeps the remaining gas (only reverts do)
    pub fn preserves_gas(&self) -> bool {
        matches!(self, VmError::Reverted(_))
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;

/// Engine loading errors. All of them are fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No library path configured
    #[error("{capability} engine path not provided, set vm.{key} to /path/to/engine")]
    MissingPath {
        /// Capability the engine was requested for
        capability: Capability,
        /// Configuration key to set
        key: &'static str,
    },

    /// Library could not be opened or has no engine constructor
    #[error("failed to load engine from {path}: {reason}")]
    Library {
        /// Library path or builtin name
        path: String,
        /// Loader message
        reason: String,
    },

    /// Engine does not support the requested capability
    #[error("engine {path} does not support {capability}")]
    MissingCapability {
        /// Library path or builtin name
        path: String,
        /// Capability the engine was requested for
        capability: Capability,
    },
}

/// Result type for engine loading
pub type LoadResult<T> = Result<T, LoadError>;
