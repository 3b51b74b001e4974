//! # fugue-vm
//!
//! Bridge between the Fugue ledger and external execution engines.
//!
//! This crate provides:
//! - The `Engine` interface and the `Host` callbacks engines use
//! - `HostContext`, the ledger side of those callbacks (storage refunds,
//!   self-destruct, block hashes, logs, nested calls)
//! - Call primitives with snapshots, depth limit and value transfer
//! - Engine loading from shared libraries or builtin constructors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bridge;
mod context;
mod dispatch;
mod engine;
mod error;
mod evm;
mod host;
mod loader;
mod registry;

pub use bridge::EngineBridge;
pub use context::{BlockContext, BlockHashes, CallFrame, Environment, TransactionContext};
pub use dispatch::{dispatch, CallMessage, CallOutcome, CallStatus};
pub use engine::{
    CallKind, Capability, Engine, ExecutionMessage, ExecutionResult, SetOptionError, StatusCode,
    StorageStatus, TxContext, UnknownCallKind,
};
pub use error::{LoadError, LoadResult, VmError, VmResult};
pub use evm::{CallReturn, CreateReturn, Evm};
pub use host::{Host, HostContext};
pub use loader::{
    config_key, load_engine, BuiltinLoader, EngineConfig, EngineConstructor, EngineLoader,
    ENGINE_CONSTRUCTOR,
};
#[cfg(feature = "dynamic")]
pub use loader::DynamicLoader;
pub use registry::{EngineRegistry, VmConfig};

pub use fugue_config::Revision;
