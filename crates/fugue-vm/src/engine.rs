//! Engine interface
//!
//! Types exchanged with an external execution engine. An engine receives an
//! [`ExecutionMessage`] plus code, calls back into the ledger through
//! [`Host`], and reports an [`ExecutionResult`].

use crate::host::Host;
use fugue_config::Revision;
use fugue_primitives::{Address, H256, U256};
use std::fmt;
use thiserror::Error;

/// Code format an engine can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Classic EVM bytecode
    Evm1,
    /// WebAssembly modules (`\0asm` prefix)
    Ewasm,
}

impl Capability {
    /// Magic prefix of WebAssembly modules
    pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

    /// Capability required to execute `code`
    pub fn required_for(code: &[u8]) -> Self {
        if code.starts_with(&Self::WASM_MAGIC) {
            Capability::Ewasm
        } else {
            Capability::Evm1
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Evm1 => f.write_str("EVM1"),
            Capability::Ewasm => f.write_str("EWASM"),
        }
    }
}

/// Kind of a nested call requested by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CallKind {
    /// Message call (static when the message says so)
    Call = 0,
    /// Run callee code in the caller's context with the parent's caller and value
    DelegateCall = 1,
    /// Run callee code in the caller's context
    CallCode = 2,
    /// Contract creation with a nonce-derived address
    Create = 3,
    /// Contract creation with a salt-derived address
    Create2 = 4,
}

impl CallKind {
    /// Whether the call creates a contract
    pub fn is_create(&self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// Numeric call kind outside the known set
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown call kind: {0}")]
pub struct UnknownCallKind(pub i32);

impl TryFrom<i32> for CallKind {
    type Error = UnknownCallKind;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CallKind::Call),
            1 => Ok(CallKind::DelegateCall),
            2 => Ok(CallKind::CallCode),
            3 => Ok(CallKind::Create),
            4 => Ok(CallKind::Create2),
            other => Err(UnknownCallKind(other)),
        }
    }
}

/// Effect of a storage write, used by engines to price SSTORE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    /// Value equals the current one; nothing written
    Unchanged,
    /// Zero to nonzero
    Added,
    /// Nonzero to a different nonzero
    Modified,
    /// Nonzero to zero
    Deleted,
    /// Slot already changed earlier in the transaction (net metering)
    ModifiedAgain,
}

/// Status reported by an engine execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Execution finished successfully
    Success,
    /// Generic failure
    Failure,
    /// Execution reverted; remaining gas and output are kept
    Revert,
    /// Out of gas
    OutOfGas,
    /// Designated invalid instruction
    InvalidInstruction,
    /// Undefined instruction
    UndefinedInstruction,
    /// Stack overflow
    StackOverflow,
    /// Stack underflow
    StackUnderflow,
    /// Invalid jump destination
    BadJumpDestination,
    /// Invalid memory access
    InvalidMemoryAccess,
    /// Call depth exceeded inside the engine
    CallDepthExceeded,
    /// State modification in a static context
    StaticModeViolation,
    /// Precompiled contract failed
    PrecompileFailure,
    /// Contract code failed validation (ewasm)
    ContractValidationFailure,
    /// Argument out of range
    ArgumentOutOfRange,
    /// Engine bug or unexpected condition
    InternalError,
    /// Engine refused to execute the message
    Rejected,
    /// Engine could not allocate memory
    OutOfMemory,
}

impl StatusCode {
    /// Whether the status signals a problem with the engine itself rather
    /// than with the executed code
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            StatusCode::InternalError | StatusCode::Rejected | StatusCode::OutOfMemory
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusCode::Success => "success",
            StatusCode::Failure => "failure",
            StatusCode::Revert => "revert",
            StatusCode::OutOfGas => "out of gas",
            StatusCode::InvalidInstruction => "invalid instruction",
            StatusCode::UndefinedInstruction => "undefined instruction",
            StatusCode::StackOverflow => "stack overflow",
            StatusCode::StackUnderflow => "stack underflow",
            StatusCode::BadJumpDestination => "bad jump destination",
            StatusCode::InvalidMemoryAccess => "invalid memory access",
            StatusCode::CallDepthExceeded => "call depth exceeded",
            StatusCode::StaticModeViolation => "static mode violation",
            StatusCode::PrecompileFailure => "precompile failure",
            StatusCode::ContractValidationFailure => "contract validation failure",
            StatusCode::ArgumentOutOfRange => "argument out of range",
            StatusCode::InternalError => "internal error",
            StatusCode::Rejected => "rejected",
            StatusCode::OutOfMemory => "out of memory",
        };
        f.write_str(text)
    }
}

/// Message describing one engine invocation
#[derive(Debug, Clone)]
pub struct ExecutionMessage<'a> {
    /// Kind of the frame being executed
    pub kind: CallKind,
    /// Whether state modifications are forbidden
    pub is_static: bool,
    /// Nesting depth, zero for the outermost frame
    pub depth: usize,
    /// Gas available to the frame
    pub gas: u64,
    /// Account whose code runs
    pub destination: Address,
    /// Immediate caller
    pub sender: Address,
    /// Call data
    pub input: &'a [u8],
    /// Transferred value
    pub value: U256,
    /// CREATE2 salt (zero otherwise)
    pub create2_salt: H256,
}

/// Outcome of an engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Execution status
    pub status: StatusCode,
    /// Gas left after execution
    pub gas_left: u64,
    /// Return data (or revert data)
    pub output: Vec<u8>,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(gas_left: u64, output: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Success,
            gas_left,
            output,
        }
    }

    /// Create a revert result
    pub fn revert(gas_left: u64, output: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Revert,
            gas_left,
            output,
        }
    }

    /// Create a failed result; failures consume all gas
    pub fn failure(status: StatusCode) -> Self {
        Self {
            status,
            gas_left: 0,
            output: Vec::new(),
        }
    }
}

/// Block and transaction values visible to executing code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxContext {
    /// Transaction gas price
    pub gas_price: U256,
    /// Transaction origin
    pub origin: Address,
    /// Block beneficiary
    pub coinbase: Address,
    /// Block number
    pub number: u64,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block difficulty
    pub difficulty: U256,
}

/// Rejected engine option
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetOptionError {
    /// Engine does not know the option
    #[error("unknown option: {0}")]
    InvalidName(String),
    /// Engine rejected the value
    #[error("invalid value {value:?} for option {name}")]
    InvalidValue {
        /// Option name
        name: String,
        /// Rejected value
        value: String,
    },
}

/// An execution engine.
///
/// `execute` takes `&self` and may be re-entered through nested host calls,
/// so engines keep per-execution state on the stack.
pub trait Engine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    /// Engine version
    fn version(&self) -> &str;

    /// Whether the engine can execute the given code format
    fn has_capability(&self, capability: Capability) -> bool;

    /// Configure the engine before first use
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), SetOptionError>;

    /// Execute `code` under `revision`
    fn execute(
        &self,
        host: &mut dyn Host,
        revision: Revision,
        message: &ExecutionMessage<'_>,
        code: &[u8],
    ) -> ExecutionResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_capability() {
        assert_eq!(Capability::required_for(&[]), Capability::Evm1);
        assert_eq!(Capability::required_for(&[0x60, 0x00]), Capability::Evm1);
        assert_eq!(Capability::required_for(b"\0asm\x01\0\0\0"), Capability::Ewasm);
        // truncated magic is not wasm
        assert_eq!(Capability::required_for(b"\0as"), Capability::Evm1);
    }

    #[test]
    fn test_call_kind_from_raw() {
        assert_eq!(CallKind::try_from(0), Ok(CallKind::Call));
        assert_eq!(CallKind::try_from(4), Ok(CallKind::Create2));
        assert_eq!(CallKind::try_from(5), Err(UnknownCallKind(5)));
        assert_eq!(CallKind::try_from(-1), Err(UnknownCallKind(-1)));
        assert_eq!(CallKind::CallCode as i32, 2);
    }

    #[test]
    fn test_internal_error_statuses() {
        assert!(StatusCode::InternalError.is_internal_error());
        assert!(StatusCode::Rejected.is_internal_error());
        assert!(StatusCode::OutOfMemory.is_internal_error());
        assert!(!StatusCode::OutOfGas.is_internal_error());
        assert!(!StatusCode::Revert.is_internal_error());
    }

    #[test]
    fn test_execution_result_constructors() {
        let ok = ExecutionResult::success(10, vec![1]);
        assert_eq!(ok.status, StatusCode::Success);
        assert_eq!(ok.gas_left, 10);

        let reverted = ExecutionResult::revert(7, vec![2, 3]);
        assert_eq!(reverted.status, StatusCode::Revert);
        assert_eq!(reverted.output, vec![2, 3]);

        let failed = ExecutionResult::failure(StatusCode::StackUnderflow);
        assert_eq!(failed.gas_left, 0);
        assert!(failed.output.is_empty());
    }
}
