//! Routing of engine-initiated nested calls to the call primitives

use crate::context::CallFrame;
use crate::engine::CallKind;
use crate::error::{VmError, VmResult};
use crate::evm::Evm;
use fugue_config::Transition;
use fugue_primitives::{Address, H256, U256};

/// Nested call requested by an engine
#[derive(Debug, Clone)]
pub struct CallMessage {
    /// Call kind
    pub kind: CallKind,
    /// Callee (ignored for creations)
    pub destination: Address,
    /// Sender as seen by the engine
    pub sender: Address,
    /// Transferred value
    pub value: U256,
    /// Call data or init code
    pub input: Vec<u8>,
    /// Gas forwarded to the callee
    pub gas: u64,
    /// Depth of the requesting frame
    pub depth: usize,
    /// Whether the call must not modify state
    pub is_static: bool,
    /// CREATE2 salt
    pub salt: H256,
}

impl CallMessage {
    /// A plain call message
    pub fn call(destination: Address, input: Vec<u8>, gas: u64, value: U256) -> Self {
        Self {
            kind: CallKind::Call,
            destination,
            sender: Address::ZERO,
            value,
            input,
            gas,
            depth: 0,
            is_static: false,
            salt: H256::ZERO,
        }
    }

    /// A creation message carrying init code
    pub fn create(init_code: Vec<u8>, gas: u64, value: U256) -> Self {
        Self {
            kind: CallKind::Create,
            ..Self::call(Address::ZERO, init_code, gas, value)
        }
    }

    /// Change the kind
    pub fn with_kind(mut self, kind: CallKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the call static
    pub fn static_call(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the CREATE2 salt
    pub fn with_salt(mut self, salt: H256) -> Self {
        self.salt = salt;
        self
    }
}

/// Outcome category reported back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// Call succeeded
    Success,
    /// Callee reverted; output carries the revert data
    Revert,
    /// Any other failure; output is empty
    Failure,
}

/// Result of a nested call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Outcome category
    pub status: CallStatus,
    /// Return or revert data
    pub output: Vec<u8>,
    /// Gas left for the caller to reclaim
    pub gas_left: u64,
    /// Address of the created contract (creations only)
    pub create_address: Option<Address>,
}

impl CallOutcome {
    fn from_result(result: VmResult<Vec<u8>>, gas_left: u64, create_address: Option<Address>) -> Self {
        match result {
            Ok(output) => Self {
                status: CallStatus::Success,
                output,
                gas_left,
                create_address,
            },
            Err(VmError::Reverted(output)) => Self {
                status: CallStatus::Revert,
                output,
                gas_left,
                create_address,
            },
            Err(err) => {
                tracing::debug!("Nested call failed: {}", err);
                Self {
                    status: CallStatus::Failure,
                    output: Vec::new(),
                    gas_left,
                    create_address,
                }
            }
        }
    }
}

/// Perform `message` on behalf of the engine executing `frame`.
///
/// The calling account is always the frame's address; the message's
/// sender and depth are informational.
pub fn dispatch(evm: &mut Evm<'_>, frame: &CallFrame, message: CallMessage) -> CallOutcome {
    tracing::trace!(
        "Nested {:?} from {} to {} (depth {}, gas {})",
        message.kind,
        frame.address,
        message.destination,
        message.depth,
        message.gas
    );

    match message.kind {
        CallKind::Call if message.is_static => {
            let ret = evm.static_call(frame, message.destination, &message.input, message.gas);
            CallOutcome::from_result(ret.result, ret.gas_left, None)
        }
        CallKind::Call => {
            let ret = evm.call(frame, message.destination, &message.input, message.gas, message.value);
            CallOutcome::from_result(ret.result, ret.gas_left, None)
        }
        CallKind::DelegateCall => {
            let ret = evm.delegate_call(frame, message.destination, &message.input, message.gas);
            CallOutcome::from_result(ret.result, ret.gas_left, None)
        }
        CallKind::CallCode => {
            let ret = evm.call_code(frame, message.destination, &message.input, message.gas, message.value);
            CallOutcome::from_result(ret.result, ret.gas_left, None)
        }
        CallKind::Create | CallKind::Create2 => {
            let ret = if message.kind == CallKind::Create {
                evm.create(frame, &message.input, message.gas, message.value)
            } else {
                evm.create2(frame, &message.input, message.gas, message.value, message.salt)
            };

            let result = match ret.result {
                // Before Homestead a CREATE too expensive to store still
                // succeeds, just without code. CREATE2 postdates it.
                Err(VmError::CodeStoreOutOfGas)
                    if message.kind == CallKind::Create && !evm.is_enabled(Transition::Eip7) =>
                {
                    Ok(Vec::new())
                }
                // Deployed code is not handed back to the creator
                Ok(_) => Ok(Vec::new()),
                other => other,
            };
            CallOutcome::from_result(result, ret.gas_left, Some(ret.address))
        }
    }
}
