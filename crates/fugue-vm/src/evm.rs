//! Call stack driver: call primitives and engine selection

use crate::bridge::EngineBridge;
use crate::context::{BlockContext, BlockHashes, CallFrame, Environment, TransactionContext};
use crate::error::{VmError, VmResult};
use crate::registry::EngineRegistry;
use fugue_config::params::{CALL_CREATE_DEPTH, CREATE_DATA_GAS, MAX_CODE_SIZE};
use fugue_config::{resolve_revision, ChainConfig, Revision, Transition};
use fugue_crypto::{create2_address, create_address, EMPTY_CODE_HASH};
use fugue_primitives::{Address, BlockNumber, H256, U256};
use fugue_state::StateDb;
use std::ops::{Deref, DerefMut};

/// Result of a message call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReturn {
    /// Return data, or the error that ended the call
    pub result: VmResult<Vec<u8>>,
    /// Gas left for the caller
    pub gas_left: u64,
}

impl CallReturn {
    fn rejected(err: VmError, gas: u64) -> Self {
        Self {
            result: Err(err),
            gas_left: gas,
        }
    }
}

/// Result of a contract creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReturn {
    /// Deployed code, or the error that ended the creation
    pub result: VmResult<Vec<u8>>,
    /// Address of the (attempted) contract
    pub address: Address,
    /// Gas left for the caller
    pub gas_left: u64,
}

/// Execution environment for one transaction.
///
/// Borrows the state, the chain configuration and the ancestor hashes,
/// and owns one bridge per loaded engine.
pub struct Evm<'a> {
    env: Environment,
    state: &'a mut (dyn StateDb + 'a),
    config: &'a (dyn ChainConfig + 'a),
    block_hashes: &'a (dyn BlockHashes + 'a),
    bridges: Vec<EngineBridge>,
    depth: usize,
    read_only: bool,
}

impl<'a> Evm<'a> {
    /// Create an environment using the engines of `registry`
    pub fn new(
        env: Environment,
        state: &'a mut (dyn StateDb + 'a),
        config: &'a (dyn ChainConfig + 'a),
        block_hashes: &'a (dyn BlockHashes + 'a),
        registry: &EngineRegistry,
    ) -> Self {
        Self {
            env,
            state,
            config,
            block_hashes,
            bridges: registry.bridges(),
            depth: 0,
            read_only: false,
        }
    }

    /// Current nesting depth (number of engine invocations in progress)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a frame on the stack made execution read-only. Shared by
    /// every engine, so switching code format does not lift it.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Block context
    pub fn block(&self) -> &BlockContext {
        &self.env.block
    }

    /// Transaction context
    pub fn transaction(&self) -> &TransactionContext {
        &self.env.tx
    }

    /// Whether `transition` is active at the current block
    pub fn is_enabled(&self, transition: Transition) -> bool {
        self.config.is_enabled(transition, self.env.block.number)
    }

    /// Revision in effect at the current block
    pub fn revision(&self) -> Revision {
        resolve_revision(self.config, self.env.block.number)
    }

    /// State accessor
    pub fn state(&self) -> &dyn StateDb {
        &*self.state
    }

    /// Mutable state accessor
    pub fn state_mut(&mut self) -> &mut (dyn StateDb + 'a) {
        &mut *self.state
    }

    /// Engine bridges in selection order
    pub fn bridges(&self) -> &[EngineBridge] {
        &self.bridges
    }

    pub(crate) fn block_hash(&self, number: BlockNumber) -> H256 {
        self.block_hashes.block_hash(number)
    }


    /// Run `frame` on the first engine that accepts its code
    pub fn run(&mut self, frame: &mut CallFrame, input: &[u8], read_only: bool) -> VmResult<Vec<u8>> {
        let bridge = self
            .bridges
            .iter()
            .find(|bridge| bridge.can_run(&frame.code))
            .cloned()
            .ok_or(VmError::NoCompatibleInterpreter)?;
        bridge.run(self, frame, input, read_only)
    }

    /// Message call with value transfer
    pub fn call(
        &mut self,
        caller: &CallFrame,
        address: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> CallReturn {
        if self.depth > CALL_CREATE_DEPTH {
            return CallReturn::rejected(VmError::DepthExceeded, gas);
        }
        if !self.can_transfer(&caller.address, value) {
            return CallReturn::rejected(VmError::InsufficientBalance, gas);
        }

        if !self.state.exist(&address) {
            if self.is_enabled(Transition::Eip161Abc) && value.is_zero() {
                // Calling a missing account with no value must not create it
                return CallReturn {
                    result: Ok(Vec::new()),
                    gas_left: gas,
                };
            }
            let snapshot = self.state.snapshot();
            self.state.create_account(address);
            return self.call_existing(caller, address, input, gas, value, snapshot);
        }

        let snapshot = self.state.snapshot();
        self.call_existing(caller, address, input, gas, value, snapshot)
    }

    fn call_existing(
        &mut self,
        caller: &CallFrame,
        address: Address,
        input: &[u8],
        gas: u64,
        value: U256,
        snapshot: usize,
    ) -> CallReturn {
        self.transfer(caller.address, address, value);

        let code = self.state.get_code(&address);
        if code.is_empty() {
            return CallReturn {
                result: Ok(Vec::new()),
                gas_left: gas,
            };
        }

        let mut frame = CallFrame::new(caller.address, address, value, gas).with_code(address, code);
        let result = self.run(&mut frame, input, false);
        self.settle(snapshot, result, frame.gas)
    }

    /// Execute `address`'s code in the caller's account
    pub fn call_code(
        &mut self,
        caller: &CallFrame,
        address: Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> CallReturn {
        if self.depth > CALL_CREATE_DEPTH {
            return CallReturn::rejected(VmError::DepthExceeded, gas);
        }
        if !self.can_transfer(&caller.address, value) {
            return CallReturn::rejected(VmError::InsufficientBalance, gas);
        }

        let snapshot = self.state.snapshot();
        let code = self.state.get_code(&address);
        let mut frame =
            CallFrame::new(caller.address, caller.address, value, gas).with_code(address, code);
        let result = self.run(&mut frame, input, false);
        self.settle(snapshot, result, frame.gas)
    }

    /// Execute `address`'s code in the caller's account with the caller's
    /// own caller and value
    pub fn delegate_call(
        &mut self,
        caller: &CallFrame,
        address: Address,
        input: &[u8],
        gas: u64,
    ) -> CallReturn {
        if self.depth > CALL_CREATE_DEPTH {
            return CallReturn::rejected(VmError::DepthExceeded, gas);
        }

        let snapshot = self.state.snapshot();
        let code = self.state.get_code(&address);
        let mut frame = CallFrame::new(caller.caller, caller.address, caller.value, gas)
            .with_code(address, code);
        let result = self.run(&mut frame, input, false);
        self.settle(snapshot, result, frame.gas)
    }

    /// Message call that may not modify state
    pub fn static_call(
        &mut self,
        caller: &CallFrame,
        address: Address,
        input: &[u8],
        gas: u64,
    ) -> CallReturn {
        if self.depth > CALL_CREATE_DEPTH {
            return CallReturn::rejected(VmError::DepthExceeded, gas);
        }

        let snapshot = self.state.snapshot();
        // Touch the callee so it is subject to empty-account clearing
        self.state.add_balance(address, U256::zero());

        let code = self.state.get_code(&address);
        let mut frame =
            CallFrame::new(caller.address, address, U256::zero(), gas).with_code(address, code);
        let result = self.run(&mut frame, input, true);
        self.settle(snapshot, result, frame.gas)
    }

    /// Create a contract at the nonce-derived address
    pub fn create(&mut self, caller: &CallFrame, init_code: &[u8], gas: u64, value: U256) -> CreateReturn {
        let nonce = self.state.get_nonce(&caller.address);
        let address = create_address(&caller.address, nonce);
        self.create_at(caller, init_code, gas, value, address)
    }

    /// Create a contract at the salt-derived address
    pub fn create2(
        &mut self,
        caller: &CallFrame,
        init_code: &[u8],
        gas: u64,
        value: U256,
        salt: H256,
    ) -> CreateReturn {
        let address = create2_address(&caller.address, &salt, init_code);
        self.create_at(caller, init_code, gas, value, address)
    }

    fn create_at(
        &mut self,
        caller: &CallFrame,
        init_code: &[u8],
        gas: u64,
        value: U256,
        address: Address,
    ) -> CreateReturn {
        let rejected = |err, gas_left| CreateReturn {
            result: Err(err),
            address,
            gas_left,
        };

        if self.depth > CALL_CREATE_DEPTH {
            return rejected(VmError::DepthExceeded, gas);
        }
        if !self.can_transfer(&caller.address, value) {
            return rejected(VmError::InsufficientBalance, gas);
        }

        let nonce = self.state.get_nonce(&caller.address);
        self.state.set_nonce(caller.address, nonce + 1);

        let code_hash = self.state.get_code_hash(&address);
        if self.state.get_nonce(&address) != 0
            || (!code_hash.is_zero() && code_hash != EMPTY_CODE_HASH)
        {
            return rejected(VmError::ContractAddressCollision, 0);
        }

        let snapshot = self.state.snapshot();
        self.state.create_account(address);
        if self.is_enabled(Transition::Eip161Abc) {
            self.state.set_nonce(address, 1);
        }
        self.transfer(caller.address, address, value);

        let mut frame =
            CallFrame::new(caller.address, address, value, gas).with_code(address, init_code.to_vec());
        let outcome = self.run(&mut frame, &[], false);

        let oversized = matches!(
            &outcome,
            Ok(code) if self.is_enabled(Transition::Eip170) && code.len() > MAX_CODE_SIZE
        );
        let result = match outcome {
            Ok(_) if oversized => Err(VmError::MaxCodeSizeExceeded),
            Ok(code) => {
                let deposit = (code.len() as u64).saturating_mul(CREATE_DATA_GAS);
                if frame.gas >= deposit {
                    frame.gas -= deposit;
                    self.state.set_code(address, code.clone());
                    Ok(code)
                } else {
                    Err(VmError::CodeStoreOutOfGas)
                }
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            // Frontier keeps a contract whose code could not be paid for
            let keep = !self.is_enabled(Transition::Eip7) && *err == VmError::CodeStoreOutOfGas;
            if !keep {
                if let Err(state_err) = self.state.revert_to_snapshot(snapshot) {
                    return rejected(state_err.into(), 0);
                }
                if !err.preserves_gas() {
                    frame.gas = 0;
                }
            }
        }

        CreateReturn {
            result,
            address,
            gas_left: frame.gas,
        }
    }

    fn can_transfer(&self, from: &Address, value: U256) -> bool {
        self.state.get_balance(from) >= value
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) {
        self.state.sub_balance(from, value);
        self.state.add_balance(to, value);
    }

    /// Roll back a failed call; only reverts keep their gas
    fn settle(&mut self, snapshot: usize, result: VmResult<Vec<u8>>, gas_left: u64) -> CallReturn {
        match result {
            Ok(output) => CallReturn {
                result: Ok(output),
                gas_left,
            },
            Err(err) => {
                if let Err(state_err) = self.state.revert_to_snapshot(snapshot) {
                    return CallReturn::rejected(state_err.into(), 0);
                }
                let gas_left = if err.preserves_gas() { gas_left } else { 0 };
                CallReturn {
                    result: Err(err),
                    gas_left,
                }
            }
        }
    }
}

/// One engine invocation on the call stack.
///
/// Entering raises the depth and, when requested and not already set,
/// the read-only flag. Dropping the guard undoes both, on every exit path
/// including unwinding.
pub(crate) struct FrameGuard<'e, 'a> {
    evm: &'e mut Evm<'a>,
    set_read_only: bool,
}

impl<'e, 'a> FrameGuard<'e, 'a> {
    pub(crate) fn enter(evm: &'e mut Evm<'a>, read_only: bool) -> Self {
        evm.depth += 1;
        let set_read_only = read_only && !evm.read_only;
        if set_read_only {
            evm.read_only = true;
        }
        Self { evm, set_read_only }
    }
}

impl<'a> Deref for FrameGuard<'_, 'a> {
    type Target = Evm<'a>;

    fn deref(&self) -> &Evm<'a> {
        self.evm
    }
}

impl<'a> DerefMut for FrameGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Evm<'a> {
        self.evm
    }
}

impl Drop for FrameGuard<'_, '_> {
    fn drop(&mut self) {
        self.evm.depth -= 1;
        if self.set_read_only {
            self.evm.read_only = false;
        }
    }
}
