//! Host context: the callback surface an engine uses to reach the ledger

use crate::context::CallFrame;
use crate::dispatch::{dispatch, CallMessage, CallOutcome};
use crate::engine::{StorageStatus, TxContext};
use crate::evm::Evm;
use fugue_config::params::{
    BLOCK_HASH_WINDOW, NET_SSTORE_CLEAR_REFUND, NET_SSTORE_RESET_CLEAR_REFUND,
    NET_SSTORE_RESET_REFUND, SELFDESTRUCT_REFUND_GAS, SLOAD_GAS_EIP2200, SSTORE_REFUND_GAS,
    SSTORE_RESET_GAS_EIP2200, SSTORE_SET_GAS_EIP2200,
};
use fugue_config::Transition;
use fugue_primitives::{Address, H256, U256};
use fugue_state::Log;

/// Ledger services available to an executing engine
pub trait Host {
    /// Whether the account exists (emptiness rule after EIP-161d)
    fn account_exists(&self, address: Address) -> bool;

    /// Current value of a storage slot
    fn get_storage(&self, address: Address, key: H256) -> H256;

    /// Write a storage slot and adjust the refund counter
    fn set_storage(&mut self, address: Address, key: H256, value: H256) -> StorageStatus;

    /// Account balance
    fn get_balance(&self, address: Address) -> U256;

    /// Length of the account code
    fn get_code_size(&self, address: Address) -> usize;

    /// Code hash, zero for empty accounts
    fn get_code_hash(&self, address: Address) -> H256;

    /// Account code
    fn get_code(&self, address: Address) -> Vec<u8>;

    /// Destroy `address`, moving its balance to `beneficiary`
    fn selfdestruct(&mut self, address: Address, beneficiary: Address);

    /// Perform a nested call or creation
    fn call(&mut self, message: CallMessage) -> CallOutcome;

    /// Block and transaction values
    fn tx_context(&self) -> TxContext;

    /// Hash of one of the 256 most recent ancestors, zero otherwise
    fn get_block_hash(&self, number: u64) -> H256;

    /// Append a log entry
    fn emit_log(&mut self, address: Address, topics: &[H256], data: &[u8]);
}

/// Host bound to one executing frame. Holds no state of its own.
pub struct HostContext<'e, 'a> {
    evm: &'e mut Evm<'a>,
    frame: &'e CallFrame,
}

impl<'e, 'a> HostContext<'e, 'a> {
    /// Bind the host to the frame being executed
    pub fn new(evm: &'e mut Evm<'a>, frame: &'e CallFrame) -> Self {
        Self { evm, frame }
    }

    /// The frame this host serves
    pub fn frame(&self) -> &CallFrame {
        self.frame
    }

    // Net metering (EIP-1283 semantics) only applies once both EIP-2200 and
    // EIP-1884 are active; before that SSTORE uses the original rules.
    fn net_metering(&self) -> bool {
        self.evm.is_enabled(Transition::Eip2200) && self.evm.is_enabled(Transition::Eip1884)
    }
}

/// Refunds for restoring a slot to its original value: (original zero,
/// original nonzero)
pub(crate) fn reset_refunds(has_eip2200: bool) -> (u64, u64) {
    if has_eip2200 {
        (
            SSTORE_SET_GAS_EIP2200 - SLOAD_GAS_EIP2200,
            SSTORE_RESET_GAS_EIP2200 - SLOAD_GAS_EIP2200,
        )
    } else {
        (NET_SSTORE_RESET_CLEAR_REFUND, NET_SSTORE_RESET_REFUND)
    }
}

impl Host for HostContext<'_, '_> {
    fn account_exists(&self, address: Address) -> bool {
        if self.evm.is_enabled(Transition::Eip161D) {
            !self.evm.state().empty(&address)
        } else {
            self.evm.state().exist(&address)
        }
    }

    fn get_storage(&self, address: Address, key: H256) -> H256 {
        self.evm.state().get_state(&address, &key)
    }

    fn set_storage(&mut self, address: Address, key: H256, value: H256) -> StorageStatus {
        let current = self.evm.state().get_state(&address, &key);
        if current == value {
            return StorageStatus::Unchanged;
        }
        let original = self.evm.state().get_committed_state(&address, &key);
        self.evm.state_mut().set_state(address, key, value);

        if !self.net_metering() {
            if current.is_zero() {
                return StorageStatus::Added;
            }
            if value.is_zero() {
                self.evm.state_mut().add_refund(SSTORE_REFUND_GAS);
                return StorageStatus::Deleted;
            }
            return StorageStatus::Modified;
        }

        let (reset_clear_refund, reset_refund) =
            reset_refunds(self.evm.is_enabled(Transition::Eip2200));
        let state = self.evm.state_mut();

        if original == current {
            if original.is_zero() {
                return StorageStatus::Added;
            }
            if value.is_zero() {
                state.add_refund(NET_SSTORE_CLEAR_REFUND);
                return StorageStatus::Deleted;
            }
            return StorageStatus::Modified;
        }

        // Dirty slot
        if !original.is_zero() {
            if current.is_zero() {
                state.sub_refund(NET_SSTORE_CLEAR_REFUND);
            } else if value.is_zero() {
                state.add_refund(NET_SSTORE_CLEAR_REFUND);
            }
        }
        if original == value {
            if original.is_zero() {
                state.add_refund(reset_clear_refund);
            } else {
                state.add_refund(reset_refund);
            }
        }
        StorageStatus::ModifiedAgain
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.evm.state().get_balance(&address)
    }

    fn get_code_size(&self, address: Address) -> usize {
        self.evm.state().get_code_size(&address)
    }

    fn get_code_hash(&self, address: Address) -> H256 {
        if self.evm.state().empty(&address) {
            return H256::ZERO;
        }
        self.evm.state().get_code_hash(&address)
    }

    fn get_code(&self, address: Address) -> Vec<u8> {
        self.evm.state().get_code(&address)
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) {
        let state = self.evm.state_mut();
        if !state.has_suicided(&address) {
            state.add_refund(SELFDESTRUCT_REFUND_GAS);
        }
        let balance = state.get_balance(&address);
        state.add_balance(beneficiary, balance);
        state.suicide(&address);
    }

    fn call(&mut self, message: CallMessage) -> CallOutcome {
        dispatch(self.evm, self.frame, message)
    }

    fn tx_context(&self) -> TxContext {
        let block = self.evm.block();
        let tx = self.evm.transaction();
        TxContext {
            gas_price: tx.gas_price,
            origin: tx.origin,
            coinbase: block.coinbase,
            number: block.number,
            timestamp: block.timestamp,
            gas_limit: block.gas_limit,
            difficulty: block.difficulty,
        }
    }

    fn get_block_hash(&self, number: u64) -> H256 {
        let current = self.evm.block().number;
        if number < current && number >= current.saturating_sub(BLOCK_HASH_WINDOW) {
            return self.evm.block_hash(number);
        }
        H256::ZERO
    }

    fn emit_log(&mut self, address: Address, topics: &[H256], data: &[u8]) {
        let block_number = self.evm.block().number;
        self.evm.state_mut().add_log(Log {
            address,
            topics: topics.to_vec(),
            data: data.to_vec(),
            block_number,
        });
    }
}
