//! In-memory state database

use crate::error::{StateError, StateResult};
use crate::traits::{Account, Log, StateDb};
use fugue_crypto::{keccak256, EMPTY_CODE_HASH};
use fugue_primitives::{Address, H256, U256};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct AccountEntry {
    account: Account,
    code: Vec<u8>,
    storage: HashMap<H256, H256>,
    suicided: bool,
}

/// Everything a snapshot restores
#[derive(Clone, Debug, Default)]
struct Journaled {
    accounts: HashMap<Address, AccountEntry>,
    refund: u64,
    logs: Vec<Log>,
}

/// Hash-map backed state for a single execution pipeline.
///
/// Snapshots clone the journaled state, so they are cheap to reason about
/// but proportional to the state size.
#[derive(Debug, Default)]
pub struct MemoryStateDb {
    state: Journaled,
    /// Storage as of the start of the current transaction
    committed: HashMap<(Address, H256), H256>,
    snapshots: Vec<Journaled>,
}

impl MemoryStateDb {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with balance and code (test and genesis helper)
    pub fn with_account(mut self, address: Address, balance: U256, code: Vec<u8>) -> Self {
        self.add_balance(address, balance);
        if !code.is_empty() {
            self.set_code(address, code);
        }
        self
    }

    /// Seed a storage slot as already committed (test and genesis helper)
    pub fn with_committed_storage(mut self, address: Address, key: H256, value: H256) -> Self {
        self.set_state(address, key, value);
        if !value.is_zero() {
            self.committed.insert((address, key), value);
        }
        self
    }

    /// Get a copy of an account
    pub fn account(&self, address: &Address) -> Option<Account> {
        self.state.accounts.get(address).map(|e| e.account.clone())
    }

    /// Number of existing accounts
    pub fn account_count(&self) -> usize {
        self.state.accounts.len()
    }

    /// Number of snapshots currently held
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Close the current transaction: drop self-destructed accounts (and
    /// empty ones when `delete_empty` is set), promote current storage to
    /// committed, reset the refund counter and discard snapshots.
    pub fn finalize_transaction(&mut self, delete_empty: bool) {
        self.state
            .accounts
            .retain(|_, entry| !entry.suicided && !(delete_empty && entry.account.is_empty()));

        self.committed.clear();
        for (address, entry) in &self.state.accounts {
            for (key, value) in &entry.storage {
                if !value.is_zero() {
                    self.committed.insert((*address, *key), *value);
                }
            }
        }

        self.state.refund = 0;
        self.snapshots.clear();
    }

    /// Drain the collected logs
    pub fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.state.logs)
    }

    fn entry_mut(&mut self, address: Address) -> &mut AccountEntry {
        self.state.accounts.entry(address).or_default()
    }
}

impl StateDb for MemoryStateDb {
    fn create_account(&mut self, address: Address) {
        let balance = self.get_balance(&address);
        let mut entry = AccountEntry::default();
        entry.account.balance = balance;
        self.state.accounts.insert(address, entry);
    }

    fn get_state(&self, address: &Address, key: &H256) -> H256 {
        self.state
            .accounts
            .get(address)
            .and_then(|e| e.storage.get(key).copied())
            .unwrap_or(H256::ZERO)
    }

    fn get_committed_state(&self, address: &Address, key: &H256) -> H256 {
        self.committed.get(&(*address, *key)).copied().unwrap_or(H256::ZERO)
    }

    fn set_state(&mut self, address: Address, key: H256, value: H256) {
        let entry = self.entry_mut(address);
        if value.is_zero() {
            entry.storage.remove(&key);
        } else {
            entry.storage.insert(key, value);
        }
    }

    fn get_balance(&self, address: &Address) -> U256 {
        self.state
            .accounts
            .get(address)
            .map(|e| e.account.balance)
            .unwrap_or_default()
    }

    fn add_balance(&mut self, address: Address, amount: U256) {
        let entry = self.entry_mut(address);
        entry.account.balance = entry.account.balance.saturating_add(amount);
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let entry = self.entry_mut(address);
        entry.account.balance = entry.account.balance.saturating_sub(amount);
    }

    fn get_nonce(&self, address: &Address) -> u64 {
        self.state.accounts.get(address).map(|e| e.account.nonce).unwrap_or(0)
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.entry_mut(address).account.nonce = nonce;
    }

    fn get_code(&self, address: &Address) -> Vec<u8> {
        self.state
            .accounts
            .get(address)
            .map(|e| e.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Vec<u8>) {
        let code_hash = if code.is_empty() { EMPTY_CODE_HASH } else { keccak256(&code) };
        let entry = self.entry_mut(address);
        entry.account.code_hash = code_hash;
        entry.code = code;
    }

    fn get_code_size(&self, address: &Address) -> usize {
        self.state.accounts.get(address).map(|e| e.code.len()).unwrap_or(0)
    }

    fn get_code_hash(&self, address: &Address) -> H256 {
        self.state
            .accounts
            .get(address)
            .map(|e| e.account.code_hash)
            .unwrap_or(H256::ZERO)
    }

    fn exist(&self, address: &Address) -> bool {
        self.state.accounts.contains_key(address)
    }

    fn empty(&self, address: &Address) -> bool {
        self.state
            .accounts
            .get(address)
            .map(|e| e.account.is_empty())
            .unwrap_or(true)
    }

    fn has_suicided(&self, address: &Address) -> bool {
        self.state.accounts.get(address).map(|e| e.suicided).unwrap_or(false)
    }

    fn suicide(&mut self, address: &Address) -> bool {
        match self.state.accounts.get_mut(address) {
            Some(entry) => {
                entry.suicided = true;
                entry.account.balance = U256::zero();
                true
            }
            None => false,
        }
    }

    fn add_log(&mut self, log: Log) {
        self.state.logs.push(log);
    }

    fn logs(&self) -> &[Log] {
        &self.state.logs
    }

    fn add_refund(&mut self, gas: u64) {
        self.state.refund = self.state.refund.saturating_add(gas);
    }

    fn sub_refund(&mut self, gas: u64) {
        if gas > self.state.refund {
            tracing::error!(
                "Refund counter below zero (gas: {} > refund: {})",
                gas,
                self.state.refund
            );
        }
        self.state.refund = self.state.refund.saturating_sub(gas);
    }

    fn get_refund(&self) -> u64 {
        self.state.refund
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.state.clone());
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) -> StateResult<()> {
        if id >= self.snapshots.len() {
            return Err(StateError::InvalidSnapshot(id));
        }
        let mut reverted = self.snapshots.split_off(id);
        self.state = reverted.swap_remove(0);
        Ok(())
    }
}
