//! State accessor interface

use crate::error::StateResult;
use fugue_crypto::EMPTY_CODE_HASH;
use fugue_primitives::{Address, BlockNumber, H256, U256};

/// Account data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account nonce
    pub nonce: u64,
    /// Account balance
    pub balance: U256,
    /// Code hash (keccak256 of code, or EMPTY_CODE_HASH if no code)
    pub code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            code_hash: EMPTY_CODE_HASH,
        }
    }

    /// Check if account is empty (EIP-161)
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_CODE_HASH
    }

    /// Check if account has code
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }
}

/// Log entry emitted during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Log topics (0-4)
    pub topics: Vec<H256>,
    /// Log data
    pub data: Vec<u8>,
    /// Block the log was emitted in
    pub block_number: BlockNumber,
}

/// Mutable ledger state as seen by contract execution.
///
/// Reads of missing accounts and slots return zero values. Balance
/// subtraction assumes the caller already checked the balance.
pub trait StateDb {
    /// Create (or reset) an account, keeping any existing balance
    fn create_account(&mut self, address: Address);

    /// Current value of a storage slot
    fn get_state(&self, address: &Address, key: &H256) -> H256;

    /// Value of a storage slot at the start of the current transaction
    fn get_committed_state(&self, address: &Address, key: &H256) -> H256;

    /// Write a storage slot
    fn set_state(&mut self, address: Address, key: H256, value: H256);

    /// Account balance
    fn get_balance(&self, address: &Address) -> U256;

    /// Credit an account, creating it if needed
    fn add_balance(&mut self, address: Address, amount: U256);

    /// Debit an account
    fn sub_balance(&mut self, address: Address, amount: U256);

    /// Account nonce
    fn get_nonce(&self, address: &Address) -> u64;

    /// Set the account nonce
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Contract code (empty for code-less or missing accounts)
    fn get_code(&self, address: &Address) -> Vec<u8>;

    /// Install contract code
    fn set_code(&mut self, address: Address, code: Vec<u8>);

    /// Length of the contract code
    fn get_code_size(&self, address: &Address) -> usize;

    /// Code hash: zero for missing accounts, EMPTY_CODE_HASH for code-less ones
    fn get_code_hash(&self, address: &Address) -> H256;

    /// Whether the account exists (self-destructed accounts still exist
    /// until the transaction is finalized)
    fn exist(&self, address: &Address) -> bool;

    /// Whether the account is missing or empty per EIP-161
    fn empty(&self, address: &Address) -> bool;

    /// Whether the account self-destructed in the current transaction
    fn has_suicided(&self, address: &Address) -> bool;

    /// Mark the account as self-destructed and clear its balance.
    /// Returns false if the account does not exist.
    fn suicide(&mut self, address: &Address) -> bool;

    /// Append a log entry
    fn add_log(&mut self, log: Log);

    /// Logs in emission order
    fn logs(&self) -> &[Log];

    /// Increase the refund counter
    fn add_refund(&mut self, gas: u64);

    /// Decrease the refund counter
    fn sub_refund(&mut self, gas: u64);

    /// Current refund counter
    fn get_refund(&self) -> u64;

    /// Take a snapshot of the journaled state, returning its id
    fn snapshot(&mut self) -> usize;

    /// Roll back to a snapshot, discarding it and every later one
    fn revert_to_snapshot(&mut self, id: usize) -> StateResult<()>;
}
