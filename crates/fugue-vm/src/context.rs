//! Execution context

use fugue_primitives::{Address, BlockNumber, H256, U256};
use std::collections::{BTreeMap, HashMap};

/// One executing frame: the account whose code runs and who called it
#[derive(Clone, Debug, Default)]
pub struct CallFrame {
    /// Caller address
    pub caller: Address,
    /// Account whose storage and balance the code acts on
    pub address: Address,
    /// Account the code was loaded from
    pub code_address: Address,
    /// Code to execute
    pub code: Vec<u8>,
    /// Call value in wei
    pub value: U256,
    /// Gas remaining
    pub gas: u64,
}

impl CallFrame {
    /// Create a frame without code
    pub fn new(caller: Address, address: Address, value: U256, gas: u64) -> Self {
        Self {
            caller,
            address,
            code_address: address,
            code: Vec::new(),
            value,
            gas,
        }
    }

    /// Frame of an externally owned account starting a transaction
    pub fn external(origin: Address, gas: u64) -> Self {
        Self::new(origin, origin, U256::zero(), gas)
    }

    /// Attach code loaded from `code_address`
    pub fn with_code(mut self, code_address: Address, code: Vec<u8>) -> Self {
        self.code_address = code_address;
        self.code = code;
        self
    }
}

/// Block environment information
#[derive(Clone, Debug)]
pub struct BlockContext {
    /// Block number
    pub number: BlockNumber,
    /// Block timestamp
    pub timestamp: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block coinbase (miner)
    pub coinbase: Address,
    /// Block difficulty
    pub difficulty: U256,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            gas_limit: 8_000_000,
            coinbase: Address::ZERO,
            difficulty: U256::zero(),
        }
    }
}

/// Transaction environment information
#[derive(Clone, Debug, Default)]
pub struct TransactionContext {
    /// Transaction origin (original sender)
    pub origin: Address,
    /// Gas price
    pub gas_price: U256,
}

/// Complete execution environment
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// Block context
    pub block: BlockContext,
    /// Transaction context
    pub tx: TransactionContext,
}

impl Environment {
    /// Create new environment
    pub fn new(block: BlockContext, tx: TransactionContext) -> Self {
        Self { block, tx }
    }
}

/// Source of ancestor block hashes.
///
/// Only consulted for heights inside the BLOCKHASH window; unknown heights
/// return zero.
pub trait BlockHashes {
    /// Hash of block `number`
    fn block_hash(&self, number: BlockNumber) -> H256;
}

impl BlockHashes for HashMap<BlockNumber, H256> {
    fn block_hash(&self, number: BlockNumber) -> H256 {
        self.get(&number).copied().unwrap_or(H256::ZERO)
    }
}

impl BlockHashes for BTreeMap<BlockNumber, H256> {
    fn block_hash(&self, number: BlockNumber) -> H256 {
        self.get(&number).copied().unwrap_or(H256::ZERO)
    }
}
