//! Genesis state for fugue-node

use crate::config::{parse_address, GenesisConfig, GenesisError};
use fugue_primitives::{Address, BlockNumber, U256};
use fugue_state::{MemoryStateDb, StateDb};
use fugue_vm::BlockContext;

/// Result type for genesis operations
pub type GenesisResult<T> = Result<T, GenesisError>;

/// Build the initial state from the genesis allocation. Storage is seeded
/// as committed, so the first transaction sees it as original values.
pub fn build_state(config: &GenesisConfig) -> GenesisResult<MemoryStateDb> {
    tracing::info!("Initializing genesis state...");

    let mut state = MemoryStateDb::new();
    for (addr_str, account) in &config.alloc {
        let address = parse_address(addr_str)
            .ok_or_else(|| GenesisError::InvalidAddress(addr_str.clone()))?;
        let balance = account.parse_balance(addr_str)?;
        let code = account.parse_code(addr_str)?;
        let storage = account.parse_storage(addr_str)?;

        state = state.with_account(address, balance, code);
        if account.nonce != 0 {
            state.set_nonce(address, account.nonce);
        }
        for (key, value) in storage {
            state = state.with_committed_storage(address, key, value);
        }

        tracing::debug!(
            "Genesis allocation: {} balance={}, nonce={}",
            addr_str,
            balance,
            account.nonce
        );
    }

    tracing::info!("Genesis state initialized: allocations={}", config.alloc.len());
    Ok(state)
}

/// Block environment at `number` using the genesis block parameters
pub fn block_context(config: &GenesisConfig, number: BlockNumber) -> BlockContext {
    BlockContext {
        number,
        timestamp: config.timestamp,
        gas_limit: config.gas_limit,
        coinbase: config.coinbase.unwrap_or(Address::ZERO),
        difficulty: U256::from(config.difficulty),
    }
}
