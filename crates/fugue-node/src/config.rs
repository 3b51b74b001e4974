//! Configuration types for fugue-node

use anyhow::{Context, Result};
use fugue_config::{ConfigResult, ForkSchedule};
use fugue_primitives::{Address, H256, U256};
use fugue_vm::VmConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::cli::Cli;

/// Node configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Execution engines
    pub vm: VmConfig,
    /// Fork schedule
    pub chain: ChainSection,
}

/// `[chain]` section: a named preset with per-transition overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSection {
    /// Preset name (frontier, foundation, mainnet, dev)
    pub preset: Option<String>,
    /// Activation blocks merged on top of the preset
    pub transitions: ForkSchedule,
}

impl ChainSection {
    /// Build the effective schedule. Without a preset the schedule starts
    /// from Frontier.
    pub fn schedule(&self) -> ConfigResult<ForkSchedule> {
        let mut schedule = match &self.preset {
            Some(name) => ForkSchedule::preset(name)?,
            None => ForkSchedule::frontier(),
        };
        schedule.merge(&self.transitions);
        Ok(schedule)
    }
}

impl NodeConfig {
    /// Apply command-line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(evm) = &cli.vm_evm {
            self.vm.evm = Some(evm.clone());
        }
        if let Some(ewasm) = &cli.vm_ewasm {
            self.vm.ewasm = Some(ewasm.clone());
        }
    }
}

/// Load node configuration from a TOML file
pub fn load_config(path: &Path) -> Result<NodeConfig> {
    tracing::info!("Loading config from {:?}", path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: NodeConfig =
        toml::from_str(&content).with_context(|| format!("invalid config file {:?}", path))?;
    Ok(config)
}

/// Malformed genesis entries
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenesisError {
    /// Account key is not a 20-byte hex address
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Balance is neither a decimal nor a 0x-prefixed hex number
    #[error("invalid balance for {address}: {value}")]
    InvalidBalance {
        /// Account
        address: String,
        /// Raw value
        value: String,
    },
    /// Code is not valid hex
    #[error("invalid code for {0}")]
    InvalidCode(String),
    /// Storage key or value is not a 32-byte hex word
    #[error("invalid storage entry for {address}: {entry}")]
    InvalidStorage {
        /// Account
        address: String,
        /// Offending key or value
        entry: String,
    },
}

/// Genesis allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Initial account allocations
    #[serde(default)]
    pub alloc: BTreeMap<String, GenesisAccount>,
    /// Genesis timestamp
    #[serde(default)]
    pub timestamp: u64,
    /// Block gas limit
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Block difficulty
    #[serde(default = "default_difficulty")]
    pub difficulty: u64,
    /// Block beneficiary
    #[serde(default)]
    pub coinbase: Option<Address>,
}

fn default_difficulty() -> u64 {
    1
}

fn default_gas_limit() -> u64 {
    30_000_000
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            alloc: BTreeMap::new(),
            timestamp: 0,
            gas_limit: default_gas_limit(),
            difficulty: default_difficulty(),
            coinbase: None,
        }
    }
}

/// Genesis account allocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Account balance (hex or decimal string)
    #[serde(default)]
    pub balance: String,
    /// Account nonce
    #[serde(default)]
    pub nonce: u64,
    /// Contract code (hex string)
    #[serde(default)]
    pub code: Option<String>,
    /// Storage (slot -> value mapping)
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
}

impl GenesisAccount {
    /// Parse balance from hex or decimal string
    pub fn parse_balance(&self, address: &str) -> Result<U256, GenesisError> {
        let s = self.balance.trim();
        if s.is_empty() {
            return Ok(U256::zero());
        }
        parse_u256(s).ok_or_else(|| GenesisError::InvalidBalance {
            address: address.to_string(),
            value: s.to_string(),
        })
    }

    /// Parse code from hex string
    pub fn parse_code(&self, address: &str) -> Result<Vec<u8>, GenesisError> {
        match &self.code {
            Some(code) => {
                parse_hex(code).ok_or_else(|| GenesisError::InvalidCode(address.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Parse storage entries
    pub fn parse_storage(&self, address: &str) -> Result<Vec<(H256, H256)>, GenesisError> {
        let word = |entry: &str| {
            parse_hex(entry)
                .and_then(|bytes| H256::from_slice(&bytes).ok())
                .ok_or_else(|| GenesisError::InvalidStorage {
                    address: address.to_string(),
                    entry: entry.to_string(),
                })
        };
        self.storage
            .iter()
            .map(|(key, value)| Ok((word(key)?, word(value)?)))
            .collect()
    }
}

/// Load a genesis allocation from a JSON file
pub fn load_genesis_file(path: &Path) -> Result<GenesisConfig> {
    tracing::info!("Loading genesis from {:?}", path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read genesis file {:?}", path))?;
    let genesis: GenesisConfig = serde_json::from_str(&content)
        .with_context(|| format!("invalid genesis file {:?}", path))?;
    Ok(genesis)
}

/// Parse address from hex string
pub fn parse_address(s: &str) -> Option<Address> {
    Address::from_hex(s.trim()).ok()
}

/// Decode a hex string, with or without 0x prefix
pub fn parse_hex(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(s).ok()
}

/// Parse a decimal or 0x-prefixed hex number
pub fn parse_u256(s: &str) -> Option<U256> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    }
}
