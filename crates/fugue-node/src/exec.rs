//! One-shot message call against the genesis state

use crate::config::{parse_address, parse_hex, parse_u256};
use anyhow::{anyhow, Result};
use fugue_config::{ChainConfig, ForkSchedule, Transition};
use fugue_primitives::{Address, BlockNumber, H256, U256};
use fugue_state::{Log, MemoryStateDb, StateDb};
use fugue_vm::{
    BlockContext, CallFrame, EngineRegistry, Environment, Evm, TransactionContext, VmError,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Message call requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Sender, also the transaction origin
    pub from: Address,
    /// Callee
    pub to: Address,
    /// Call data
    pub input: Vec<u8>,
    /// Gas limit
    pub gas: u64,
    /// Transferred value
    pub value: U256,
}

impl CallRequest {
    /// Parse the raw command-line strings
    pub fn parse(to: &str, from: Option<&str>, input: &str, gas: u64, value: &str) -> Result<Self> {
        let to = parse_address(to).ok_or_else(|| anyhow!("invalid --call address: {}", to))?;
        let from = match from {
            Some(from) => {
                parse_address(from).ok_or_else(|| anyhow!("invalid --from address: {}", from))?
            }
            None => Address::ZERO,
        };
        let input = parse_hex(input).ok_or_else(|| anyhow!("invalid --input hex: {}", input))?;
        let value = parse_u256(value).ok_or_else(|| anyhow!("invalid --value: {}", value))?;
        Ok(Self {
            from,
            to,
            input,
            gas,
            value,
        })
    }
}

/// Log entry in a call report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
    /// Emitting contract
    pub address: Address,
    /// Topics
    pub topics: Vec<H256>,
    /// Data (0x hex)
    pub data: String,
}

impl From<Log> for LogReport {
    fn from(log: Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics,
            data: format!("0x{}", hex::encode(log.data)),
        }
    }
}

/// Outcome of a one-shot call, printed as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallReport {
    /// Revision the call executed under
    pub revision: String,
    /// `success`, `revert` or `failure`
    pub status: &'static str,
    /// Return or revert data (0x hex)
    pub output: String,
    /// Gas consumed by the call
    pub gas_used: u64,
    /// Storage refund accumulated before finalization
    pub refund: u64,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Logs emitted by the call
    pub logs: Vec<LogReport>,
}

/// Run `request` at `block` and finalize the transaction.
///
/// No ancestor hashes are known, so BLOCKHASH reads zero.
pub fn execute(
    state: &mut MemoryStateDb,
    schedule: &ForkSchedule,
    registry: &EngineRegistry,
    block: BlockContext,
    request: &CallRequest,
) -> CallReport {
    let number: BlockNumber = block.number;
    let env = Environment::new(
        block,
        TransactionContext {
            origin: request.from,
            gas_price: U256::zero(),
        },
    );
    let block_hashes: BTreeMap<BlockNumber, H256> = BTreeMap::new();

    let (revision, ret) = {
        let mut evm = Evm::new(env, state, schedule, &block_hashes, registry);
        let revision = evm.revision();
        let origin = CallFrame::external(request.from, request.gas);
        tracing::debug!(
            "Calling {} from {} at block {} ({})",
            request.to,
            request.from,
            number,
            revision
        );
        let ret = evm.call(&origin, request.to, &request.input, request.gas, request.value);
        (revision, ret)
    };

    let refund = state.get_refund();
    let logs = state.take_logs();
    state.finalize_transaction(schedule.is_enabled(Transition::Eip161D, number));

    let (status, output, error) = match ret.result {
        Ok(output) => ("success", output, None),
        Err(VmError::Reverted(output)) => ("revert", output, None),
        Err(err) => ("failure", Vec::new(), Some(err.to_string())),
    };

    CallReport {
        revision: revision.to_string(),
        status,
        output: format!("0x{}", hex::encode(output)),
        gas_used: request.gas.saturating_sub(ret.gas_left),
        refund,
        error,
        logs: logs.into_iter().map(LogReport::from).collect(),
    }
}
