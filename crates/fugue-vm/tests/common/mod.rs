//! Shared fixtures: a closure-driven engine and environment builders

#![allow(dead_code)]

use fugue_config::Revision;
use fugue_primitives::{Address, H256, U256};
use fugue_vm::{
    BlockContext, Capability, Engine, Environment, ExecutionMessage, ExecutionResult, Host,
    SetOptionError, TransactionContext,
};
use std::sync::{Arc, Mutex};

/// Behaviour of a scripted engine
pub type Script =
    dyn Fn(&mut dyn Host, &ExecutionMessage<'_>, &[u8]) -> ExecutionResult + Send + Sync;

/// Engine whose execution is a test closure
pub struct ScriptedEngine {
    name: String,
    capabilities: Vec<Capability>,
    options: Arc<Mutex<Vec<(String, String)>>>,
    script: Arc<Script>,
}

impl ScriptedEngine {
    /// EVM engine running `script`
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&mut dyn Host, &ExecutionMessage<'_>, &[u8]) -> ExecutionResult + Send + Sync + 'static,
    {
        Self {
            name: "scripted".to_string(),
            capabilities: vec![Capability::Evm1],
            options: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(script),
        }
    }

    /// Engine that always succeeds without output
    pub fn noop() -> Self {
        Self::new(|_, msg, _| ExecutionResult::success(msg.gas, Vec::new()))
    }

    /// Replace the engine name
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Replace the supported capabilities
    pub fn with_capabilities(mut self, capabilities: &[Capability]) -> Self {
        self.capabilities = capabilities.to_vec();
        self
    }

    /// Record accepted options into `log`
    pub fn with_option_log(mut self, log: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        self.options = log;
        self
    }

    /// Share the engine
    pub fn shared(self) -> Arc<dyn Engine> {
        Arc::new(self)
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    // Accepts `O` and `trace`; `O` must be numeric
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), SetOptionError> {
        match name {
            "O" if value.parse::<u8>().is_err() => Err(SetOptionError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            }),
            "O" | "trace" => {
                self.options
                    .lock()
                    .unwrap()
                    .push((name.to_string(), value.to_string()));
                Ok(())
            }
            _ => Err(SetOptionError::InvalidName(name.to_string())),
        }
    }

    fn execute(
        &self,
        host: &mut dyn Host,
        _revision: Revision,
        message: &ExecutionMessage<'_>,
        code: &[u8],
    ) -> ExecutionResult {
        (self.script)(host, message, code)
    }
}

pub fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

pub fn word(value: u64) -> H256 {
    H256::from_low_u64(value)
}

pub fn env_at(number: u64) -> Environment {
    Environment::new(
        BlockContext {
            number,
            ..Default::default()
        },
        TransactionContext {
            origin: addr(0xaa),
            gas_price: U256::one(),
        },
    )
}
