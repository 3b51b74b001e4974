//! Process-wide set of loaded engines

use crate::bridge::EngineBridge;
use crate::engine::{Capability, Engine};
use crate::error::{LoadError, LoadResult};
use crate::loader::{load_engine, EngineConfig, EngineLoader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Engine configuration per capability, in `path[,name=value...]` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Engine for EVM bytecode
    #[serde(default)]
    pub evm: Option<String>,
    /// Engine for ewasm modules
    #[serde(default)]
    pub ewasm: Option<String>,
}

impl VmConfig {
    /// Whether no engine is configured
    pub fn is_empty(&self) -> bool {
        self.evm.is_none() && self.ewasm.is_none()
    }
}

/// Engines loaded at startup, at most one per capability.
///
/// Built once and shared by reference with every `Evm`.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    evm: Option<Arc<dyn Engine>>,
    ewasm: Option<Arc<dyn Engine>>,
}

impl EngineRegistry {
    /// Registry without engines
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured engine. A configured but empty path is an error.
    pub fn load(config: &VmConfig, loader: &dyn EngineLoader) -> LoadResult<Self> {
        let mut registry = Self::new();
        let configured = [(Capability::Evm1, &config.evm), (Capability::Ewasm, &config.ewasm)];
        for (capability, spec) in configured {
            if let Some(spec) = spec {
                let engine_config: EngineConfig = match spec.parse() {
                    Ok(parsed) => parsed,
                    Err(never) => match never {},
                };
                let engine = load_engine(capability, &engine_config, loader)?;
                registry.insert(capability, engine);
            }
        }
        Ok(registry)
    }

    /// Add an already constructed engine
    pub fn register(&mut self, capability: Capability, engine: Arc<dyn Engine>) -> LoadResult<()> {
        if !engine.has_capability(capability) {
            return Err(LoadError::MissingCapability {
                path: engine.name().to_string(),
                capability,
            });
        }
        self.insert(capability, engine);
        Ok(())
    }

    fn insert(&mut self, capability: Capability, engine: Arc<dyn Engine>) {
        match capability {
            Capability::Evm1 => self.evm = Some(engine),
            Capability::Ewasm => self.ewasm = Some(engine),
        }
    }

    /// Engine for a capability
    pub fn engine(&self, capability: Capability) -> Option<&Arc<dyn Engine>> {
        match capability {
            Capability::Evm1 => self.evm.as_ref(),
            Capability::Ewasm => self.ewasm.as_ref(),
        }
    }

    /// Whether no engine is loaded
    pub fn is_empty(&self) -> bool {
        self.evm.is_none() && self.ewasm.is_none()
    }

    /// Fresh bridges for one execution, EVM first
    pub fn bridges(&self) -> Vec<EngineBridge> {
        [(Capability::Evm1, &self.evm), (Capability::Ewasm, &self.ewasm)]
            .into_iter()
            .filter_map(|(capability, engine)| {
                engine.as_ref().map(|e| EngineBridge::new(Arc::clone(e), capability))
            })
            .collect()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("evm", &self.evm.as_ref().map(|e| e.name().to_string()))
            .field("ewasm", &self.ewasm.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}
