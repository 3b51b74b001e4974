//! Engine loading
//!
//! An engine is configured as `path[,name=value...]`. The path is handed to
//! an [`EngineLoader`]; each option is applied with [`Engine::set_option`]
//! before the engine is shared.

use crate::engine::{Capability, Engine};
use crate::error::{LoadError, LoadResult};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Engine location and options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Library path (or builtin name)
    pub path: String,
    /// Options in configuration order
    pub options: Vec<(String, String)>,
}

impl FromStr for EngineConfig {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split(',');
        let path = segments.next().unwrap_or_default().trim().to_string();
        let options = segments
            .filter_map(|segment| segment.split_once('='))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();
        Ok(Self { path, options })
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (name, value) in &self.options {
            write!(f, ",{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Turns a configured path into an engine instance
pub trait EngineLoader {
    /// Load the engine at `path`
    fn load(&self, path: &str) -> LoadResult<Box<dyn Engine>>;
}

/// Configuration key naming the engine for a capability
pub fn config_key(capability: Capability) -> &'static str {
    match capability {
        Capability::Evm1 => "evm",
        Capability::Ewasm => "ewasm",
    }
}

/// Load, configure and check an engine for `capability`.
///
/// Failing options are logged and skipped; every other problem is fatal.
pub fn load_engine(
    capability: Capability,
    config: &EngineConfig,
    loader: &dyn EngineLoader,
) -> LoadResult<Arc<dyn Engine>> {
    if config.path.is_empty() {
        return Err(LoadError::MissingPath {
            capability,
            key: config_key(capability),
        });
    }

    let mut engine = loader.load(&config.path)?;
    tracing::info!(
        "Loaded {} engine {} {} from {}",
        capability,
        engine.name(),
        engine.version(),
        config.path
    );

    for (name, value) in &config.options {
        match engine.set_option(name, value) {
            Ok(()) => tracing::info!("Engine option {}={} set", name, value),
            Err(e) => tracing::warn!("Engine option {}={} not set: {}", name, value, e),
        }
    }

    if !engine.has_capability(capability) {
        return Err(LoadError::MissingCapability {
            path: config.path.clone(),
            capability,
        });
    }

    Ok(Arc::from(engine))
}

type Constructor = Box<dyn Fn() -> Box<dyn Engine> + Send + Sync>;

/// Loader for engines linked into the binary, addressed by name
#[derive(Default)]
pub struct BuiltinLoader {
    constructors: HashMap<String, Constructor>,
}

impl BuiltinLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`
    pub fn register<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Engine> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
        self
    }

    /// Registered names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl EngineLoader for BuiltinLoader {
    fn load(&self, path: &str) -> LoadResult<Box<dyn Engine>> {
        self.constructors
            .get(path)
            .map(|constructor| constructor())
            .ok_or_else(|| LoadError::Library {
                path: path.to_string(),
                reason: "no builtin engine registered under this name".to_string(),
            })
    }
}

impl fmt::Debug for BuiltinLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinLoader")
            .field("engines", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Name of the constructor a shared-library engine exports
pub const ENGINE_CONSTRUCTOR: &str = "fugue_create_engine";

/// Signature of the exported constructor.
///
/// Rust ABI: `Box<dyn Engine>` crosses the library boundary as a fat
/// pointer, so the library and the host must be built by the same compiler
/// against the same `fugue-vm`. Export constructors with [`declare_engine!`].
pub type EngineConstructor = extern "Rust" fn() -> Box<dyn Engine>;

/// Export an engine constructor from a shared library crate.
///
/// The library must be built with the same compiler as the host binary.
#[macro_export]
macro_rules! declare_engine {
    ($constructor:expr) => {
        #[no_mangle]
        pub extern "Rust" fn fugue_create_engine() -> ::std::boxed::Box<dyn $crate::Engine> {
            ::std::boxed::Box::new($constructor)
        }
    };
}

#[cfg(feature = "dynamic")]
pub use dynamic::DynamicLoader;

#[cfg(feature = "dynamic")]
mod dynamic {
    use super::{EngineConstructor, EngineLoader, ENGINE_CONSTRUCTOR};
    use crate::engine::{Capability, Engine, ExecutionMessage, ExecutionResult, SetOptionError};
    use crate::error::{LoadError, LoadResult};
    use crate::host::Host;
    use fugue_config::Revision;
    use libloading::{Library, Symbol};

    /// Loader for engines in shared libraries
    #[derive(Debug, Default, Clone, Copy)]
    pub struct DynamicLoader;

    impl EngineLoader for DynamicLoader {
        fn load(&self, path: &str) -> LoadResult<Box<dyn Engine>> {
            let library_error = |e: libloading::Error| LoadError::Library {
                path: path.to_string(),
                reason: e.to_string(),
            };

            // SAFETY: opening the library runs its initializers; the path
            // comes from operator configuration.
            let library = unsafe { Library::new(path) }.map_err(library_error)?;
            // SAFETY: the symbol is declared with `declare_engine!`, which
            // fixes its signature to `EngineConstructor`.
            let engine = unsafe {
                let constructor: Symbol<EngineConstructor> = library
                    .get(ENGINE_CONSTRUCTOR.as_bytes())
                    .map_err(library_error)?;
                constructor()
            };

            Ok(Box::new(LibraryEngine {
                engine,
                _library: library,
            }))
        }
    }

    /// Engine that keeps its library loaded. Fields drop in declaration
    /// order, so the engine goes before its code is unmapped.
    struct LibraryEngine {
        engine: Box<dyn Engine>,
        _library: Library,
    }

    impl Engine for LibraryEngine {
        fn name(&self) -> &str {
            self.engine.name()
        }

        fn version(&self) -> &str {
            self.engine.version()
        }

        fn has_capability(&self, capability: Capability) -> bool {
            self.engine.has_capability(capability)
        }

        fn set_option(&mut self, name: &str, value: &str) -> Result<(), SetOptionError> {
            self.engine.set_option(name, value)
        }

        fn execute(
            &self,
            host: &mut dyn Host,
            revision: Revision,
            message: &ExecutionMessage<'_>,
            code: &[u8],
        ) -> ExecutionResult {
            self.engine.execute(host, revision, message, code)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_library() {
            let err = DynamicLoader
                .load("/nonexistent/libengine.so")
                .err()
                .expect("load must fail");
            match err {
                LoadError::Library { path, .. } => assert_eq!(path, "/nonexistent/libengine.so"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
