//! Fugue node binary
//!
//! Loads the configured execution engines, resolves the fork schedule and
//! optionally runs one message call against a genesis state.

mod cli;
mod config;
mod exec;
mod genesis;

use anyhow::{Context, Result};
use cli::Cli;
use config::{load_config, load_genesis_file, GenesisConfig, NodeConfig};
use exec::CallRequest;
use fugue_config::resolve_revision;
use fugue_vm::{Capability, DynamicLoader, EngineRegistry};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Fugue node starting...");

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NodeConfig::default(),
    };
    config.apply_cli(&cli);

    let schedule = config
        .chain
        .schedule()
        .context("failed to build fork schedule")?;
    let revision = resolve_revision(&schedule, cli.block);
    tracing::info!("Block {}: revision {}", cli.block, revision);

    let registry =
        EngineRegistry::load(&config.vm, &DynamicLoader).context("failed to load engines")?;
    if registry.is_empty() {
        tracing::warn!("No execution engine configured, contract code cannot run");
    }
    for capability in [Capability::Evm1, Capability::Ewasm] {
        if let Some(engine) = registry.engine(capability) {
            tracing::info!(
                "{} engine: {} {}",
                capability,
                engine.name(),
                engine.version()
            );
        }
    }

    let Some(to) = &cli.call else {
        return Ok(());
    };

    let request = CallRequest::parse(to, cli.from.as_deref(), &cli.input, cli.gas, &cli.value)?;
    let genesis_config = match &cli.genesis {
        Some(path) => load_genesis_file(path)?,
        None => GenesisConfig::default(),
    };
    let mut state = genesis::build_state(&genesis_config).context("invalid genesis allocation")?;
    let block = genesis::block_context(&genesis_config, cli.block);

    let report = exec::execute(&mut state, &schedule, &registry, block, &request);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
