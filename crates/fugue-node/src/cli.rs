//! CLI argument parsing for fugue-node

use clap::Parser;
use std::path::PathBuf;

/// Fugue ledger node
#[derive(Parser, Debug, Clone)]
#[command(name = "fugue-node")]
#[command(about = "Fugue ledger node: loads execution engines and runs messages against them")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// EVM engine, as path[,name=value...] (overrides vm.evm)
    #[arg(long)]
    pub vm_evm: Option<String>,

    /// ewasm engine, as path[,name=value...] (overrides vm.ewasm)
    #[arg(long)]
    pub vm_ewasm: Option<String>,

    /// Block height to resolve the revision for and execute at
    #[arg(long, default_value = "0")]
    pub block: u64,

    /// Genesis allocation file (JSON)
    #[arg(long)]
    pub genesis: Option<PathBuf>,

    /// Run one message call to this address
    #[arg(long)]
    pub call: Option<String>,

    /// Sender of the message call
    #[arg(long)]
    pub from: Option<String>,

    /// Call data (hex)
    #[arg(long, default_value = "")]
    pub input: String,

    /// Gas for the message call
    #[arg(long, default_value = "10000000")]
    pub gas: u64,

    /// Value in wei (decimal or 0x hex)
    #[arg(long, default_value = "0")]
    pub value: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
