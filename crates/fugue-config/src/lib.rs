//! # fugue-config
//!
//! Fork-aware chain configuration for the Fugue ledger.
//!
//! This crate provides:
//! - The `ChainConfig` predicate (`is_enabled(transition, block)`)
//! - `ForkSchedule`, a serde-friendly transition table with presets
//! - Revision resolution from enabled transitions
//! - Protocol gas and refund parameters

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod revision;
mod schedule;
mod transition;

pub mod params;

pub use error::{ConfigError, ConfigResult};
pub use revision::{resolve_revision, Revision};
pub use schedule::ForkSchedule;
pub use transition::{ChainConfig, Transition};
