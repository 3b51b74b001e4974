//! # fugue-primitives
//!
//! Primitive types for the Fugue ledger.
//!
//! This crate provides the fundamental data types shared by the state
//! accessor, the fork configuration and the execution bridge.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;
mod error;

pub use address::{Address, AddressError};
pub use hash::{Hash, HashError, H256};
pub use error::PrimitiveError;

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Block height type
pub type BlockNumber = u64;

/// Gas type
pub type Gas = u64;
