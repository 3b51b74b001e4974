//! # fugue-crypto
//!
//! Hashing primitives for the Fugue ledger.
//!
//! - Keccak-256 hashing
//! - Contract address derivation (CREATE / CREATE2)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;
mod address;

pub use hash::{keccak256, EMPTY_CODE_HASH};
pub use address::{create_address, create2_address};
