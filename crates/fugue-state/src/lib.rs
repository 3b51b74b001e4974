//! # fugue-state
//!
//! State accessor for the Fugue ledger.
//!
//! This crate provides:
//! - The `StateDb` trait consumed by the execution bridge
//! - `MemoryStateDb`, a hash-map backed implementation with snapshots,
//!   committed storage, refund counter and log sequence

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod memory;
mod traits;

pub use error::{StateError, StateResult};
pub use memory::MemoryStateDb;
pub use traits::{Account, Log, StateDb};
pub use fugue_crypto::EMPTY_CODE_HASH;
