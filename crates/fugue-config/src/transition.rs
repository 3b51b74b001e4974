//! Protocol transitions and the configuration predicate

use fugue_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named protocol upgrade, active at and after its activation block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Homestead: DELEGATECALL, legacy create carve-out removed
    Eip7,
    /// Gas cost increases for IO-heavy operations
    Eip150,
    /// Replay protection
    Eip155,
    /// State clearing: touched empty accounts, nonce 1 for new contracts
    Eip161Abc,
    /// State clearing: emptiness rule for account existence
    Eip161D,
    /// Contract code size limit
    Eip170,
    /// Big integer modular exponentiation
    Eip198,
    /// Bitwise shifting instructions
    Eip145,
    /// Net gas metering for SSTORE (Constantinople)
    Eip1283,
    /// Removal of EIP-1283 (Petersburg)
    Eip1283Disable,
    /// Repricing for trie-size-dependent opcodes
    Eip1884,
    /// Structured definitions for net gas metering
    Eip2200,
}

impl Transition {
    /// Every known transition in adoption order
    pub const ALL: [Transition; 12] = [
        Transition::Eip7,
        Transition::Eip150,
        Transition::Eip155,
        Transition::Eip161Abc,
        Transition::Eip161D,
        Transition::Eip170,
        Transition::Eip198,
        Transition::Eip145,
        Transition::Eip1283,
        Transition::Eip1283Disable,
        Transition::Eip1884,
        Transition::Eip2200,
    ];
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Eip7 => "EIP-7",
            Transition::Eip150 => "EIP-150",
            Transition::Eip155 => "EIP-155",
            Transition::Eip161Abc => "EIP-161abc",
            Transition::Eip161D => "EIP-161d",
            Transition::Eip170 => "EIP-170",
            Transition::Eip198 => "EIP-198",
            Transition::Eip145 => "EIP-145",
            Transition::Eip1283 => "EIP-1283",
            Transition::Eip1283Disable => "EIP-1283-disable",
            Transition::Eip1884 => "EIP-1884",
            Transition::Eip2200 => "EIP-2200",
        };
        f.write_str(name)
    }
}

/// Answers whether a transition is active at a given block height.
///
/// Implementations must be monotonic: once a transition is enabled it stays
/// enabled for every greater height.
pub trait ChainConfig {
    /// Whether `transition` is active at `block`
    fn is_enabled(&self, transition: Transition, block: BlockNumber) -> bool;
}

impl<T: ChainConfig + ?Sized> ChainConfig for &T {
    fn is_enabled(&self, transition: Transition, block: BlockNumber) -> bool {
        (**self).is_enabled(transition, block)
    }
}
