//! Execution revision resolution

use crate::transition::{ChainConfig, Transition};
use fugue_primitives::BlockNumber;
use std::fmt;

/// Execution semantics version handed to the engine, ordered by adoption
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Revision {
    /// Frontier
    Frontier = 0,
    /// Homestead
    Homestead = 1,
    /// Tangerine Whistle
    TangerineWhistle = 2,
    /// Spurious Dragon
    SpuriousDragon = 3,
    /// Byzantium
    Byzantium = 4,
    /// Constantinople
    Constantinople = 5,
    /// Petersburg
    Petersburg = 6,
    /// Istanbul
    Istanbul = 7,
}

impl Revision {
    /// The most recent revision known to this build
    pub const LATEST: Revision = Revision::Istanbul;
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::TangerineWhistle => "Tangerine Whistle",
            Revision::SpuriousDragon => "Spurious Dragon",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "Petersburg",
            Revision::Istanbul => "Istanbul",
        };
        f.write_str(name)
    }
}

// One indicative transition per revision, newest first. Upgrades are
// cumulative, so the first enabled marker decides.
const REVISION_MARKERS: [(Transition, Revision); 7] = [
    (Transition::Eip1884, Revision::Istanbul),
    (Transition::Eip1283Disable, Revision::Petersburg),
    (Transition::Eip145, Revision::Constantinople),
    (Transition::Eip198, Revision::Byzantium),
    (Transition::Eip155, Revision::SpuriousDragon),
    (Transition::Eip150, Revision::TangerineWhistle),
    (Transition::Eip7, Revision::Homestead),
];

/// Resolve the revision in effect at `block`.
///
/// Inconsistent configurations (a later marker enabled without an earlier
/// one) still resolve to the highest enabled marker.
pub fn resolve_revision<C: ChainConfig + ?Sized>(config: &C, block: BlockNumber) -> Revision {
    REVISION_MARKERS
        .iter()
        .find(|(transition, _)| config.is_enabled(*transition, block))
        .map(|(_, revision)| *revision)
        .unwrap_or(Revision::Frontier)
}
