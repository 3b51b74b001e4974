//! Transition activation table

use crate::error::{ConfigError, ConfigResult};
use crate::transition::{ChainConfig, Transition};
use fugue_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activation block per transition. Transitions missing from the table are
/// never enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForkSchedule {
    transitions: BTreeMap<Transition, BlockNumber>,
}

impl ForkSchedule {
    /// Empty schedule: every block runs Frontier rules
    pub fn frontier() -> Self {
        Self::default()
    }

    /// Ethereum foundation mainnet activation heights up to Istanbul
    pub fn foundation() -> Self {
        Self::frontier()
            .with(Transition::Eip7, 1_150_000)
            .with(Transition::Eip150, 2_463_000)
            .with(Transition::Eip155, 2_675_000)
            .with(Transition::Eip161Abc, 2_675_000)
            .with(Transition::Eip161D, 2_675_000)
            .with(Transition::Eip170, 2_675_000)
            .with(Transition::Eip198, 4_370_000)
            .with(Transition::Eip145, 7_280_000)
            .with(Transition::Eip1283, 7_280_000)
            .with(Transition::Eip1283Disable, 7_280_000)
            .with(Transition::Eip1884, 9_069_000)
            .with(Transition::Eip2200, 9_069_000)
    }

    /// Every known transition active from genesis
    pub fn all_from_genesis() -> Self {
        Transition::ALL
            .iter()
            .fold(Self::frontier(), |schedule, t| schedule.with(*t, 0))
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> ConfigResult<Self> {
        match name {
            "frontier" => Ok(Self::frontier()),
            "foundation" | "mainnet" => Ok(Self::foundation()),
            "dev" => Ok(Self::all_from_genesis()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Builder-style activation
    pub fn with(mut self, transition: Transition, block: BlockNumber) -> Self {
        self.set(transition, block);
        self
    }

    /// Set the activation block of a transition
    pub fn set(&mut self, transition: Transition, block: BlockNumber) {
        self.transitions.insert(transition, block);
    }

    /// Remove a transition so it is never enabled
    pub fn disable(&mut self, transition: Transition) {
        self.transitions.remove(&transition);
    }

    /// Activation block of a transition, if scheduled
    pub fn activation(&self, transition: Transition) -> Option<BlockNumber> {
        self.transitions.get(&transition).copied()
    }

    /// Merge `other` on top of this schedule
    pub fn merge(&mut self, other: &ForkSchedule) {
        for (transition, block) in &other.transitions {
            self.transitions.insert(*transition, *block);
        }
    }
}

impl ChainConfig for ForkSchedule {
    fn is_enabled(&self, transition: Transition, block: BlockNumber) -> bool {
        self.activation(transition)
            .map(|activation| block >= activation)
            .unwrap_or(false)
    }
}
