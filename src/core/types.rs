//! Core type definitions used throughout the codebase
//!
//! Every identifier the simulation knows at compile time is a closed enum.
//! String names exist only for data files and the shell; they are resolved
//! once through `FromStr` and never looked up on the hot path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::UndernetError;

/// Simulated seconds since session start (sum of scaled fast-tick deltas)
pub type GameTime = f64;

/// Tracked quantities held in the resource registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceId {
    Bandwidth,
    Influence,
    DetectionRisk,
    Energy,
    /// Accumulated pressure while energy generation runs below drain
    EnergyOverload,
    /// Externally driven slot, no built-in formula
    ThermalLoad,
}

impl ResourceId {
    pub const ALL: [ResourceId; 6] = [
        ResourceId::Bandwidth,
        ResourceId::Influence,
        ResourceId::DetectionRisk,
        ResourceId::Energy,
        ResourceId::EnergyOverload,
        ResourceId::ThermalLoad,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bandwidth => "bandwidth",
            Self::Influence => "influence",
            Self::DetectionRisk => "detection_risk",
            Self::Energy => "energy",
            Self::EnergyOverload => "energy_overload",
            Self::ThermalLoad => "thermal_load",
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceId {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bandwidth" | "bw" => Ok(Self::Bandwidth),
            "influence" => Ok(Self::Influence),
            "detection_risk" | "risk" | "dr" => Ok(Self::DetectionRisk),
            "energy" => Ok(Self::Energy),
            "energy_overload" => Ok(Self::EnergyOverload),
            "thermal_load" | "thermal" => Ok(Self::ThermalLoad),
            _ => Err(UndernetError::unknown("resource", s)),
        }
    }
}

/// Registered constraint slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintId {
    Risk,
    Energy,
    Thermal,
}

impl ConstraintId {
    pub const ALL: [ConstraintId; 3] = [ConstraintId::Risk, ConstraintId::Energy, ConstraintId::Thermal];

    /// Resource the constraint is synced from every tick
    pub fn backing_resource(&self) -> ResourceId {
        match self {
            Self::Risk => ResourceId::DetectionRisk,
            Self::Energy => ResourceId::EnergyOverload,
            Self::Thermal => ResourceId::ThermalLoad,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Energy => "energy",
            Self::Thermal => "thermal",
        }
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConstraintId {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk" | "detection_risk" => Ok(Self::Risk),
            "energy" | "energy_overload" => Ok(Self::Energy),
            "thermal" | "thermal_load" => Ok(Self::Thermal),
            _ => Err(UndernetError::unknown("constraint", s)),
        }
    }
}

/// Kind of reset executed when a constraint crosses its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseType {
    /// Detection risk maxed out: the network is burned
    SoftReset,
    /// Energy overload: grid browns out
    Blackout,
    /// Thermal runaway
    Meltdown,
}

impl FromStr for CollapseType {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soft_reset" => Ok(Self::SoftReset),
            "blackout" => Ok(Self::Blackout),
            "meltdown" => Ok(Self::Meltdown),
            _ => Err(UndernetError::unknown("collapse type", s)),
        }
    }
}

/// Global strategy, exactly one active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctrineId {
    #[default]
    Balanced,
    Aggressive,
    Stealth,
    Efficient,
}

impl DoctrineId {
    pub const ALL: [DoctrineId; 4] = [
        DoctrineId::Balanced,
        DoctrineId::Aggressive,
        DoctrineId::Stealth,
        DoctrineId::Efficient,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Stealth => "stealth",
            Self::Efficient => "efficient",
        }
    }
}

impl FromStr for DoctrineId {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DoctrineId::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| UndernetError::unknown("doctrine", s))
    }
}

/// Purchasable upgrade tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    Compression,
    Encryption,
    Scrubbers,
    Routing,
    Capacitors,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 5] = [
        UpgradeId::Compression,
        UpgradeId::Encryption,
        UpgradeId::Scrubbers,
        UpgradeId::Routing,
        UpgradeId::Capacitors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Compression => "compression",
            Self::Encryption => "encryption",
            Self::Scrubbers => "scrubbers",
            Self::Routing => "routing",
            Self::Capacitors => "capacitors",
        }
    }
}

impl FromStr for UpgradeId {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpgradeId::ALL
            .into_iter()
            .find(|u| u.name() == s)
            .ok_or_else(|| UndernetError::unknown("upgrade", s))
    }
}

/// Well-known modifier slots external systems write into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectChannel {
    BwMultiplier,
    Efficiency,
    RiskReduction,
    RiskDecay,
    RiskGain,
    EnergyGen,
    EnergyDrain,
    NodesDisabled,
}

impl EffectChannel {
    pub const ALL: [EffectChannel; 8] = [
        EffectChannel::BwMultiplier,
        EffectChannel::Efficiency,
        EffectChannel::RiskReduction,
        EffectChannel::RiskDecay,
        EffectChannel::RiskGain,
        EffectChannel::EnergyGen,
        EffectChannel::EnergyDrain,
        EffectChannel::NodesDisabled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BwMultiplier => "bw_multiplier",
            Self::Efficiency => "efficiency",
            Self::RiskReduction => "risk_reduction",
            Self::RiskDecay => "risk_decay",
            Self::RiskGain => "risk_gain",
            Self::EnergyGen => "energy_gen",
            Self::EnergyDrain => "energy_drain",
            Self::NodesDisabled => "nodes_disabled",
        }
    }
}

impl FromStr for EffectChannel {
    type Err = UndernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectChannel::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UndernetError::unknown("effect channel", s))
    }
}

/// Stable identifier of a deployed node (indices shift on removal, ids don't)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// District a node is deployed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DistrictId(pub u32);

/// Resolved handle into the tier catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TierHandle(pub usize);
