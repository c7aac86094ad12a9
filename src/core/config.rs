//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section deserializes with
//! `#[serde(default)]`, so a TOML file only needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, UndernetError};
use crate::network::tiers::TierDefinition;

/// Configuration for the simulation systems
///
/// These values have been tuned so an unattended network drifts toward a
/// collapse in roughly ten minutes of game time. Changing them will affect
/// pacing and feel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Influence granted at session start (enough for the first two nodes)
    pub starting_influence: f64,
    pub scheduler: SchedulerConfig,
    pub nodes: NodeConfig,
    pub bandwidth: BandwidthConfig,
    pub influence: InfluenceConfig,
    pub risk: RiskConfig,
    pub momentum: MomentumConfig,
    pub energy: EnergyConfig,
    pub thermal: ThermalConfig,
    pub upgrades: UpgradeConfig,
    pub equilibrium: EquilibriumConfig,
    pub adaptive: AdaptiveConfig,
    /// Ordered tier ladder; index 0 is the starting tier
    pub tiers: Vec<TierDefinition>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_influence: 25.0,
            scheduler: SchedulerConfig::default(),
            nodes: NodeConfig::default(),
            bandwidth: BandwidthConfig::default(),
            influence: InfluenceConfig::default(),
            risk: RiskConfig::default(),
            momentum: MomentumConfig::default(),
            energy: EnergyConfig::default(),
            thermal: ThermalConfig::default(),
            upgrades: UpgradeConfig::default(),
            equilibrium: EquilibriumConfig::default(),
            adaptive: AdaptiveConfig::default(),
            tiers: TierDefinition::default_ladder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Lowest accepted speed multiplier; anything below is raised to this
    pub min_speed: f64,
    /// Highest accepted speed multiplier
    pub max_speed: f64,
    /// Real seconds between slow ticks
    pub slow_tick_interval: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_speed: 0.1,
            max_speed: 16.0,
            slow_tick_interval: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Bandwidth produced by a level-1 node
    pub base_output: f64,
    /// Output multiplier per level above 1 (level 5 = base × 1.5^4 ≈ 5×)
    pub level_output_multiplier: f64,
    /// Output factor applied while a node is degraded
    pub degraded_output_factor: f64,
    /// Seconds of wear before a node degrades
    pub degradation_period: f64,
    /// Extra wear per level above 1; high-level nodes degrade sooner
    pub wear_per_level: f64,
    pub deploy_base_cost: f64,
    /// Deploy cost grows geometrically with the number of deployed nodes
    pub deploy_cost_growth: f64,
    /// Upgrade cost is `upgrade_base_cost × current level`
    pub upgrade_base_cost: f64,
    pub repair_cost: f64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_output: 1.0,
            level_output_multiplier: 1.5,
            degraded_output_factor: 0.5,
            degradation_period: 120.0,
            wear_per_level: 0.25,
            deploy_base_cost: 10.0,
            deploy_cost_growth: 1.15,
            upgrade_base_cost: 25.0,
            repair_cost: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthConfig {
    /// Safety range upper bound; bandwidth is clamped into [0, max]
    pub max: f64,
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self { max: 10_000.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceConfig {
    /// Influence per unit of bandwidth before modifiers
    pub base_efficiency: f64,
    /// Node count at which the global efficiency curve reaches 0.5
    pub softcap: f64,
    /// Steepness of the efficiency falloff past the softcap
    pub curve_exponent: f64,
    /// The curve never drops below this, so large networks still earn
    pub curve_floor: f64,
    /// Upkeep per deployed node per second
    pub maintenance_per_node: f64,
    /// Additional upkeep per node level above 1 per second
    pub maintenance_per_level: f64,
    /// Risk added once per deficit episode, per unit of negative rate
    pub desperation_risk_factor: f64,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            base_efficiency: 1.0,
            softcap: 25.0,
            curve_exponent: 1.5,
            curve_floor: 0.2,
            maintenance_per_node: 0.05,
            maintenance_per_level: 0.02,
            desperation_risk_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Superlinear scaling of risk gain with node count
    ///
    /// At 1.12, doubling the network raises base gain by ~2.17×.
    pub exponent: f64,
    pub gain_per_node: f64,
    /// Risk removed per second with no modifiers
    pub passive_decay: f64,
    /// Flat risk per second added by each degraded node
    pub degraded_risk_per_node: f64,
    /// Upper clamp for the risk value
    pub max: f64,
    /// Risk value at which the risk constraint collapses
    pub collapse_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            exponent: 1.12,
            gain_per_node: 0.02,
            passive_decay: 0.05,
            degraded_risk_per_node: 0.05,
            max: 100.0,
            collapse_threshold: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Exponential smoothing rate (per second) of the risk rate
    pub smoothing: f64,
    /// Risk-gain multiplier grows by this per unit of positive momentum
    pub gain_scale: f64,
    /// Ceiling for the momentum risk-gain multiplier
    pub max_gain_multiplier: f64,
    /// Decay is multiplied by (1 + boost) while risk is falling
    pub falling_decay_boost: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.5,
            gain_scale: 0.25,
            max_gain_multiplier: 1.5,
            falling_decay_boost: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// First tier index (0-based) at which the energy resource is simulated
    pub tier_threshold: usize,
    pub base_generation: f64,
    pub drain_per_node: f64,
    /// Drain grows by this fraction per node level above 1
    pub level_drain_step: f64,
    /// Overload pressure gained per unit of deficit per second
    pub overload_gain: f64,
    /// Overload pressure shed per second while not overloaded
    pub overload_recovery: f64,
    /// Overload value at which the energy constraint collapses
    pub overload_threshold: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            tier_threshold: 1,
            base_generation: 3.0,
            drain_per_node: 0.4,
            level_drain_step: 0.25,
            overload_gain: 1.0,
            overload_recovery: 2.0,
            overload_threshold: 100.0,
        }
    }
}

/// Thermal load has no built-in law; these only bound the slot and its collapse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Upper bound for values written through `set_resource`
    pub max: f64,
    /// Meltdown fires when thermal load reaches this (while the slot is active)
    pub collapse_threshold: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            collapse_threshold: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub base_cost: f64,
    /// Cost of level n+1 is `base_cost × cost_growth^n`
    pub cost_growth: f64,
    pub max_level: u32,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            base_cost: 30.0,
            cost_growth: 1.6,
            max_level: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumConfig {
    /// Duration of the rolling risk sample window (seconds)
    pub window_seconds: f64,
    /// First derivative above this, combined with chaos, is a collapse trajectory
    pub threshold_rise: f64,
    /// |second derivative| above this is chaotic
    pub chaos_threshold: f64,
    /// |first derivative| below this is stable
    pub stable_max: f64,
    /// |first derivative| below this (and above stable_max) is meta-stable
    pub meta_stable_max: f64,
    /// Allowed risk drift around the baseline
    pub risk_tolerance: f64,
    /// Allowed influence-rate drift around the baseline
    pub influence_rate_tolerance: f64,
    /// Seconds inside both bands before equilibrium is declared
    pub sustain_seconds: f64,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            window_seconds: 10.0,
            threshold_rise: 0.5,
            chaos_threshold: 0.2,
            stable_max: 0.05,
            meta_stable_max: 0.3,
            risk_tolerance: 2.0,
            influence_rate_tolerance: 0.5,
            sustain_seconds: 30.0,
        }
    }
}

/// Linear function of the adaptation level, clamped to a safe range
///
/// `value = 1 + slope × (level − 1)`, so every scalar is exactly 1.0 at the
/// neutral adaptation level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange {
    pub slope: f64,
    pub min: f64,
    pub max: f64,
}

impl ScalarRange {
    pub fn evaluate(&self, adaptation_level: f64) -> f64 {
        (1.0 + self.slope * (adaptation_level - 1.0)).clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Duration of the performance sample window (seconds)
    pub window_seconds: f64,
    /// Influence rate that normalizes to 1.0
    pub influence_rate_reference: f64,
    pub influence_weight: f64,
    pub safety_weight: f64,
    /// Skill target reduction per collapse inside the memory window
    pub collapse_penalty: f64,
    pub collapse_memory_seconds: f64,
    /// Lerp rate (per second) of skill toward its target
    pub skill_smoothing: f64,
    /// Lerp rate (per second) of adaptation level toward its target
    pub adaptation_smoothing: f64,
    pub initial_skill: f64,
    pub skill_min: f64,
    pub skill_max: f64,
    pub level_min: f64,
    pub level_max: f64,
    pub risk_gain: ScalarRange,
    pub event_frequency: ScalarRange,
    pub maintenance_cost: ScalarRange,
    /// Negative slope: harder play regenerates constraints more slowly
    pub constraint_regen: ScalarRange,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60.0,
            influence_rate_reference: 5.0,
            influence_weight: 0.6,
            safety_weight: 0.4,
            collapse_penalty: 0.15,
            collapse_memory_seconds: 300.0,
            skill_smoothing: 0.05,
            adaptation_smoothing: 0.02,
            initial_skill: 0.5,
            skill_min: 0.0,
            skill_max: 1.0,
            level_min: 0.5,
            level_max: 1.5,
            risk_gain: ScalarRange { slope: 0.5, min: 0.75, max: 1.35 },
            event_frequency: ScalarRange { slope: 0.6, min: 0.7, max: 1.5 },
            maintenance_cost: ScalarRange { slope: 0.4, min: 0.8, max: 1.3 },
            constraint_regen: ScalarRange { slope: -0.4, min: 0.75, max: 1.25 },
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML config and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(UndernetError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a TOML config from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    ///
    /// Every bound that later feeds a clamp must be finite and ordered;
    /// comparisons are written so NaN fails them.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tiers.is_empty() {
            return Err("at least one tier must be defined".into());
        }
        for tier in &self.tiers {
            check_non_negative(&format!("tiers.{}.influence_cap", tier.name), tier.influence_cap)?;
        }
        check_non_negative("starting_influence", self.starting_influence)?;

        let eq = &self.equilibrium;
        if !(eq.stable_max < eq.meta_stable_max) {
            return Err(format!(
                "equilibrium.stable_max ({}) should be < meta_stable_max ({})",
                eq.stable_max, eq.meta_stable_max
            ));
        }
        check_positive("equilibrium.window_seconds", eq.window_seconds)?;
        check_positive("equilibrium.sustain_seconds", eq.sustain_seconds)?;

        let ad = &self.adaptive;
        check_positive("adaptive.window_seconds", ad.window_seconds)?;
        check_range("adaptive.skill", ad.skill_min, ad.skill_max)?;
        check_range("adaptive.level", ad.level_min, ad.level_max)?;
        if !ad.initial_skill.is_finite() {
            return Err("adaptive.initial_skill must be finite".into());
        }
        for (name, range) in [
            ("risk_gain", ad.risk_gain),
            ("event_frequency", ad.event_frequency),
            ("maintenance_cost", ad.maintenance_cost),
            ("constraint_regen", ad.constraint_regen),
        ] {
            if !range.slope.is_finite() {
                return Err(format!("adaptive.{}.slope must be finite", name));
            }
            check_range(&format!("adaptive.{}", name), range.min, range.max)?;
        }

        check_range("scheduler.speed", self.scheduler.min_speed, self.scheduler.max_speed)?;
        check_positive("scheduler.min_speed", self.scheduler.min_speed)?;
        check_positive("scheduler.slow_tick_interval", self.scheduler.slow_tick_interval)?;

        check_positive("influence.softcap", self.influence.softcap)?;
        check_non_negative("bandwidth.max", self.bandwidth.max)?;
        check_non_negative("risk.max", self.risk.max)?;
        check_non_negative("energy.overload_threshold", self.energy.overload_threshold)?;
        check_non_negative("thermal.max", self.thermal.max)?;
        check_non_negative("thermal.collapse_threshold", self.thermal.collapse_threshold)?;
        if !(self.risk.collapse_threshold <= self.risk.max) {
            return Err(format!(
                "risk.collapse_threshold ({}) can never be reached with risk.max ({})",
                self.risk.collapse_threshold, self.risk.max
            ));
        }
        if !(self.thermal.collapse_threshold <= self.thermal.max) {
            return Err(format!(
                "thermal.collapse_threshold ({}) can never be reached with thermal.max ({})",
                self.thermal.collapse_threshold, self.thermal.max
            ));
        }

        Ok(())
    }
}

// === VALIDATION HELPERS ===

fn check_range(name: &str, lo: f64, hi: f64) -> std::result::Result<(), String> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Ok(())
    } else {
        Err(format!("{} range [{}, {}] must be finite with min <= max", name, lo, hi))
    }
}

fn check_positive(name: &str, value: f64) -> std::result::Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} ({}) must be positive", name, value))
    }
}

fn check_non_negative(name: &str, value: f64) -> std::result::Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{} ({}) must be finite and >= 0", name, value))
    }
}
