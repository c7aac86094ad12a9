//! Resource engine - per-tick growth and decay laws
//!
//! Recomputed every fast tick in a fixed order:
//! bandwidth -> influence -> risk -> energy (energy only on enabled tiers).
//!
//! Each stage reads what earlier stages wrote to the registry this tick.
//! Every value written back goes through the safety clamp.

use serde::{Deserialize, Serialize};

use crate::core::config::{InfluenceConfig, SimulationConfig};
use crate::core::types::{EffectChannel, ResourceId};
use crate::modifiers::{apply, apply_bool_or, Modifier, ModifierFrame, SourceTag};
use crate::network::NodeNetwork;
use crate::resources::momentum::RiskMomentum;
use crate::resources::registry::ResourceRegistry;
use crate::resources::safety::{clamp_finite, finite_or_zero};

/// Everything the engine reads besides the registry
pub struct EngineContext<'a> {
    pub config: &'a SimulationConfig,
    pub nodes: &'a NodeNetwork,
    pub frame: &'a ModifierFrame,
    pub influence_cap: f64,
    pub energy_enabled: bool,
    /// Capacitor bonus, applied to generation after the pipeline
    pub energy_gen_bonus: f64,
    pub maintenance_scalar: f64,
    pub regen_scalar: f64,
}

/// What happened inside one engine pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineReport {
    pub nodes_disabled: bool,
    pub influence_rate: f64,
    /// Risk added this tick by a fresh influence deficit
    pub desperation_spike: f64,
    pub risk_gain: f64,
    pub risk_decay: f64,
    pub energy_overloaded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceEngine {
    momentum: RiskMomentum,
    /// Set while the influence rate is negative; the spike fires on entry only
    #[serde(default)]
    desperate: bool,
    #[serde(default)]
    overloaded: bool,
}

impl ResourceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn momentum(&self) -> &RiskMomentum {
        &self.momentum
    }

    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    pub fn is_desperate(&self) -> bool {
        self.desperate
    }

    /// Drop the risk history after the risk constraint collapses
    pub fn reset_risk_history(&mut self) {
        self.momentum.reset();
        self.desperate = false;
    }

    pub fn reset_energy_history(&mut self) {
        self.overloaded = false;
    }

    pub fn tick(&mut self, ctx: &EngineContext<'_>, registry: &mut ResourceRegistry, delta: f64) -> EngineReport {
        let mut report = EngineReport {
            nodes_disabled: step_bandwidth(ctx, registry),
            ..EngineReport::default()
        };

        let (rate, spike) = self.step_influence(ctx, registry, delta);
        report.influence_rate = rate;
        report.desperation_spike = spike;

        let (gain, decay) = self.step_risk(ctx, registry, spike, delta);
        report.risk_gain = gain;
        report.risk_decay = decay;

        if ctx.energy_enabled {
            report.energy_overloaded = self.step_energy(ctx, registry, delta);
        } else {
            registry.set_per_second(ResourceId::Energy, 0.0);
            registry.set_per_second(ResourceId::EnergyOverload, 0.0);
            self.overloaded = false;
        }

        report
    }

    fn step_influence(&mut self, ctx: &EngineContext<'_>, registry: &mut ResourceRegistry, delta: f64) -> (f64, f64) {
        let cfg = &ctx.config.influence;
        let node_count = ctx.nodes.len() as f64;
        let bandwidth = registry.value(ResourceId::Bandwidth);

        let efficiency = apply(cfg.base_efficiency, ctx.frame.get(EffectChannel::Efficiency));
        let curve = global_efficiency_curve(node_count, cfg);
        let gross = (bandwidth * efficiency * curve).max(0.0);

        let maintenance = (cfg.maintenance_per_node * node_count
            + cfg.maintenance_per_level * ctx.nodes.levels_above_one() as f64)
            * ctx.maintenance_scalar;

        let rate = finite_or_zero(ResourceId::Influence, "influence_rate", gross - maintenance);

        let mut spike = 0.0;
        if rate < 0.0 {
            if !self.desperate {
                self.desperate = true;
                spike = -rate * cfg.desperation_risk_factor;
            }
        } else {
            self.desperate = false;
        }

        let current = registry.value(ResourceId::Influence);
        let cap = ctx.influence_cap.max(0.0);
        let value = clamp_finite(ResourceId::Influence, "influence", current + rate * delta, 0.0, cap);
        registry.set(ResourceId::Influence, value, rate);

        (rate, spike)
    }

    fn step_risk(&mut self, ctx: &EngineContext<'_>, registry: &mut ResourceRegistry, spike: f64, delta: f64) -> (f64, f64) {
        let cfg = &ctx.config.risk;
        let momentum_cfg = &ctx.config.momentum;

        let base_gain = base_risk_gain(ctx.nodes.len(), cfg.exponent, cfg.gain_per_node);

        let reduction = apply(0.0, ctx.frame.get(EffectChannel::RiskReduction));
        let reduction_factor = (1.0 - reduction).max(0.0);

        let mut gain_mods: Vec<Modifier> = ctx.frame.get(EffectChannel::RiskGain).to_vec();
        gain_mods.push(Modifier::multiplicative(
            self.momentum.gain_multiplier(momentum_cfg),
            SourceTag::Momentum,
        ));

        let mut gain = apply(base_gain * reduction_factor, &gain_mods).max(0.0);
        gain += ctx.nodes.degraded_count() as f64 * cfg.degraded_risk_per_node;
        let gain = finite_or_zero(ResourceId::DetectionRisk, "risk_gain", gain);

        let mut decay = apply(cfg.passive_decay, ctx.frame.get(EffectChannel::RiskDecay)).max(0.0);
        if self.momentum.is_falling() {
            decay *= 1.0 + momentum_cfg.falling_decay_boost;
        }
        let decay = finite_or_zero(ResourceId::DetectionRisk, "risk_decay", decay);

        let rate = gain - decay;
        let current = registry.value(ResourceId::DetectionRisk);
        let value = clamp_finite(
            ResourceId::DetectionRisk,
            "risk",
            current + rate * delta + spike,
            0.0,
            cfg.max,
        );
        registry.set(ResourceId::DetectionRisk, value, rate);
        self.momentum.update(rate, delta, momentum_cfg);

        (gain, decay)
    }

    fn step_energy(&mut self, ctx: &EngineContext<'_>, registry: &mut ResourceRegistry, delta: f64) -> bool {
        let cfg = &ctx.config.energy;

        let generation = apply(cfg.base_generation, ctx.frame.get(EffectChannel::EnergyGen))
            * (1.0 + ctx.energy_gen_bonus);
        let drain_per_node = apply(cfg.drain_per_node, ctx.frame.get(EffectChannel::EnergyDrain)).max(0.0);
        let drain = ctx.nodes.energy_drain(drain_per_node, cfg.level_drain_step);

        let rate = finite_or_zero(ResourceId::Energy, "energy_rate", generation - drain);
        self.overloaded = rate < 0.0;

        let current = registry.value(ResourceId::Energy);
        let value = clamp_finite(ResourceId::Energy, "energy", current + rate * delta, 0.0, f64::MAX);
        registry.set(ResourceId::Energy, value, rate);

        // Overload pressure builds with the deficit and bleeds off otherwise
        let pressure_rate = if self.overloaded {
            -rate * cfg.overload_gain
        } else {
            -cfg.overload_recovery * ctx.regen_scalar
        };
        let pressure_rate = finite_or_zero(ResourceId::EnergyOverload, "overload_rate", pressure_rate);
        let pressure = registry.value(ResourceId::EnergyOverload);
        let pressure = clamp_finite(
            ResourceId::EnergyOverload,
            "overload",
            pressure + pressure_rate * delta,
            0.0,
            cfg.overload_threshold.max(0.0),
        );
        registry.set(ResourceId::EnergyOverload, pressure, pressure_rate);

        self.overloaded
    }
}

/// Bandwidth stage. Returns true if a "nodes disabled" flag forced it to 0.
fn step_bandwidth(ctx: &EngineContext<'_>, registry: &mut ResourceRegistry) -> bool {
    if apply_bool_or(ctx.frame.get(EffectChannel::NodesDisabled)) {
        registry.set(ResourceId::Bandwidth, 0.0, 0.0);
        return true;
    }

    let raw = ctx.nodes.total_output(&ctx.config.nodes);
    let bandwidth = apply(raw, ctx.frame.get(EffectChannel::BwMultiplier)).max(0.0);
    let bandwidth = clamp_finite(
        ResourceId::Bandwidth,
        "bandwidth",
        bandwidth,
        0.0,
        ctx.config.bandwidth.max,
    );
    registry.set(ResourceId::Bandwidth, bandwidth, bandwidth);
    false
}

/// `1 / (1 + (n / softcap)^exponent)`, floored
pub fn global_efficiency_curve(node_count: f64, config: &InfluenceConfig) -> f64 {
    let ratio = node_count.max(0.0) / config.softcap;
    (1.0 / (1.0 + ratio.powf(config.curve_exponent))).max(config.curve_floor)
}

/// `node_count^exponent × gain_per_node`
pub fn base_risk_gain(node_count: usize, exponent: f64, gain_per_node: f64) -> f64 {
    if node_count == 0 {
        return 0.0;
    }
    (node_count as f64).powf(exponent) * gain_per_node
}
