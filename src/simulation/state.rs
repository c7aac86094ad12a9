//! Simulation state - the single owned game state
//!
//! Everything the tick mutates lives here. External collaborators change it
//! only through the mutation methods below, between ticks. Every mutation
//! validates first and returns `ActionError` without touching state when the
//! request is refused.

use crate::analysis::{AdaptationReport, AdaptiveLoop, EquilibriumClassifier, EquilibriumState};
use crate::constraints::{CollapseMachine, Constraint, ConstraintSet};
use crate::core::config::SimulationConfig;
use crate::core::error::{ActionError, Result, UndernetError};
use crate::core::types::{
    ConstraintId, DistrictId, DoctrineId, EffectChannel, GameTime, NodeId, ResourceId, TierHandle,
    UpgradeId,
};
use crate::modifiers::{Modifier, ModifierBoard};
use crate::network::{upgrade_cost, Doctrine, Node, NodeNetwork, TierCatalog, TierDefinition, UpgradeLevels};
use crate::resources::safety::clamp_finite;
use crate::resources::{ResourceEngine, ResourceRegistry};
use crate::simulation::events::SimulationEvent;

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) config: SimulationConfig,
    pub(crate) tiers: TierCatalog,
    pub(crate) tier: TierHandle,
    /// Game time, advanced by scaled fast-tick deltas
    pub(crate) clock: GameTime,
    pub(crate) tick_count: u64,
    pub(crate) registry: ResourceRegistry,
    pub(crate) nodes: NodeNetwork,
    pub(crate) upgrades: UpgradeLevels,
    pub(crate) doctrine: DoctrineId,
    pub(crate) constraints: ConstraintSet,
    pub(crate) collapse: CollapseMachine,
    pub(crate) board: ModifierBoard,
    pub(crate) engine: ResourceEngine,
    pub(crate) equilibrium: EquilibriumClassifier,
    pub(crate) adaptive: AdaptiveLoop,
    /// Notifications raised by mutations; drained by the next tick
    pub(crate) pending_events: Vec<SimulationEvent>,
}

impl SimulationState {
    /// Fresh session state. Fails only if the config does not validate.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate().map_err(UndernetError::InvalidConfig)?;
        Ok(Self::build(config))
    }

    pub(crate) fn build(config: SimulationConfig) -> Self {
        let tiers = TierCatalog::new(config.tiers.clone());
        let tier = TierHandle::default();
        let energy_enabled = tier.0 >= config.energy.tier_threshold;

        let mut registry = ResourceRegistry::with_defaults();
        let cap = tiers.get(tier).influence_cap.max(0.0);
        registry.set_value(ResourceId::Influence, config.starting_influence.clamp(0.0, cap));

        Self {
            constraints: ConstraintSet::with_defaults(&config, energy_enabled),
            adaptive: AdaptiveLoop::new(&config.adaptive),
            tiers,
            tier,
            clock: 0.0,
            tick_count: 0,
            registry,
            nodes: NodeNetwork::new(),
            upgrades: UpgradeLevels::new(),
            doctrine: DoctrineId::default(),
            collapse: CollapseMachine::new(),
            board: ModifierBoard::new(),
            engine: ResourceEngine::new(),
            equilibrium: EquilibriumClassifier::new(),
            pending_events: Vec::new(),
            config,
        }
    }

    // === QUERIES ===

    pub fn get_resource(&self, id: ResourceId) -> f64 {
        self.registry.value(id)
    }

    pub fn get_per_second(&self, id: ResourceId) -> f64 {
        self.registry.per_second(id)
    }

    pub fn get_constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    pub fn is_in_equilibrium(&self) -> bool {
        self.equilibrium.is_in_equilibrium()
    }

    pub fn equilibrium(&self) -> &EquilibriumState {
        self.equilibrium.state()
    }

    pub fn get_adaptation_report(&self) -> AdaptationReport {
        self.adaptive.report()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> GameTime {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn nodes(&self) -> &NodeNetwork {
        &self.nodes
    }

    pub fn upgrades(&self) -> &UpgradeLevels {
        &self.upgrades
    }

    pub fn doctrine(&self) -> DoctrineId {
        self.doctrine
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn tier(&self) -> &TierDefinition {
        self.tiers.get(self.tier)
    }

    pub fn tier_handle(&self) -> TierHandle {
        self.tier
    }

    pub fn energy_enabled(&self) -> bool {
        self.tier.0 >= self.config.energy.tier_threshold
    }

    pub fn influence_cap(&self) -> f64 {
        self.tier().influence_cap.max(0.0)
    }

    pub fn total_collapses(&self) -> u64 {
        self.collapse.total()
    }

    pub fn board(&self) -> &ModifierBoard {
        &self.board
    }

    pub fn deploy_cost(&self) -> f64 {
        self.nodes.deploy_cost(&self.config.nodes)
    }

    // === MUTATIONS ===

    /// Externally supplied modifier slots (events, automation)
    pub fn board_mut(&mut self) -> &mut ModifierBoard {
        &mut self.board
    }

    pub fn push_modifier(&mut self, channel: EffectChannel, modifier: Modifier) {
        self.board.push(channel, modifier);
    }

    pub fn deploy_node(&mut self, district: Option<DistrictId>) -> std::result::Result<NodeId, ActionError> {
        let capacity = self.tier().node_capacity;
        if self.nodes.len() >= capacity {
            tracing::debug!(capacity, "deploy rejected: capacity reached");
            return Err(ActionError::CapacityReached { capacity });
        }
        self.spend(self.deploy_cost())?;

        let id = self.nodes.deploy(district);
        tracing::debug!(node = id.0, count = self.nodes.len(), "node deployed");
        Ok(id)
    }

    pub fn remove_node(&mut self, index: usize) -> std::result::Result<Node, ActionError> {
        let node = self.nodes.remove(index).ok_or(ActionError::NodeNotFound(index))?;
        tracing::debug!(node = node.id.0, index, "node removed");
        Ok(node)
    }

    /// Raise a node one level; returns the new level
    pub fn upgrade_node(&mut self, index: usize) -> std::result::Result<u8, ActionError> {
        let node = self.nodes.get(index).ok_or(ActionError::NodeNotFound(index))?;
        let level = node.level;
        if node.is_max_level() {
            return Err(ActionError::MaxLevel { index, level });
        }
        self.spend(upgrade_cost(level, &self.config.nodes))?;

        let node = self.nodes.get_mut(index).ok_or(ActionError::NodeNotFound(index))?;
        node.level += 1;
        Ok(node.level)
    }

    pub fn repair_node(&mut self, index: usize) -> std::result::Result<(), ActionError> {
        let degraded = self.nodes.get(index).ok_or(ActionError::NodeNotFound(index))?.degraded;
        if !degraded {
            return Err(ActionError::NotDegraded(index));
        }
        self.spend(self.config.nodes.repair_cost)?;

        let node = self.nodes.get_mut(index).ok_or(ActionError::NodeNotFound(index))?;
        node.degraded = false;
        node.degradation_timer = 0.0;
        Ok(())
    }

    pub fn switch_doctrine(&mut self, id: DoctrineId) -> std::result::Result<(), ActionError> {
        if self.doctrine == id {
            return Err(ActionError::AlreadyActive);
        }
        self.spend(Doctrine::get(id).switch_cost)?;

        tracing::debug!(from = self.doctrine.name(), to = id.name(), "doctrine switched");
        self.doctrine = id;
        Ok(())
    }

    /// Buy the next level of an upgrade track; returns the new level
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> std::result::Result<u32, ActionError> {
        if self.upgrades.is_maxed(id, &self.config.upgrades) {
            return Err(ActionError::UpgradeMaxed);
        }
        self.spend(self.upgrades.next_cost(id, &self.config.upgrades))?;

        let level = self.upgrades.level(id) + 1;
        self.upgrades.set_level(id, level);
        tracing::debug!(upgrade = id.name(), level, "upgrade purchased");
        Ok(level)
    }

    pub fn set_constraint_active(&mut self, id: ConstraintId, active: bool) -> std::result::Result<(), ActionError> {
        self.constraints.set_active(id, active)
    }

    /// Write a resource value directly, clamped into its valid range
    ///
    /// The only way thermal load changes. Returns the value actually stored.
    pub fn set_resource(&mut self, id: ResourceId, value: f64) -> f64 {
        let (lo, hi) = self.resource_bounds(id);
        let value = clamp_finite(id, "set_resource", value, lo, hi);
        self.registry.set_value(id, value);
        self.pending_events
            .push(SimulationEvent::ResourceChanged { resource: id, value });
        value
    }

    pub fn set_district_load(&mut self, district: DistrictId, multiplier: f64) -> bool {
        let accepted = self.nodes.set_district_load(district, multiplier);
        if !accepted {
            tracing::debug!(district = district.0, multiplier, "district load rejected");
        }
        accepted
    }

    pub fn set_tier(&mut self, name: &str) -> std::result::Result<(), ActionError> {
        let handle = self
            .tiers
            .resolve(name)
            .ok_or_else(|| ActionError::UnknownIdentifier(name.to_string()))?;
        self.enter_tier(handle);
        Ok(())
    }

    // === INTERNAL ===

    pub(crate) fn resource_bounds(&self, id: ResourceId) -> (f64, f64) {
        match id {
            ResourceId::Influence => (0.0, self.influence_cap()),
            ResourceId::DetectionRisk => (0.0, self.config.risk.max),
            ResourceId::Bandwidth => (0.0, self.config.bandwidth.max),
            ResourceId::EnergyOverload => (0.0, self.config.energy.overload_threshold.max(0.0)),
            ResourceId::ThermalLoad => (0.0, self.config.thermal.max.max(0.0)),
            ResourceId::Energy => (0.0, f64::MAX),
        }
    }

    /// Switch tiers, re-gating energy and clamping influence to the new cap
    pub(crate) fn enter_tier(&mut self, handle: TierHandle) {
        if handle == self.tier {
            return;
        }
        let from = self.tier().name.clone();
        self.tier = handle;
        let to = self.tier().name.clone();

        let cap = self.influence_cap();
        if self.registry.value(ResourceId::Influence) > cap {
            self.registry.set_value(ResourceId::Influence, cap);
        }

        let energy = self.energy_enabled();
        if let Err(err) = self.constraints.set_active(ConstraintId::Energy, energy) {
            tracing::debug!(%err, "energy constraint not re-gated");
        }

        tracing::info!(%from, %to, energy, "tier changed");
        self.pending_events.push(SimulationEvent::TierChanged { from, to });
    }

    fn spend(&mut self, cost: f64) -> std::result::Result<(), ActionError> {
        let available = self.registry.value(ResourceId::Influence);
        if cost > available {
            tracing::debug!(needed = cost, available, "request rejected: insufficient influence");
            return Err(ActionError::InsufficientInfluence {
                needed: cost,
                available,
            });
        }
        self.registry.set_value(ResourceId::Influence, available - cost.max(0.0));
        Ok(())
    }

    pub(crate) fn take_pending_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::build(SimulationConfig::default())
    }
}
