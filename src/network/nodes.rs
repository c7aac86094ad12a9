//! Deployed nodes - the production units behind bandwidth, risk and energy
//!
//! Nodes are stored in deployment order. Indices are what the player sees and
//! shift on removal; `NodeId`s are stable for the life of a node.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::NodeConfig;
use crate::core::types::{DistrictId, NodeId};

pub const MIN_NODE_LEVEL: u8 = 1;
pub const MAX_NODE_LEVEL: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// 1..=5
    pub level: u8,
    #[serde(default)]
    pub district: Option<DistrictId>,
    #[serde(default)]
    pub degraded: bool,
    /// Seconds of wear accumulated toward the next degradation
    #[serde(default)]
    pub degradation_timer: f64,
}

impl Node {
    pub fn new(id: NodeId, district: Option<DistrictId>) -> Self {
        Self {
            id,
            level: MIN_NODE_LEVEL,
            district,
            degraded: false,
            degradation_timer: 0.0,
        }
    }

    /// Bandwidth this node contributes before modifiers
    pub fn output(&self, config: &NodeConfig) -> f64 {
        let levels_above_one = self.level.saturating_sub(MIN_NODE_LEVEL) as i32;
        let output = config.base_output * config.level_output_multiplier.powi(levels_above_one);
        if self.degraded {
            output * config.degraded_output_factor
        } else {
            output
        }
    }

    /// Wear accumulated per second
    pub fn wear_rate(&self, config: &NodeConfig) -> f64 {
        1.0 + config.wear_per_level * self.level.saturating_sub(MIN_NODE_LEVEL) as f64
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_NODE_LEVEL
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeNetwork {
    nodes: Vec<Node>,
    next_id: u32,
    /// Load multipliers supplied by the district layer; not persisted
    #[serde(skip)]
    district_loads: AHashMap<DistrictId, f64>,
}

impl NodeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted nodes, repairing out-of-range fields
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut network = Self::new();
        for mut node in nodes {
            node.level = node.level.clamp(MIN_NODE_LEVEL, MAX_NODE_LEVEL);
            if !node.degradation_timer.is_finite() || node.degradation_timer < 0.0 {
                node.degradation_timer = 0.0;
            }
            network.next_id = network.next_id.max(node.id.0.saturating_add(1));
            network.nodes.push(node);
        }
        network
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// Append a level-1 node. Capacity and cost are the caller's business.
    pub(crate) fn deploy(&mut self, district: Option<DistrictId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.nodes.push(Node::new(id, district));
        id
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Node> {
        if index < self.nodes.len() {
            Some(self.nodes.remove(index))
        } else {
            None
        }
    }

    /// Remove every node, returning how many were removed
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.nodes.len();
        self.nodes.clear();
        count
    }

    pub fn total_output(&self, config: &NodeConfig) -> f64 {
        self.nodes.iter().map(|n| n.output(config)).sum()
    }

    pub fn degraded_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.degraded).count()
    }

    /// Sum of (level − 1) across all nodes
    pub fn levels_above_one(&self) -> u32 {
        self.nodes
            .iter()
            .map(|n| n.level.saturating_sub(MIN_NODE_LEVEL) as u32)
            .sum()
    }

    /// Σ drain_per_node × level effect × district load
    pub fn energy_drain(&self, drain_per_node: f64, level_drain_step: f64) -> f64 {
        self.nodes
            .iter()
            .map(|n| {
                let level_effect = 1.0 + level_drain_step * n.level.saturating_sub(MIN_NODE_LEVEL) as f64;
                let load = n.district.map(|d| self.district_load(d)).unwrap_or(1.0);
                drain_per_node * level_effect * load
            })
            .sum()
    }

    pub fn district_load(&self, district: DistrictId) -> f64 {
        self.district_loads.get(&district).copied().unwrap_or(1.0)
    }

    /// Returns false (and changes nothing) for a non-finite or negative load
    pub fn set_district_load(&mut self, district: DistrictId, multiplier: f64) -> bool {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return false;
        }
        self.district_loads.insert(district, multiplier);
        true
    }

    /// Advance wear; returns ids of nodes that degraded this tick
    pub fn advance_wear(&mut self, delta: f64, config: &NodeConfig) -> Vec<NodeId> {
        let mut degraded = Vec::new();
        if config.degradation_period <= 0.0 {
            return degraded;
        }

        for node in self.nodes.iter_mut().filter(|n| !n.degraded) {
            node.degradation_timer += delta * node.wear_rate(config);
            if node.degradation_timer >= config.degradation_period {
                node.degraded = true;
                node.degradation_timer = 0.0;
                degraded.push(node.id);
            }
        }

        degraded
    }

    /// Influence needed to deploy the next node
    pub fn deploy_cost(&self, config: &NodeConfig) -> f64 {
        config.deploy_base_cost * config.deploy_cost_growth.powi(self.nodes.len() as i32)
    }
}

/// Influence needed to raise a node from `level` to `level + 1`
pub fn upgrade_cost(level: u8, config: &NodeConfig) -> f64 {
    config.upgrade_base_cost * level as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_scales_with_level_and_degradation() {
        let config = NodeConfig::default();
        let mut node = Node::new(NodeId(0), None);
        assert_eq!(node.output(&config), 1.0);

        node.level = 3;
        assert!((node.output(&config) - 2.25).abs() < 1e-9);

        node.degraded = true;
        assert!((node.output(&config) - 1.125).abs() < 1e-9);
    }

    #[test]
    fn test_ids_stay_unique_after_removal() {
        let mut network = NodeNetwork::new();
        let a = network.deploy(None);
        let b = network.deploy(None);
        network.remove(0);
        let c = network.deploy(None);
        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_eq!(network.len(), 2);
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut network = NodeNetwork::new();
        network.deploy(None);
        assert!(network.remove(5).is_none());
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn test_wear_degrades_after_period() {
        let config = NodeConfig {
            degradation_period: 10.0,
            ..NodeConfig::default()
        };
        let mut network = NodeNetwork::new();
        let id = network.deploy(None);

        for _ in 0..9 {
            assert!(network.advance_wear(1.0, &config).is_empty());
        }
        assert_eq!(network.advance_wear(1.0, &config), vec![id]);
        assert_eq!(network.degraded_count(), 1);

        // Degraded nodes stop accumulating wear
        assert!(network.advance_wear(100.0, &config).is_empty());
    }

    #[test]
    fn test_energy_drain_uses_level_and_district_load() {
        let mut network = NodeNetwork::new();
        network.deploy(None);
        network.deploy(Some(DistrictId(7)));
        network.get_mut(1).unwrap().level = 3;
        assert!(network.set_district_load(DistrictId(7), 2.0));

        // node 0: 0.4 × 1.0 × 1.0; node 1: 0.4 × 1.5 × 2.0
        let drain = network.energy_drain(0.4, 0.25);
        assert!((drain - (0.4 + 1.2)).abs() < 1e-9);
        assert!(!network.set_district_load(DistrictId(7), f64::NAN));
        assert_eq!(network.district_load(DistrictId(7)), 2.0);
    }

    #[test]
    fn test_from_nodes_repairs_fields() {
        let mut bad = Node::new(NodeId(41), None);
        bad.level = 9;
        bad.degradation_timer = f64::INFINITY;
        let mut network = NodeNetwork::from_nodes(vec![bad]);

        let node = network.get(0).unwrap();
        assert_eq!(node.level, MAX_NODE_LEVEL);
        assert_eq!(node.degradation_timer, 0.0);
        assert_eq!(network.deploy(None), NodeId(42));
    }

    #[test]
    fn test_deploy_cost_grows() {
        let config = NodeConfig::default();
        let mut network = NodeNetwork::new();
        let first = network.deploy_cost(&config);
        network.deploy(None);
        assert!(network.deploy_cost(&config) > first);
        assert_eq!(upgrade_cost(2, &config), 50.0);
    }
}
