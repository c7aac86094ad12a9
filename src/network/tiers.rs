//! Tier ladder
//!
//! Tiers come from data and are named by string. The names are resolved into
//! `TierHandle`s once, when the catalog is built.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::TierHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub name: String,
    pub node_capacity: usize,
    pub influence_cap: f64,
    /// Risk at or above this collapses on the slow-tick danger check
    #[serde(default)]
    pub danger_threshold: Option<f64>,
    /// Influence at which the objective check promotes to the next tier
    #[serde(default)]
    pub advance_at_influence: Option<f64>,
}

impl TierDefinition {
    pub fn default_ladder() -> Vec<Self> {
        vec![
            Self {
                name: "street".into(),
                node_capacity: 8,
                influence_cap: 500.0,
                danger_threshold: None,
                advance_at_influence: Some(400.0),
            },
            Self {
                name: "district".into(),
                node_capacity: 20,
                influence_cap: 5_000.0,
                danger_threshold: Some(95.0),
                advance_at_influence: Some(4_000.0),
            },
            Self {
                name: "metro".into(),
                node_capacity: 50,
                influence_cap: 50_000.0,
                danger_threshold: Some(90.0),
                advance_at_influence: None,
            },
        ]
    }
}

#[derive(Debug, Clone)]
pub struct TierCatalog {
    tiers: Vec<TierDefinition>,
    by_name: AHashMap<String, TierHandle>,
}

impl TierCatalog {
    /// Build the catalog. An empty list falls back to the default ladder.
    pub fn new(definitions: Vec<TierDefinition>) -> Self {
        let tiers = if definitions.is_empty() {
            tracing::warn!("No tiers configured, using the default ladder");
            TierDefinition::default_ladder()
        } else {
            definitions
        };

        let mut by_name = AHashMap::new();
        for (i, tier) in tiers.iter().enumerate() {
            // First definition wins on duplicate names
            by_name.entry(tier.name.clone()).or_insert(TierHandle(i));
        }

        Self { tiers, by_name }
    }

    pub fn resolve(&self, name: &str) -> Option<TierHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: TierHandle) -> &TierDefinition {
        &self.tiers[handle.0.min(self.tiers.len() - 1)]
    }

    pub fn next(&self, handle: TierHandle) -> Option<TierHandle> {
        let next = handle.0 + 1;
        (next < self.tiers.len()).then_some(TierHandle(next))
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}
