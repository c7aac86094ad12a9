//! Save/load - versioned JSON snapshots of the simulation state
//!
//! Loading runs in three stages:
//! 1. Parse to a `serde_json::Value` and migrate it forward one version at a
//!    time until it matches `SAVE_VERSION`.
//! 2. Strict parse into `SaveData`. If that fails, fall back to a safe load
//!    that keeps every well-typed top-level field and defaults the rest.
//! 3. Restore into a fresh `SimulationState`, validating and clamping every
//!    value and skipping identifiers this build does not know.
//!
//! Only unparseable input (or a non-object root) makes recovery fail; the
//! caller then starts from a fresh state.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::analysis::{AdaptiveLoop, EquilibriumClassifier};
use crate::constraints::CollapseMachine;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, UndernetError};
use crate::core::types::{ConstraintId, DoctrineId, ResourceId, UpgradeId};
use crate::network::{Node, NodeNetwork};
use crate::resources::safety::{clamp_finite, finite_or_zero};
use crate::resources::ResourceEngine;
use crate::simulation::state::SimulationState;

pub const SAVE_VERSION: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedResource {
    pub value: f64,
    #[serde(default)]
    pub per_second: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedConstraint {
    pub active: bool,
}

/// On-disk layout, version 3
///
/// Identifiers are stored as strings so a save written by a build with more
/// content still loads; unknown names are skipped on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub clock: f64,
    pub tick_count: u64,
    pub tier: String,
    pub resources: BTreeMap<String, SavedResource>,
    pub nodes: Vec<Node>,
    pub upgrades: BTreeMap<String, u32>,
    pub doctrine: String,
    pub constraints: BTreeMap<String, SavedConstraint>,
    pub engine: Option<ResourceEngine>,
    pub collapse: Option<CollapseMachine>,
    pub equilibrium: Option<EquilibriumClassifier>,
    pub adaptive: Option<AdaptiveLoop>,
}

impl SaveData {
    /// Snapshot the state. Call between ticks only.
    pub fn capture(state: &SimulationState) -> Self {
        let resources = state
            .registry
            .sorted()
            .into_iter()
            .map(|r| {
                (
                    r.id.name().to_string(),
                    SavedResource {
                        value: r.value,
                        per_second: r.per_second,
                    },
                )
            })
            .collect();

        let upgrades = state
            .upgrades
            .iter()
            .map(|(id, level)| (id.name().to_string(), level))
            .collect();

        let constraints = state
            .constraints
            .iter()
            .map(|c| (c.id.name().to_string(), SavedConstraint { active: c.active }))
            .collect();

        Self {
            version: SAVE_VERSION,
            clock: state.clock,
            tick_count: state.tick_count,
            tier: state.tier().name.clone(),
            resources,
            nodes: state.nodes.nodes().to_vec(),
            upgrades,
            doctrine: state.doctrine.name().to_string(),
            constraints,
            engine: Some(state.engine.clone()),
            collapse: Some(state.collapse.clone()),
            equilibrium: Some(state.equilibrium.clone()),
            adaptive: Some(state.adaptive.clone()),
        }
    }

    /// Parse, migrate and decode a save. Errors only if nothing is recoverable.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let value = migrate(value)?;

        match serde_json::from_value::<SaveData>(value.clone()) {
            Ok(save) => Ok(save),
            Err(err) => {
                tracing::warn!(%err, "save does not match the current layout, using safe load");
                safe_load(&value)
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a state from this save, validating every field against `config`
    pub fn restore(self, config: SimulationConfig) -> Result<SimulationState> {
        config.validate().map_err(UndernetError::InvalidConfig)?;
        let mut state = SimulationState::build(config);

        match state.tiers.resolve(&self.tier) {
            Some(handle) => state.tier = handle,
            None => tracing::warn!(tier = %self.tier, "unknown tier in save, starting at the first tier"),
        }

        state.clock = if self.clock.is_finite() && self.clock >= 0.0 {
            self.clock
        } else {
            0.0
        };
        state.tick_count = self.tick_count;

        for (name, saved) in &self.resources {
            let Some(id) = parse_known::<ResourceId>("resource", name) else {
                continue;
            };
            let (lo, hi) = state.resource_bounds(id);
            let value = clamp_finite(id, "load", saved.value, lo, hi);
            let per_second = finite_or_zero(id, "load", saved.per_second);
            state.registry.set(id, value, per_second);
        }

        state.nodes = NodeNetwork::from_nodes(self.nodes);

        for (name, level) in &self.upgrades {
            if let Some(id) = parse_known::<UpgradeId>("upgrade", name) {
                state.upgrades.set_level(id, (*level).min(state.config.upgrades.max_level));
            }
        }

        if !self.doctrine.is_empty() {
            if let Some(id) = parse_known::<DoctrineId>("doctrine", &self.doctrine) {
                state.doctrine = id;
            }
        }

        let energy = state.energy_enabled();
        if let Some(constraint) = state.constraints.get_mut(ConstraintId::Energy) {
            constraint.active = energy;
        }
        for (name, saved) in &self.constraints {
            if let Some(id) = parse_known::<ConstraintId>("constraint", name) {
                if let Some(constraint) = state.constraints.get_mut(id) {
                    constraint.active = saved.active;
                }
            }
        }
        for id in ConstraintId::ALL {
            let backing = id.backing_resource();
            let (value, rate) = (state.registry.value(backing), state.registry.per_second(backing));
            if let Some(constraint) = state.constraints.get_mut(id) {
                constraint.sync(value, rate);
            }
        }

        state.engine = self.engine.unwrap_or_default();
        state.collapse = self.collapse.unwrap_or_default();
        state.equilibrium = self.equilibrium.unwrap_or_default();
        state.adaptive = match self.adaptive {
            Some(saved) => AdaptiveLoop::restore(saved, &state.config.adaptive),
            None => AdaptiveLoop::new(&state.config.adaptive),
        };

        Ok(state)
    }
}

fn parse_known<T: FromStr>(kind: &'static str, name: &str) -> Option<T> {
    match name.parse::<T>() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!(kind, name, "unknown identifier in save, skipped");
            None
        }
    }
}

/// Bring an older layout up to `SAVE_VERSION`, one step at a time
fn migrate(mut value: Value) -> Result<Value> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| UndernetError::CorruptSave("save root is not an object".into()))?;

    let mut version = obj
        .get("version")
        .and_then(Value::as_u64)
        .map(|v| v.clamp(1, u32::MAX as u64) as u32)
        .unwrap_or(1);

    if version > SAVE_VERSION {
        tracing::warn!(version, supported = SAVE_VERSION, "save is newer than this build");
    }

    while version < SAVE_VERSION {
        match version {
            1 => migrate_v1_to_v2(obj),
            2 => migrate_v2_to_v3(obj),
            _ => {}
        }
        version += 1;
        tracing::debug!(version, "save migrated");
    }
    obj.insert("version".into(), json!(version.max(SAVE_VERSION)));

    Ok(value)
}

/// v1 stored bare resource values and had no upgrades or constraint flags
fn migrate_v1_to_v2(obj: &mut Map<String, Value>) {
    if let Some(Value::Object(resources)) = obj.get_mut("resources") {
        for entry in resources.values_mut() {
            if let Some(n) = entry.as_f64() {
                *entry = json!({ "value": n, "per_second": 0.0 });
            }
        }
    }
    obj.entry("resources").or_insert_with(|| json!({}));
    obj.entry("upgrades").or_insert_with(|| json!({}));
    obj.entry("constraints").or_insert_with(|| json!({}));
    obj.entry("doctrine").or_insert_with(|| json!(DoctrineId::default().name()));
}

/// v3 added the tick counter and the analysis accumulators
fn migrate_v2_to_v3(obj: &mut Map<String, Value>) {
    obj.entry("tick_count").or_insert_with(|| json!(0));
    for key in ["engine", "collapse", "equilibrium", "adaptive"] {
        obj.entry(key).or_insert(Value::Null);
    }
}

/// Keep every well-typed top-level field, default the rest
fn safe_load(value: &Value) -> Result<SaveData> {
    let obj = value
        .as_object()
        .ok_or_else(|| UndernetError::CorruptSave("save root is not an object".into()))?;

    Ok(SaveData {
        version: SAVE_VERSION,
        clock: field(obj, "clock"),
        tick_count: field(obj, "tick_count"),
        tier: field(obj, "tier"),
        resources: field(obj, "resources"),
        nodes: field(obj, "nodes"),
        upgrades: field(obj, "upgrades"),
        doctrine: field(obj, "doctrine"),
        constraints: field(obj, "constraints"),
        engine: field(obj, "engine"),
        collapse: field(obj, "collapse"),
        equilibrium: field(obj, "equilibrium"),
        adaptive: field(obj, "adaptive"),
    })
}

fn field<T: DeserializeOwned + Default>(obj: &Map<String, Value>, name: &'static str) -> T {
    match obj.get(name) {
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|err| {
            tracing::warn!(field = name, %err, "malformed save field replaced with default");
            T::default()
        }),
        None => T::default(),
    }
}

/// Decode a save into a state. Unrecoverable data yields a fresh state.
pub fn load_state(content: &str, config: SimulationConfig) -> Result<SimulationState> {
    config.validate().map_err(UndernetError::InvalidConfig)?;
    match SaveData::from_json(content) {
        Ok(save) => {
            let state = save.restore(config)?;
            tracing::info!(clock = state.clock, nodes = state.nodes.len(), "save loaded");
            Ok(state)
        }
        Err(err) => {
            tracing::warn!(%err, "save unrecoverable, starting fresh");
            Ok(SimulationState::build(config))
        }
    }
}

pub fn save_to_json(state: &SimulationState) -> Result<String> {
    SaveData::capture(state).to_json()
}

pub fn save_to_file(state: &SimulationState, path: &Path) -> Result<()> {
    let content = save_to_json(state)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), clock = state.clock, "game saved");
    Ok(())
}

/// Read a save from disk. I/O errors propagate; bad content starts fresh.
pub fn load_from_file(path: &Path, config: SimulationConfig) -> Result<SimulationState> {
    let content = std::fs::read_to_string(path)?;
    load_state(&content, config)
}
