//! Collapse state machine - the reset transition behind every constraint
//!
//! Normal -> Collapsing -> Normal, all within one `execute` call. The
//! triggering resource is reset to its floor inside the transition, so the
//! same threshold cannot fire again until it re-accumulates.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::types::{CollapseType, ConstraintId, GameTime, ResourceId};
use crate::modifiers::{ModifierBoard, SourceTag};
use crate::network::NodeNetwork;
use crate::resources::{ResourceEngine, ResourceRegistry};

/// Static effect of a collapse type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollapseDefinition {
    pub influence_penalty_fraction: f64,
    pub clears_nodes: bool,
    pub clears_events: bool,
}

impl CollapseDefinition {
    pub fn for_type(collapse_type: CollapseType) -> Self {
        match collapse_type {
            CollapseType::SoftReset => Self {
                influence_penalty_fraction: 0.5,
                clears_nodes: true,
                clears_events: true,
            },
            CollapseType::Blackout => Self {
                influence_penalty_fraction: 0.1,
                clears_nodes: false,
                clears_events: false,
            },
            CollapseType::Meltdown => Self {
                influence_penalty_fraction: 0.25,
                clears_nodes: true,
                clears_events: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollapsePhase {
    #[default]
    Normal,
    Collapsing,
}

/// What a collapse did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseReport {
    pub constraint: ConstraintId,
    pub collapse_type: CollapseType,
    pub at: GameTime,
    pub influence_lost: f64,
    pub nodes_cleared: usize,
    pub event_modifiers_cleared: usize,
}

/// State a collapse is allowed to touch
pub struct CollapseTarget<'a> {
    pub registry: &'a mut ResourceRegistry,
    pub nodes: &'a mut NodeNetwork,
    pub board: &'a mut ModifierBoard,
    pub engine: &'a mut ResourceEngine,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollapseMachine {
    phase: CollapsePhase,
    total: u64,
    /// Game times of past collapses, pruned by the caller's memory window
    history: VecDeque<GameTime>,
}

impl CollapseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CollapsePhase {
        self.phase
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Run the transition. Returns None if a collapse is already in progress.
    pub fn execute(
        &mut self,
        target: &mut CollapseTarget<'_>,
        constraint: ConstraintId,
        collapse_type: CollapseType,
        now: GameTime,
    ) -> Option<CollapseReport> {
        if self.phase == CollapsePhase::Collapsing {
            tracing::warn!(%constraint, "collapse requested while collapsing, ignored");
            return None;
        }
        self.phase = CollapsePhase::Collapsing;

        let definition = CollapseDefinition::for_type(collapse_type);

        let influence = target.registry.value(ResourceId::Influence);
        let penalty = definition.influence_penalty_fraction.clamp(0.0, 1.0);
        let remaining = influence * (1.0 - penalty);
        target.registry.set_value(ResourceId::Influence, remaining);

        let nodes_cleared = if definition.clears_nodes {
            target.nodes.clear()
        } else {
            0
        };
        let event_modifiers_cleared = if definition.clears_events {
            target.board.remove_source(SourceTag::Event)
        } else {
            0
        };

        let backing = constraint.backing_resource();
        target.registry.set(backing, 0.0, 0.0);
        match backing {
            ResourceId::DetectionRisk => target.engine.reset_risk_history(),
            ResourceId::EnergyOverload => target.engine.reset_energy_history(),
            _ => {}
        }

        self.total += 1;
        self.history.push_back(now);
        self.phase = CollapsePhase::Normal;

        tracing::info!(
            %constraint,
            ?collapse_type,
            influence_lost = influence - remaining,
            nodes_cleared,
            event_modifiers_cleared,
            "collapse executed"
        );

        Some(CollapseReport {
            constraint,
            collapse_type,
            at: now,
            influence_lost: influence - remaining,
            nodes_cleared,
            event_modifiers_cleared,
        })
    }

    /// Collapses within `window` seconds of `now`; older entries are dropped
    pub fn recent(&mut self, now: GameTime, window: f64) -> usize {
        while let Some(&t) = self.history.front() {
            if now - t > window {
                self.history.pop_front();
            } else {
                break;
            }
        }
        self.history.len()
    }
}
