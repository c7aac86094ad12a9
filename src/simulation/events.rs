//! Notifications emitted by the simulation
//!
//! Returned from every tick for UI, telemetry and tooling. The core never
//! depends on anyone reading them.

use serde::Serialize;

use crate::constraints::CollapseReport;
use crate::core::types::{CollapseType, ConstraintId, GameTime, NodeId, ResourceId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// A constraint collapsed
    CollapseTriggered {
        collapse_type: CollapseType,
        /// Constraint whose threshold (or danger check) fired
        constraint: ConstraintId,
        report: CollapseReport,
    },
    EquilibriumReached {
        at: GameTime,
    },
    EquilibriumLost {
        at: GameTime,
    },
    /// A resource value was written outside the regular tick laws
    ResourceChanged {
        resource: ResourceId,
        value: f64,
    },
    TierChanged {
        from: String,
        to: String,
    },
    NodeDegraded {
        node: NodeId,
    },
}

impl SimulationEvent {
    pub fn collapse(report: CollapseReport) -> Self {
        Self::CollapseTriggered {
            collapse_type: report.collapse_type,
            constraint: report.constraint,
            report,
        }
    }

    pub fn is_collapse(&self) -> bool {
        matches!(self, Self::CollapseTriggered { .. })
    }
}
