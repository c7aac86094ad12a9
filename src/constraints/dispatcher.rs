//! Constraint dispatch - sync and evaluate constraints in priority order
//!
//! The active ids are collected before the pass starts. A collapse mutates
//! the registry the pass reads from, so constraints after it in the order are
//! synced from post-collapse values.

use crate::constraints::collapse::{CollapseMachine, CollapseReport, CollapseTarget};
use crate::constraints::constraint::ConstraintSet;
use crate::core::types::{ConstraintId, GameTime};

pub fn dispatch_constraints(
    constraints: &mut ConstraintSet,
    machine: &mut CollapseMachine,
    target: &mut CollapseTarget<'_>,
    now: GameTime,
) -> Vec<CollapseReport> {
    let mut reports = Vec::new();

    for id in constraints.active_ids() {
        let Some(constraint) = constraints.get_mut(id) else {
            continue;
        };

        let backing = id.backing_resource();
        constraint.sync(target.registry.value(backing), target.registry.per_second(backing));

        if !constraint.is_breached() {
            continue;
        }

        let collapse_type = constraint.collapse_type;
        if let Some(report) = machine.execute(target, id, collapse_type, now) {
            constraint.sync(target.registry.value(backing), target.registry.per_second(backing));
            reports.push(report);
        }
    }

    reports
}

/// Collapse `id` regardless of its threshold (tier danger checks)
///
/// No-op if the constraint is not registered.
pub fn force_collapse(
    constraints: &mut ConstraintSet,
    machine: &mut CollapseMachine,
    target: &mut CollapseTarget<'_>,
    id: ConstraintId,
    now: GameTime,
) -> Option<CollapseReport> {
    let constraint = constraints.get_mut(id)?;
    let report = machine.execute(target, id, constraint.collapse_type, now)?;
    let backing = id.backing_resource();
    constraint.sync(target.registry.value(backing), target.registry.per_second(backing));
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::constraint::Constraint;
    use crate::core::config::SimulationConfig;
    use crate::core::types::{CollapseType, ResourceId};
    use crate::modifiers::ModifierBoard;
    use crate::network::NodeNetwork;
    use crate::resources::{ResourceEngine, ResourceRegistry};

    struct World {
        registry: ResourceRegistry,
        nodes: NodeNetwork,
        board: ModifierBoard,
        engine: ResourceEngine,
        constraints: ConstraintSet,
        machine: CollapseMachine,
    }

    impl World {
        fn new() -> Self {
            Self {
                registry: ResourceRegistry::with_defaults(),
                nodes: NodeNetwork::new(),
                board: ModifierBoard::new(),
                engine: ResourceEngine::new(),
                constraints: ConstraintSet::with_defaults(&SimulationConfig::default(), true),
                machine: CollapseMachine::new(),
            }
        }

        fn dispatch(&mut self, now: f64) -> Vec<CollapseReport> {
            let mut target = CollapseTarget {
                registry: &mut self.registry,
                nodes: &mut self.nodes,
                board: &mut self.board,
                engine: &mut self.engine,
            };
            dispatch_constraints(&mut self.constraints, &mut self.machine, &mut target, now)
        }
    }

    #[test]
    fn test_constraints_follow_backing_resources() {
        let mut world = World::new();
        world.registry.set(ResourceId::DetectionRisk, 42.0, 0.5);
        world.registry.set(ResourceId::EnergyOverload, 7.0, -1.0);
        assert!(world.dispatch(1.0).is_empty());

        let risk = world.constraints.get(ConstraintId::Risk).unwrap();
        assert_eq!((risk.value, risk.rate), (42.0, 0.5));
        let energy = world.constraints.get(ConstraintId::Energy).unwrap();
        assert_eq!((energy.value, energy.rate), (7.0, -1.0));
    }

    #[test]
    fn test_threshold_fires_once_and_resets() {
        let mut world = World::new();
        world.registry.set(ResourceId::DetectionRisk, 100.0, 2.0);
        world.registry.set(ResourceId::EnergyOverload, 30.0, 0.0);

        let reports = world.dispatch(5.0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].constraint, ConstraintId::Risk);
        assert_eq!(world.constraints.get(ConstraintId::Risk).unwrap().value, 0.0);
        assert_eq!(world.registry.value(ResourceId::EnergyOverload), 30.0);

        // Re-dispatch without accumulation: nothing fires
        assert!(world.dispatch(5.1).is_empty());
    }

    #[test]
    fn test_inactive_constraints_are_not_synced() {
        let mut world = World::new();
        world.registry.set(ResourceId::ThermalLoad, 500.0, 0.0);
        assert!(world.dispatch(1.0).is_empty());
        assert_eq!(world.constraints.get(ConstraintId::Thermal).unwrap().value, 0.0);

        world.constraints.set_active(ConstraintId::Thermal, true).unwrap();
        let reports = world.dispatch(2.0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].collapse_type, CollapseType::Meltdown);
    }

    #[test]
    fn test_multiple_breaches_fire_in_priority_order() {
        let mut world = World::new();
        // Thermal runs after risk in the same pass
        world.constraints.register(Constraint {
            id: ConstraintId::Thermal,
            active: true,
            priority: 50,
            value: 0.0,
            max_value: 100.0,
            rate: 0.0,
            collapse_type: CollapseType::Meltdown,
            collapse_threshold: 10.0,
        });
        world.registry.set(ResourceId::DetectionRisk, 100.0, 2.0);
        world.registry.set(ResourceId::ThermalLoad, 10.0, 0.0);

        let reports = world.dispatch(1.0);
        // Both fire, in priority order
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].constraint, ConstraintId::Risk);
        assert_eq!(reports[1].constraint, ConstraintId::Thermal);
        assert_eq!(world.registry.value(ResourceId::ThermalLoad), 0.0);
        assert_eq!(world.machine.total(), 2);
    }

    #[test]
    fn test_force_collapse_ignores_threshold() {
        let mut world = World::new();
        world.registry.set(ResourceId::DetectionRisk, 91.0, 0.0);
        let mut target = CollapseTarget {
            registry: &mut world.registry,
            nodes: &mut world.nodes,
            board: &mut world.board,
            engine: &mut world.engine,
        };
        let report = force_collapse(
            &mut world.constraints,
            &mut world.machine,
            &mut target,
            ConstraintId::Risk,
            3.0,
        );
        assert!(report.is_some());
        assert_eq!(world.registry.value(ResourceId::DetectionRisk), 0.0);
    }
}
