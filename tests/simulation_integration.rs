//! Integration tests for the tick loop
//!
//! These tests drive the simulation through its public surface:
//! - Collapse fires exactly once when risk crosses its threshold
//! - Equilibrium is reached after a sustained calm stretch, then lost
//! - The adaptive loop drifts monotonically and stays in range
//! - Risk decays with an empty network

use undernet::core::types::{ConstraintId, EffectChannel, ResourceId};
use undernet::core::SimulationConfig;
use undernet::modifiers::{Modifier, SourceTag};
use undernet::resources::base_risk_gain;
use undernet::simulation::{run_fast_tick, Simulation, SimulationEvent, SimulationState};

#[test]
fn test_collapse_fires_once_and_leaves_other_constraints_alone() {
    let mut state = SimulationState::new(SimulationConfig::default()).unwrap();
    state.set_resource(ResourceId::DetectionRisk, 99.9);
    state.push_modifier(EffectChannel::RiskGain, Modifier::additive(2.0, SourceTag::Event));
    let influence_before = state.get_resource(ResourceId::Influence);
    let energy_before = state.get_constraint(ConstraintId::Energy).unwrap().clone();

    let events = run_fast_tick(&mut state, 0.1);

    let collapses: Vec<_> = events.iter().filter(|e| e.is_collapse()).collect();
    assert_eq!(collapses.len(), 1, "exactly one collapse expected, got {:?}", events);
    match collapses[0] {
        SimulationEvent::CollapseTriggered { constraint, .. } => assert_eq!(*constraint, ConstraintId::Risk),
        other => panic!("unexpected event {:?}", other),
    }

    assert_eq!(state.get_resource(ResourceId::DetectionRisk), 0.0);
    assert!(state.get_resource(ResourceId::Influence) < influence_before);
    assert_eq!(state.total_collapses(), 1);

    // The energy constraint is gated off on the first tier and untouched
    let energy_after = state.get_constraint(ConstraintId::Energy).unwrap();
    assert!(!energy_after.active);
    assert_eq!(energy_after.value, energy_before.value);

    for _ in 0..20 {
        let events = run_fast_tick(&mut state, 0.1);
        assert!(events.iter().all(|e| !e.is_collapse()));
    }
}

#[test]
fn test_equilibrium_reached_once_then_lost() {
    let config = SimulationConfig::default();
    let sustain = config.equilibrium.sustain_seconds;
    let mut state = SimulationState::new(config).unwrap();

    let mut reached = 0;
    let ticks = ((sustain + 5.0) / 0.1) as usize;
    for _ in 0..ticks {
        for event in run_fast_tick(&mut state, 0.1) {
            if matches!(event, SimulationEvent::EquilibriumReached { .. }) {
                reached += 1;
            }
        }
    }
    assert_eq!(reached, 1);
    assert!(state.is_in_equilibrium());

    state.set_resource(ResourceId::DetectionRisk, 50.0);
    let events = run_fast_tick(&mut state, 0.1);
    assert!(events
        .iter()
        .any(|e| matches!(e, SimulationEvent::EquilibriumLost { .. })));
    assert!(!state.is_in_equilibrium());
}

#[test]
fn test_adaptive_drift_is_monotonic_and_bounded() {
    let config = SimulationConfig::default();
    let (level_min, level_max) = (config.adaptive.level_min, config.adaptive.level_max);
    let mut state = SimulationState::new(config).unwrap();

    // An idle network earns nothing, so the skill estimate sinks
    let mut previous = state.get_adaptation_report();
    for _ in 0..600 {
        run_fast_tick(&mut state, 0.1);
        let report = state.get_adaptation_report();
        assert!(report.skill_score <= previous.skill_score + 1e-12);
        assert!(report.adaptation_level <= previous.adaptation_level + 1e-12);
        assert!((0.0..=1.0).contains(&report.skill_score));
        assert!((level_min..=level_max).contains(&report.adaptation_level));
        previous = report;
    }
    assert!(previous.skill_score < 0.5);
    assert!(previous.scalars.risk_gain < 1.0);
}

#[test]
fn test_adaptive_skill_rises_with_safe_income() {
    let mut config = SimulationConfig::default();
    config.adaptive.influence_rate_reference = 0.5;
    let skill_max = config.adaptive.skill_max;
    let mut state = SimulationState::new(config).unwrap();
    state.deploy_node(None).unwrap();
    state.deploy_node(None).unwrap();

    let start = state.get_adaptation_report().skill_score;
    let mut previous = start;
    for _ in 0..600 {
        run_fast_tick(&mut state, 0.1);
        let skill = state.get_adaptation_report().skill_score;
        assert!(skill >= previous - 1e-12, "skill fell from {} to {}", previous, skill);
        assert!(skill <= skill_max);
        previous = skill;
    }
    assert!(previous > start);
    assert!(state.get_adaptation_report().scalars.risk_gain > 1.0);
}

#[test]
fn test_risk_decays_with_empty_network() {
    let mut state = SimulationState::new(SimulationConfig::default()).unwrap();
    state.set_resource(ResourceId::DetectionRisk, 40.0);

    let mut last = state.get_resource(ResourceId::DetectionRisk);
    for _ in 0..50 {
        run_fast_tick(&mut state, 0.1);
        let risk = state.get_resource(ResourceId::DetectionRisk);
        assert!(risk < last);
        last = risk;
    }
    assert!(state.get_per_second(ResourceId::DetectionRisk) < 0.0);
}

#[test]
fn test_base_risk_gain_for_ten_nodes() {
    let config = SimulationConfig::default();
    let gain = base_risk_gain(10, config.risk.exponent, config.risk.gain_per_node);
    assert!((gain - 0.2636).abs() < 0.001, "got {}", gain);
}

#[test]
fn test_growing_network_accumulates_influence() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.state_mut().deploy_node(None).unwrap();
    sim.state_mut().deploy_node(None).unwrap();

    for _ in 0..300 {
        sim.update(0.1);
    }

    let state = sim.state();
    assert!(state.get_per_second(ResourceId::Influence) > 0.0);
    assert!(state.get_resource(ResourceId::Influence) > 10.0);
    assert!(state.get_resource(ResourceId::Influence) <= state.influence_cap());
    assert!((state.clock() - 30.0).abs() < 1e-6);
}

#[test]
fn test_speed_multiplier_scales_game_time() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.scheduler_mut().set_speed(4.0);
    for _ in 0..10 {
        sim.update(0.1);
    }
    assert!((sim.state().clock() - 4.0).abs() < 1e-6);
}
