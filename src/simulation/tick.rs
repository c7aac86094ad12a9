//! Tick system - orchestrates simulation updates
//!
//! This is the core loop that ties together:
//! wear -> modifier frame -> resource engine -> constraint dispatch ->
//! equilibrium -> adaptive difficulty
//!
//! Fast ticks run every scheduler invocation with the scaled delta. Slow
//! ticks poll tier objectives and danger thresholds about once per second.

use std::path::Path;

use crate::analysis::{AdaptiveSample, EquilibriumTransition};
use crate::constraints::{dispatch_constraints, force_collapse, CollapseReport, CollapseTarget};
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{ConstraintId, EffectChannel, ResourceId};
use crate::modifiers::{Modifier, ModifierFrame, SourceTag};
use crate::network::Doctrine;
use crate::resources::EngineContext;
use crate::simulation::events::SimulationEvent;
use crate::simulation::scheduler::TickScheduler;
use crate::simulation::snapshot;
use crate::simulation::state::SimulationState;

/// Hook for external collaborators (automation, events, bots)
///
/// Subscribers run after the core systems, in registration order, and may
/// use the state's mutation surface. Anything they raise is reported with the
/// next tick's events.
pub trait TickSubscriber {
    fn on_fast_tick(&mut self, _state: &mut SimulationState, _delta: f64, _events: &[SimulationEvent]) {}

    fn on_slow_tick(&mut self, _state: &mut SimulationState, _events: &[SimulationEvent]) {}
}

/// Run one fast tick with an already-scaled game-time delta
pub fn run_fast_tick(state: &mut SimulationState, delta: f64) -> Vec<SimulationEvent> {
    let delta = if delta.is_finite() && delta >= 0.0 {
        delta
    } else {
        tracing::warn!(delta, "rejected tick delta, treating as 0");
        0.0
    };

    let mut events = state.take_pending_events();

    state.clock += delta;
    state.tick_count += 1;

    for node in state.nodes.advance_wear(delta, &state.config.nodes) {
        events.push(SimulationEvent::NodeDegraded { node });
    }

    let frame = build_frame(state);
    let scalars = *state.adaptive.scalars();
    let influence_cap = state.influence_cap();
    let energy_enabled = state.energy_enabled();

    let ctx = EngineContext {
        config: &state.config,
        nodes: &state.nodes,
        frame: &frame,
        influence_cap,
        energy_enabled,
        energy_gen_bonus: state.upgrades.energy_gen_bonus(),
        maintenance_scalar: scalars.maintenance_cost,
        regen_scalar: scalars.constraint_regen,
    };
    let report = state.engine.tick(&ctx, &mut state.registry, delta);

    let mut target = CollapseTarget {
        registry: &mut state.registry,
        nodes: &mut state.nodes,
        board: &mut state.board,
        engine: &mut state.engine,
    };
    let collapses = dispatch_constraints(&mut state.constraints, &mut state.collapse, &mut target, state.clock);
    record_collapses(state, collapses, &mut events);

    let risk = state.registry.value(ResourceId::DetectionRisk);
    let influence_rate = state.registry.per_second(ResourceId::Influence);
    match state
        .equilibrium
        .update(state.clock, delta, risk, influence_rate, &state.config.equilibrium)
    {
        Some(EquilibriumTransition::Reached) => {
            tracing::info!(at = state.clock, risk, influence_rate, "equilibrium reached");
            events.push(SimulationEvent::EquilibriumReached { at: state.clock });
        }
        Some(EquilibriumTransition::Lost) => {
            tracing::info!(at = state.clock, risk, influence_rate, "equilibrium lost");
            events.push(SimulationEvent::EquilibriumLost { at: state.clock });
        }
        None => {}
    }

    let recent = state
        .collapse
        .recent(state.clock, state.config.adaptive.collapse_memory_seconds);
    let sample = AdaptiveSample {
        at: state.clock,
        influence_rate: report.influence_rate,
        risk_rate: state.registry.per_second(ResourceId::DetectionRisk),
        risk_value: risk,
    };
    state
        .adaptive
        .update(sample, delta, recent, state.config.risk.max, &state.config.adaptive);

    events
}

/// Low-frequency polling: tier objective and tier danger checks
pub fn run_slow_tick(state: &mut SimulationState) -> Vec<SimulationEvent> {
    let mut events = Vec::new();

    let tier = state.tier();
    let advance_at = tier.advance_at_influence;
    let danger = tier.danger_threshold;

    if let Some(threshold) = advance_at {
        if state.registry.value(ResourceId::Influence) >= threshold {
            if let Some(next) = state.tiers.next(state.tier) {
                state.enter_tier(next);
            }
        }
    }

    if let Some(threshold) = danger {
        let risk = state.registry.value(ResourceId::DetectionRisk);
        let risk_active = state
            .constraints
            .get(ConstraintId::Risk)
            .is_some_and(|c| c.active);
        if risk_active && risk >= threshold {
            tracing::info!(risk, threshold, tier = %state.tier().name, "tier danger threshold crossed");
            let mut target = CollapseTarget {
                registry: &mut state.registry,
                nodes: &mut state.nodes,
                board: &mut state.board,
                engine: &mut state.engine,
            };
            let report = force_collapse(
                &mut state.constraints,
                &mut state.collapse,
                &mut target,
                ConstraintId::Risk,
                state.clock,
            );
            record_collapses(state, report.into_iter().collect(), &mut events);
        }
    }

    let mut pending = state.take_pending_events();
    pending.append(&mut events);
    pending
}

/// Board modifiers plus what live state supplies this tick
fn build_frame(state: &SimulationState) -> ModifierFrame {
    let mut frame = ModifierFrame::from_board(&state.board);
    Doctrine::get(state.doctrine).contribute(&mut frame);
    state.upgrades.contribute(&mut frame);

    let scalars = state.adaptive.scalars();
    frame.push(
        EffectChannel::RiskGain,
        Modifier::multiplicative(scalars.risk_gain, SourceTag::Adaptive),
    );
    frame.push(
        EffectChannel::RiskDecay,
        Modifier::multiplicative(scalars.constraint_regen, SourceTag::Adaptive),
    );
    frame
}

fn record_collapses(state: &mut SimulationState, reports: Vec<CollapseReport>, events: &mut Vec<SimulationEvent>) {
    for report in reports {
        if report.constraint.backing_resource() == ResourceId::DetectionRisk {
            state.equilibrium.reset_window();
        }
        events.push(SimulationEvent::collapse(report));
    }
}

/// Scheduler, state and subscribers wired together
pub struct Simulation {
    state: SimulationState,
    scheduler: TickScheduler,
    subscribers: Vec<Box<dyn TickSubscriber>>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::from_state(SimulationState::new(config)?))
    }

    pub fn from_state(state: SimulationState) -> Self {
        let scheduler = TickScheduler::new(state.config.scheduler.clone());
        Self {
            state,
            scheduler,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TickScheduler {
        &mut self.scheduler
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn TickSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Advance by one real-time delta, returning every event raised
    pub fn update(&mut self, real_delta: f64) -> Vec<SimulationEvent> {
        let plan = self.scheduler.advance(real_delta);
        let mut all = Vec::new();

        if let Some(delta) = plan.fast_delta {
            let events = run_fast_tick(&mut self.state, delta);
            for subscriber in self.subscribers.iter_mut() {
                subscriber.on_fast_tick(&mut self.state, delta, &events);
            }
            all.extend(events);
        }

        for _ in 0..plan.slow_ticks {
            let events = run_slow_tick(&mut self.state);
            for subscriber in self.subscribers.iter_mut() {
                subscriber.on_slow_tick(&mut self.state, &events);
            }
            all.extend(events);
        }

        all
    }

    /// Replace the state with one loaded from disk. Corrupt saves start fresh.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let state = snapshot::load_from_file(path, self.state.config.clone())?;
        self.state = state;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        snapshot::save_to_file(&self.state, path)
    }
}
