//! Equilibrium classifier - derivative-based stability analysis of risk
//!
//! Keeps a rolling, time-ordered window of `(time, risk)` samples. The first
//! derivative spans the whole window; the second derivative is the change
//! between the two half-window slopes, normalized by the half-window span.
//!
//! Separately tracks sustained equilibrium: risk and influence rate held
//! inside tolerance bands around a baseline for `sustain_seconds`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::EquilibriumConfig;
use crate::core::types::GameTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StabilityState {
    #[default]
    Stable,
    MetaStable,
    Chaotic,
    CollapseTrajectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquilibriumTransition {
    Reached,
    Lost,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumState {
    pub state: StabilityState,
    pub first_derivative: f64,
    pub second_derivative: f64,
    pub in_equilibrium: bool,
    /// Seconds spent inside the tolerance bands since the last excursion
    pub timer: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Baseline {
    risk: f64,
    influence_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Sample {
    at: GameTime,
    risk: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumClassifier {
    samples: VecDeque<Sample>,
    baseline: Option<Baseline>,
    current: EquilibriumState,
}

impl EquilibriumClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EquilibriumState {
        &self.current
    }

    pub fn is_in_equilibrium(&self) -> bool {
        self.current.in_equilibrium
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Forget the risk window (after the risk resource is reset)
    pub fn reset_window(&mut self) {
        self.samples.clear();
    }

    /// Feed one tick. Returns a transition when equilibrium is gained or lost.
    pub fn update(
        &mut self,
        now: GameTime,
        delta: f64,
        risk: f64,
        influence_rate: f64,
        config: &EquilibriumConfig,
    ) -> Option<EquilibriumTransition> {
        if !risk.is_finite() || !influence_rate.is_finite() {
            return None;
        }

        self.push_sample(now, risk, config.window_seconds);

        let (first, second) = self.derivatives();
        self.current.first_derivative = first;
        self.current.second_derivative = second;
        self.current.state = classify(first, second, config);

        self.track_equilibrium(delta, risk, influence_rate, config)
    }

    fn push_sample(&mut self, now: GameTime, risk: f64, window: f64) {
        // Time never runs backwards inside the window
        if self.samples.back().is_some_and(|s| now < s.at) {
            self.samples.clear();
        }
        self.samples.push_back(Sample { at: now, risk });
        while let Some(front) = self.samples.front() {
            if now - front.at > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn derivatives(&self) -> (f64, f64) {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return (0.0, 0.0);
        };
        let span = newest.at - oldest.at;
        if span <= 0.0 {
            return (0.0, 0.0);
        }

        let first = (newest.risk - oldest.risk) / span;

        if self.samples.len() < 3 {
            return (first, 0.0);
        }
        let middle = self.samples[self.samples.len() / 2];
        let early_span = middle.at - oldest.at;
        let late_span = newest.at - middle.at;
        if early_span <= 0.0 || late_span <= 0.0 {
            return (first, 0.0);
        }

        let early_slope = (middle.risk - oldest.risk) / early_span;
        let late_slope = (newest.risk - middle.risk) / late_span;
        let second = (late_slope - early_slope) / (span / 2.0);

        (first, second)
    }

    fn track_equilibrium(
        &mut self,
        delta: f64,
        risk: f64,
        influence_rate: f64,
        config: &EquilibriumConfig,
    ) -> Option<EquilibriumTransition> {
        let within = self.baseline.is_some_and(|b| {
            (risk - b.risk).abs() <= config.risk_tolerance
                && (influence_rate - b.influence_rate).abs() <= config.influence_rate_tolerance
        });

        if within {
            self.current.timer += delta.max(0.0);
            if !self.current.in_equilibrium && self.current.timer >= config.sustain_seconds {
                self.current.in_equilibrium = true;
                return Some(EquilibriumTransition::Reached);
            }
            return None;
        }

        self.baseline = Some(Baseline { risk, influence_rate });
        self.current.timer = 0.0;
        if self.current.in_equilibrium {
            self.current.in_equilibrium = false;
            return Some(EquilibriumTransition::Lost);
        }
        None
    }
}

/// First match wins
pub fn classify(first: f64, second: f64, config: &EquilibriumConfig) -> StabilityState {
    if first > config.threshold_rise && second.abs() > config.chaos_threshold {
        StabilityState::CollapseTrajectory
    } else if second.abs() > config.chaos_threshold {
        StabilityState::Chaotic
    } else if first.abs() < config.stable_max {
        StabilityState::Stable
    } else if first.abs() < config.meta_stable_max {
        StabilityState::MetaStable
    } else {
        StabilityState::Chaotic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(
        classifier: &mut EquilibriumClassifier,
        config: &EquilibriumConfig,
        start: f64,
        ticks: usize,
        delta: f64,
        risk: impl Fn(f64) -> f64,
        rate: f64,
    ) -> Vec<EquilibriumTransition> {
        let mut transitions = Vec::new();
        for i in 1..=ticks {
            let t = start + i as f64 * delta;
            if let Some(tr) = classifier.update(t, delta, risk(t), rate, config) {
                transitions.push(tr);
            }
        }
        transitions
    }

    #[test]
    fn test_classify_order() {
        let config = EquilibriumConfig::default();
        assert_eq!(classify(1.0, 0.5, &config), StabilityState::CollapseTrajectory);
        assert_eq!(classify(-1.0, 0.5, &config), StabilityState::Chaotic);
        assert_eq!(classify(0.01, 0.0, &config), StabilityState::Stable);
        assert_eq!(classify(-0.1, 0.0, &config), StabilityState::MetaStable);
        assert_eq!(classify(0.4, 0.0, &config), StabilityState::Chaotic);
    }

    #[test]
    fn test_linear_rise_has_expected_derivatives() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 100, 0.1, |t| 2.0 * t, 0.0);

        let state = c.state();
        assert!((state.first_derivative - 2.0).abs() < 1e-6);
        assert!(state.second_derivative.abs() < 1e-6);
        // Steep but smooth: not chaotic, not stable
        assert_eq!(state.state, StabilityState::Chaotic);
    }

    #[test]
    fn test_accelerating_rise_is_collapse_trajectory() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 100, 0.1, |t| 0.5 * t * t, 0.0);
        assert_eq!(c.state().state, StabilityState::CollapseTrajectory);
    }

    #[test]
    fn test_window_is_pruned_by_age() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 1000, 0.1, |_| 5.0, 0.0);
        // 10s window at 0.1s ticks
        assert!(c.sample_count() <= 101);
    }

    #[test]
    fn test_equilibrium_reached_exactly_once() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        let transitions = feed(&mut c, &config, 0.0, 600, 0.1, |_| 30.0, 1.0);
        assert_eq!(transitions, vec![EquilibriumTransition::Reached]);
        assert!(c.is_in_equilibrium());
    }

    #[test]
    fn test_small_drift_inside_tolerance_keeps_timer() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        let transitions = feed(&mut c, &config, 0.0, 400, 0.1, |t| 30.0 + (t * 0.1).sin(), 1.0);
        assert_eq!(transitions, vec![EquilibriumTransition::Reached]);
    }

    #[test]
    fn test_perturbation_loses_equilibrium_and_resets_timer() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 400, 0.1, |_| 30.0, 1.0);
        assert!(c.is_in_equilibrium());

        let tr = c.update(40.1, 0.1, 30.0 + config.risk_tolerance * 2.0, 1.0, &config);
        assert_eq!(tr, Some(EquilibriumTransition::Lost));
        assert!(!c.is_in_equilibrium());
        assert_eq!(c.state().timer, 0.0);
    }

    #[test]
    fn test_excursion_before_equilibrium_emits_nothing() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 100, 0.1, |_| 30.0, 1.0);
        let tr = c.update(10.1, 0.1, 60.0, 1.0, &config);
        assert_eq!(tr, None);
        assert_eq!(c.state().timer, 0.0);
    }

    #[test]
    fn test_influence_rate_excursion_also_counts() {
        let config = EquilibriumConfig::default();
        let mut c = EquilibriumClassifier::new();
        feed(&mut c, &config, 0.0, 400, 0.1, |_| 30.0, 1.0);
        let tr = c.update(40.1, 0.1, 30.0, 1.0 + config.influence_rate_tolerance * 3.0, &config);
        assert_eq!(tr, Some(EquilibriumTransition::Lost));
    }
}
