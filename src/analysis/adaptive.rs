//! Adaptive difficulty loop
//!
//! Observes performance over a rolling window and slowly moves a skill
//! estimate toward what it sees. The adaptation level follows skill, and four
//! tuning scalars are linear in the level, each clamped to its own range.
//! Nothing here is ever snapped: every change is a lerp scaled by delta.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::AdaptiveConfig;
use crate::core::types::GameTime;

/// Multipliers the rest of the simulation reads from the adaptive loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningScalars {
    pub risk_gain: f64,
    /// Not consumed by the core; exposed for the event system
    pub event_frequency: f64,
    pub maintenance_cost: f64,
    pub constraint_regen: f64,
}

impl Default for TuningScalars {
    fn default() -> Self {
        Self {
            risk_gain: 1.0,
            event_frequency: 1.0,
            maintenance_cost: 1.0,
            constraint_regen: 1.0,
        }
    }
}

impl TuningScalars {
    pub fn from_level(level: f64, config: &AdaptiveConfig) -> Self {
        Self {
            risk_gain: config.risk_gain.evaluate(level),
            event_frequency: config.event_frequency.evaluate(level),
            maintenance_cost: config.maintenance_cost.evaluate(level),
            constraint_regen: config.constraint_regen.evaluate(level),
        }
    }
}

/// One observation fed to the loop each fast tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSample {
    pub at: GameTime,
    pub influence_rate: f64,
    pub risk_rate: f64,
    pub risk_value: f64,
}

/// Read-only summary for UI and tooling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationReport {
    pub skill_score: f64,
    pub adaptation_level: f64,
    pub scalars: TuningScalars,
    pub sample_count: usize,
    pub mean_influence_rate: f64,
    pub mean_risk: f64,
    pub mean_risk_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveLoop {
    skill_score: f64,
    adaptation_level: f64,
    #[serde(default)]
    scalars: TuningScalars,
    #[serde(default)]
    samples: VecDeque<AdaptiveSample>,
}

impl Default for AdaptiveLoop {
    fn default() -> Self {
        Self::new(&AdaptiveConfig::default())
    }
}

impl AdaptiveLoop {
    pub fn new(config: &AdaptiveConfig) -> Self {
        let skill_score = config.initial_skill.clamp(config.skill_min, config.skill_max);
        let adaptation_level = level_target(skill_score, config);
        Self {
            skill_score,
            adaptation_level,
            scalars: TuningScalars::from_level(adaptation_level, config),
            samples: VecDeque::new(),
        }
    }

    /// Rebuild a loaded loop against the config
    ///
    /// Accumulators are clamped into range and scalars recomputed from the
    /// level. Only finite samples are kept, pushed through the same window as
    /// a live tick.
    pub fn restore(saved: AdaptiveLoop, config: &AdaptiveConfig) -> Self {
        let fresh = Self::new(config);
        let skill_score = if saved.skill_score.is_finite() {
            saved.skill_score.clamp(config.skill_min, config.skill_max)
        } else {
            fresh.skill_score
        };
        let adaptation_level = if saved.adaptation_level.is_finite() {
            saved.adaptation_level.clamp(config.level_min, config.level_max)
        } else {
            fresh.adaptation_level
        };
        let mut restored = Self {
            skill_score,
            adaptation_level,
            scalars: TuningScalars::from_level(adaptation_level, config),
            samples: VecDeque::with_capacity(saved.samples.len()),
        };
        for sample in saved.samples {
            if sample_is_finite(&sample) {
                restored.push_sample(sample, config.window_seconds);
            }
        }
        restored
    }

    pub fn skill_score(&self) -> f64 {
        self.skill_score
    }

    pub fn adaptation_level(&self) -> f64 {
        self.adaptation_level
    }

    pub fn scalars(&self) -> &TuningScalars {
        &self.scalars
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Advance the loop by one tick
    ///
    /// `recent_collapses` is the number of collapses inside the configured
    /// memory window; `risk_max` normalizes the mean risk value.
    pub fn update(
        &mut self,
        sample: AdaptiveSample,
        delta: f64,
        recent_collapses: usize,
        risk_max: f64,
        config: &AdaptiveConfig,
    ) {
        if !delta.is_finite() || delta <= 0.0 {
            return;
        }
        if sample_is_finite(&sample) {
            self.push_sample(sample, config.window_seconds);
        }

        let target = self.skill_target(recent_collapses, risk_max, config);
        let t = (config.skill_smoothing * delta).min(1.0);
        self.skill_score = lerp(self.skill_score, target, t).clamp(config.skill_min, config.skill_max);

        let level = level_target(self.skill_score, config);
        let t = (config.adaptation_smoothing * delta).min(1.0);
        self.adaptation_level =
            lerp(self.adaptation_level, level, t).clamp(config.level_min, config.level_max);

        self.scalars = TuningScalars::from_level(self.adaptation_level, config);
    }

    pub fn report(&self) -> AdaptationReport {
        let (influence, risk, risk_rate) = self.means();
        AdaptationReport {
            skill_score: self.skill_score,
            adaptation_level: self.adaptation_level,
            scalars: self.scalars,
            sample_count: self.samples.len(),
            mean_influence_rate: influence,
            mean_risk: risk,
            mean_risk_rate: risk_rate,
        }
    }

    fn push_sample(&mut self, sample: AdaptiveSample, window: f64) {
        if self.samples.back().is_some_and(|s| sample.at < s.at) {
            self.samples.clear();
        }
        self.samples.push_back(sample);
        while let Some(front) = self.samples.front() {
            if sample.at - front.at > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn means(&self) -> (f64, f64, f64) {
        if self.samples.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let n = self.samples.len() as f64;
        let (i, r, rr) = self.samples.iter().fold((0.0, 0.0, 0.0), |(i, r, rr), s| {
            (i + s.influence_rate, r + s.risk_value, rr + s.risk_rate)
        });
        (i / n, r / n, rr / n)
    }

    fn skill_target(&self, recent_collapses: usize, risk_max: f64, config: &AdaptiveConfig) -> f64 {
        let (influence, risk, _) = self.means();

        let norm_influence = if config.influence_rate_reference > 0.0 {
            (influence / config.influence_rate_reference).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let norm_risk = if risk_max > 0.0 {
            (risk / risk_max).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let target = config.influence_weight * norm_influence + config.safety_weight * (1.0 - norm_risk)
            - config.collapse_penalty * recent_collapses as f64;
        target.clamp(config.skill_min, config.skill_max)
    }
}

fn sample_is_finite(sample: &AdaptiveSample) -> bool {
    sample.at.is_finite()
        && sample.influence_rate.is_finite()
        && sample.risk_value.is_finite()
        && sample.risk_rate.is_finite()
}

fn level_target(skill: f64, config: &AdaptiveConfig) -> f64 {
    (config.level_min + skill * (config.level_max - config.level_min)).clamp(config.level_min, config.level_max)
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
