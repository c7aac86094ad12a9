//! Risk momentum - smoothed trend of the detection-risk rate
//!
//! Rising momentum makes risk gain compound; falling momentum speeds decay.

use serde::{Deserialize, Serialize};

use crate::core::config::MomentumConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMomentum {
    value: f64,
}

impl RiskMomentum {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_falling(&self) -> bool {
        self.value < 0.0
    }

    /// Exponential smoothing toward the latest risk rate
    pub fn update(&mut self, rate: f64, delta: f64, config: &MomentumConfig) {
        if !rate.is_finite() {
            return;
        }
        let t = (config.smoothing * delta).clamp(0.0, 1.0);
        self.value += (rate - self.value) * t;
    }

    /// Multiplier applied to risk gain; 1.0 unless risk is trending up
    pub fn gain_multiplier(&self, config: &MomentumConfig) -> f64 {
        (1.0 + self.value.max(0.0) * config.gain_scale).min(config.max_gain_multiplier.max(1.0))
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentum_follows_rate() {
        let config = MomentumConfig::default();
        let mut m = RiskMomentum::default();
        for _ in 0..100 {
            m.update(2.0, 0.1, &config);
        }
        assert!((m.value() - 2.0).abs() < 0.05);
        assert!(m.gain_multiplier(&config) > 1.0);
    }

    #[test]
    fn test_gain_multiplier_is_capped() {
        let config = MomentumConfig::default();
        let mut m = RiskMomentum::default();
        m.update(1_000.0, 10.0, &config);
        assert_eq!(m.gain_multiplier(&config), config.max_gain_multiplier);
    }

    #[test]
    fn test_falling_momentum_does_not_reduce_gain() {
        let config = MomentumConfig::default();
        let mut m = RiskMomentum::default();
        m.update(-1.0, 1.0, &config);
        assert!(m.is_falling());
        assert_eq!(m.gain_multiplier(&config), 1.0);
        m.reset();
        assert_eq!(m.value(), 0.0);
    }
}
