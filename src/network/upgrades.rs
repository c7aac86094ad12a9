//! Upgrade tracks and the per-tick modifiers their levels supply

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::UpgradeConfig;
use crate::core::types::{EffectChannel, UpgradeId};
use crate::modifiers::{Modifier, ModifierFrame, SourceTag};

// Effect per purchased level
const COMPRESSION_BW_PER_LEVEL: f64 = 0.10;
const ENCRYPTION_REDUCTION_PER_LEVEL: f64 = 0.05;
const SCRUBBER_DECAY_PER_LEVEL: f64 = 0.05;
const ROUTING_EFFICIENCY_PER_LEVEL: f64 = 0.05;
const CAPACITOR_GEN_BONUS_PER_LEVEL: f64 = 0.10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeLevels {
    levels: BTreeMap<UpgradeId, u32>,
}

impl UpgradeLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, id: UpgradeId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    pub(crate) fn set_level(&mut self, id: UpgradeId, level: u32) {
        if level == 0 {
            self.levels.remove(&id);
        } else {
            self.levels.insert(id, level);
        }
    }

    /// Influence needed for the next level
    pub fn next_cost(&self, id: UpgradeId, config: &UpgradeConfig) -> f64 {
        config.base_cost * config.cost_growth.powi(self.level(id) as i32)
    }

    pub fn is_maxed(&self, id: UpgradeId, config: &UpgradeConfig) -> bool {
        self.level(id) >= config.max_level
    }

    pub fn iter(&self) -> impl Iterator<Item = (UpgradeId, u32)> + '_ {
        self.levels.iter().map(|(id, lvl)| (*id, *lvl))
    }

    /// Bonus fraction applied to energy generation after the pipeline
    pub fn energy_gen_bonus(&self) -> f64 {
        CAPACITOR_GEN_BONUS_PER_LEVEL * self.level(UpgradeId::Capacitors) as f64
    }

    pub fn contribute(&self, frame: &mut ModifierFrame) {
        let compression = self.level(UpgradeId::Compression);
        if compression > 0 {
            frame.push(
                EffectChannel::BwMultiplier,
                Modifier::multiplicative(1.0 + COMPRESSION_BW_PER_LEVEL * compression as f64, SourceTag::Upgrade),
            );
        }

        let encryption = self.level(UpgradeId::Encryption);
        if encryption > 0 {
            frame.push(
                EffectChannel::RiskReduction,
                Modifier::additive(ENCRYPTION_REDUCTION_PER_LEVEL * encryption as f64, SourceTag::Upgrade),
            );
        }

        let scrubbers = self.level(UpgradeId::Scrubbers);
        if scrubbers > 0 {
            frame.push(
                EffectChannel::RiskDecay,
                Modifier::additive(SCRUBBER_DECAY_PER_LEVEL * scrubbers as f64, SourceTag::Upgrade),
            );
        }

        let routing = self.level(UpgradeId::Routing);
        if routing > 0 {
            frame.push(
                EffectChannel::Efficiency,
                Modifier::additive(ROUTING_EFFICIENCY_PER_LEVEL * routing as f64, SourceTag::Upgrade),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::apply;

    #[test]
    fn test_cost_grows_geometrically() {
        let config = UpgradeConfig::default();
        let mut levels = UpgradeLevels::new();
        assert_eq!(levels.next_cost(UpgradeId::Routing, &config), 30.0);
        levels.set_level(UpgradeId::Routing, 2);
        assert!((levels.next_cost(UpgradeId::Routing, &config) - 30.0 * 1.6 * 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_no_levels_contribute_nothing() {
        let mut frame = ModifierFrame::default();
        UpgradeLevels::new().contribute(&mut frame);
        for channel in EffectChannel::ALL {
            assert!(frame.get(channel).is_empty());
        }
    }

    #[test]
    fn test_compression_multiplies_bandwidth() {
        let mut levels = UpgradeLevels::new();
        levels.set_level(UpgradeId::Compression, 3);
        let mut frame = ModifierFrame::default();
        levels.contribute(&mut frame);
        assert!((apply(10.0, frame.get(EffectChannel::BwMultiplier)) - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_level() {
        let config = UpgradeConfig { max_level: 2, ..UpgradeConfig::default() };
        let mut levels = UpgradeLevels::new();
        levels.set_level(UpgradeId::Scrubbers, 2);
        assert!(levels.is_maxed(UpgradeId::Scrubbers, &config));
        assert!(!levels.is_maxed(UpgradeId::Encryption, &config));
    }
}
