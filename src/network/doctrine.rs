//! Doctrines - mutually exclusive global strategies

use crate::core::types::{DoctrineId, EffectChannel};
use crate::modifiers::{Modifier, ModifierFrame, SourceTag};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Doctrine {
    pub id: DoctrineId,
    pub influence_multiplier: f64,
    pub risk_multiplier: f64,
    pub energy_multiplier: f64,
    /// Influence paid to switch into this doctrine
    pub switch_cost: f64,
}

impl Doctrine {
    pub fn get(id: DoctrineId) -> Self {
        match id {
            DoctrineId::Balanced => Self {
                id,
                influence_multiplier: 1.0,
                risk_multiplier: 1.0,
                energy_multiplier: 1.0,
                switch_cost: 0.0,
            },
            DoctrineId::Aggressive => Self {
                id,
                influence_multiplier: 1.5,
                risk_multiplier: 1.4,
                energy_multiplier: 1.1,
                switch_cost: 50.0,
            },
            DoctrineId::Stealth => Self {
                id,
                influence_multiplier: 0.75,
                risk_multiplier: 0.6,
                energy_multiplier: 1.0,
                switch_cost: 50.0,
            },
            DoctrineId::Efficient => Self {
                id,
                influence_multiplier: 1.0,
                risk_multiplier: 1.0,
                energy_multiplier: 0.7,
                switch_cost: 40.0,
            },
        }
    }

    /// Push this doctrine's multipliers into the tick's modifier frame
    pub fn contribute(&self, frame: &mut ModifierFrame) {
        frame.push(
            EffectChannel::Efficiency,
            Modifier::multiplicative(self.influence_multiplier, SourceTag::Doctrine),
        );
        frame.push(
            EffectChannel::RiskGain,
            Modifier::multiplicative(self.risk_multiplier, SourceTag::Doctrine),
        );
        frame.push(
            EffectChannel::EnergyDrain,
            Modifier::multiplicative(self.energy_multiplier, SourceTag::Doctrine),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::apply;

    #[test]
    fn test_balanced_is_neutral() {
        let mut frame = ModifierFrame::default();
        Doctrine::get(DoctrineId::Balanced).contribute(&mut frame);
        assert_eq!(apply(3.0, frame.get(EffectChannel::Efficiency)), 3.0);
        assert_eq!(apply(3.0, frame.get(EffectChannel::RiskGain)), 3.0);
        assert_eq!(apply(3.0, frame.get(EffectChannel::EnergyDrain)), 3.0);
    }

    #[test]
    fn test_stealth_trades_influence_for_risk() {
        let d = Doctrine::get(DoctrineId::Stealth);
        assert!(d.influence_multiplier < 1.0);
        assert!(d.risk_multiplier < 1.0);
        assert!(d.switch_cost > 0.0);
    }
}
