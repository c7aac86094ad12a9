//! Constraints - thresholded wrappers around resources
//!
//! The set is kept sorted by ascending priority. Sorting is stable, so two
//! constraints with equal priority keep their registration order.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::ActionError;
use crate::core::types::{CollapseType, ConstraintId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub active: bool,
    /// Lower runs earlier
    pub priority: i32,
    pub value: f64,
    pub max_value: f64,
    pub rate: f64,
    pub collapse_type: CollapseType,
    pub collapse_threshold: f64,
}

impl Constraint {
    pub fn new(
        id: ConstraintId,
        priority: i32,
        collapse_type: CollapseType,
        collapse_threshold: f64,
        max_value: f64,
    ) -> Self {
        Self {
            id,
            active: true,
            priority,
            value: 0.0,
            max_value,
            rate: 0.0,
            collapse_type,
            collapse_threshold,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn sync(&mut self, value: f64, rate: f64) {
        self.value = value;
        self.rate = rate;
    }

    pub fn is_breached(&self) -> bool {
        self.active && self.value >= self.collapse_threshold
    }

    /// Fraction of the way to the collapse threshold, 0..=1
    pub fn pressure(&self) -> f64 {
        if self.collapse_threshold <= 0.0 {
            return 0.0;
        }
        (self.value / self.collapse_threshold).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    entries: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Risk, energy and thermal slots built from config
    pub fn with_defaults(config: &SimulationConfig, energy_enabled: bool) -> Self {
        let mut set = Self::new();
        set.register(Constraint::new(
            ConstraintId::Risk,
            0,
            CollapseType::SoftReset,
            config.risk.collapse_threshold,
            config.risk.max,
        ));

        let energy = Constraint::new(
            ConstraintId::Energy,
            10,
            CollapseType::Blackout,
            config.energy.overload_threshold,
            config.energy.overload_threshold,
        );
        set.register(if energy_enabled { energy } else { energy.inactive() });

        // No built-in law drives thermal load; it stays off until something writes it
        set.register(
            Constraint::new(
                ConstraintId::Thermal,
                20,
                CollapseType::Meltdown,
                config.thermal.collapse_threshold,
                config.thermal.max,
            )
            .inactive(),
        );
        set
    }

    /// Add or replace a constraint, keeping priority order
    pub fn register(&mut self, constraint: Constraint) {
        if let Some(existing) = self.entries.iter_mut().find(|c| c.id == constraint.id) {
            *existing = constraint;
        } else {
            self.entries.push(constraint);
        }
        self.entries.sort_by_key(|c| c.priority);
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.entries.iter_mut().find(|c| c.id == id)
    }

    pub fn set_active(&mut self, id: ConstraintId, active: bool) -> Result<(), ActionError> {
        let constraint = self.get_mut(id).ok_or(ActionError::ConstraintNotRegistered)?;
        constraint.active = active;
        Ok(())
    }

    /// Ids of active constraints in dispatch order
    pub fn active_ids(&self) -> Vec<ConstraintId> {
        self.entries.iter().filter(|c| c.active).map(|c| c.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_priority_ordered() {
        let set = ConstraintSet::with_defaults(&SimulationConfig::default(), true);
        let ids: Vec<ConstraintId> = set.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ConstraintId::Risk, ConstraintId::Energy, ConstraintId::Thermal]);
        assert_eq!(set.active_ids(), vec![ConstraintId::Risk, ConstraintId::Energy]);
    }

    #[test]
    fn test_thermal_threshold_comes_from_config() {
        let mut config = SimulationConfig::default();
        config.thermal.max = 80.0;
        config.thermal.collapse_threshold = 60.0;
        let set = ConstraintSet::with_defaults(&config, false);
        let thermal = set.get(ConstraintId::Thermal).unwrap();
        assert_eq!(thermal.collapse_threshold, 60.0);
        assert_eq!(thermal.max_value, 80.0);
        assert!(!thermal.active);
    }

    #[test]
    fn test_energy_inactive_below_tier_threshold() {
        let set = ConstraintSet::with_defaults(&SimulationConfig::default(), false);
        assert_eq!(set.active_ids(), vec![ConstraintId::Risk]);
    }

    #[test]
    fn test_register_reorders_by_priority() {
        let mut set = ConstraintSet::with_defaults(&SimulationConfig::default(), true);
        set.register(Constraint::new(ConstraintId::Thermal, -5, CollapseType::Meltdown, 50.0, 100.0));
        assert_eq!(set.iter().next().unwrap().id, ConstraintId::Thermal);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let mut set = ConstraintSet::new();
        set.register(Constraint::new(ConstraintId::Energy, 1, CollapseType::Blackout, 1.0, 1.0));
        set.register(Constraint::new(ConstraintId::Thermal, 1, CollapseType::Meltdown, 1.0, 1.0));
        set.register(Constraint::new(ConstraintId::Risk, 1, CollapseType::SoftReset, 1.0, 1.0));
        let ids: Vec<ConstraintId> = set.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ConstraintId::Energy, ConstraintId::Thermal, ConstraintId::Risk]);
    }

    #[test]
    fn test_breach_requires_active() {
        let mut c = Constraint::new(ConstraintId::Risk, 0, CollapseType::SoftReset, 100.0, 100.0);
        c.sync(100.0, 1.0);
        assert!(c.is_breached());
        c.active = false;
        assert!(!c.is_breached());
    }

    #[test]
    fn test_set_active_on_missing_constraint() {
        let mut set = ConstraintSet::new();
        assert_eq!(
            set.set_active(ConstraintId::Thermal, true),
            Err(ActionError::ConstraintNotRegistered)
        );
    }
}
