//! Resource registry - the single source of truth for every tracked quantity

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Persists across ticks
    pub value: f64,
    /// Display-only, overwritten every tick
    pub per_second: f64,
}

impl Resource {
    pub fn new(id: ResourceId, value: f64) -> Self {
        Self {
            id,
            value,
            per_second: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: AHashMap<ResourceId, Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every known resource present at zero
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for id in ResourceId::ALL {
            registry.register(id, 0.0);
        }
        registry
    }

    /// Register `id` with a default value. Existing entries are kept.
    pub fn register(&mut self, id: ResourceId, default_value: f64) {
        self.resources
            .entry(id)
            .or_insert_with(|| Resource::new(id, default_value));
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    pub fn value(&self, id: ResourceId) -> f64 {
        self.resources.get(&id).map(|r| r.value).unwrap_or(0.0)
    }

    pub fn per_second(&self, id: ResourceId) -> f64 {
        self.resources.get(&id).map(|r| r.per_second).unwrap_or(0.0)
    }

    pub fn set_value(&mut self, id: ResourceId, value: f64) {
        self.entry(id).value = value;
    }

    pub fn set_per_second(&mut self, id: ResourceId, per_second: f64) {
        self.entry(id).per_second = per_second;
    }

    pub fn set(&mut self, id: ResourceId, value: f64, per_second: f64) {
        let resource = self.entry(id);
        resource.value = value;
        resource.per_second = per_second;
    }

    /// Every resource, ordered by id
    pub fn sorted(&self) -> Vec<Resource> {
        let mut all: Vec<Resource> = self.resources.values().copied().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    fn entry(&mut self, id: ResourceId) -> &mut Resource {
        self.resources.entry(id).or_insert_with(|| Resource::new(id, 0.0))
    }
}
