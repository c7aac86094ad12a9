//! Integration tests for saving and loading through the filesystem

use std::path::PathBuf;

use undernet::core::error::UndernetError;
use undernet::core::types::{DoctrineId, ResourceId, UpgradeId};
use undernet::core::SimulationConfig;
use undernet::simulation::{load_from_file, load_state, save_to_file, Simulation};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("undernet_{}_{}.json", name, std::process::id()))
}

#[test]
fn test_file_round_trip_preserves_progress() {
    let path = temp_path("round_trip");
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.state_mut().deploy_node(None).unwrap();
    sim.state_mut().deploy_node(None).unwrap();
    for _ in 0..200 {
        sim.update(0.1);
    }
    sim.state_mut().switch_doctrine(DoctrineId::Stealth).ok();

    save_to_file(sim.state(), &path).unwrap();
    let restored = load_from_file(&path, SimulationConfig::default()).unwrap();
    std::fs::remove_file(&path).ok();

    let original = sim.state();
    assert_eq!(restored.nodes().len(), 2);
    assert_eq!(restored.tick_count(), original.tick_count());
    assert_eq!(restored.doctrine(), original.doctrine());
    assert_eq!(restored.tier().name, original.tier().name);
    assert!((restored.clock() - original.clock()).abs() < 1e-9);
    for id in ResourceId::ALL {
        assert!(
            (restored.get_resource(id) - original.get_resource(id)).abs() < 1e-9,
            "{} differs after reload",
            id.name()
        );
    }
}

#[test]
fn test_simulation_load_replaces_state() {
    let path = temp_path("sim_load");
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.state_mut().set_resource(ResourceId::Influence, 300.0);
    sim.state_mut().purchase_upgrade(UpgradeId::Scrubbers).unwrap();
    sim.save(&path).unwrap();

    let mut other = Simulation::new(SimulationConfig::default()).unwrap();
    other.load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(other.state().upgrades().level(UpgradeId::Scrubbers), 1);
    assert!((other.state().get_resource(ResourceId::Influence) - sim.state().get_resource(ResourceId::Influence)).abs() < 1e-9);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let path = temp_path("does_not_exist");
    std::fs::remove_file(&path).ok();
    let result = load_from_file(&path, SimulationConfig::default());
    assert!(matches!(result, Err(UndernetError::IoError(_))));
}

#[test]
fn test_corrupt_file_starts_fresh() {
    let path = temp_path("corrupt");
    std::fs::write(&path, "{ this is not json").unwrap();
    let state = load_from_file(&path, SimulationConfig::default()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(state.nodes().len(), 0);
    assert_eq!(state.clock(), 0.0);
    assert_eq!(
        state.get_resource(ResourceId::Influence),
        SimulationConfig::default().starting_influence
    );
}

#[test]
fn test_version_one_save_is_migrated() {
    let content = r#"{
        "clock": 42.0,
        "tier": "street",
        "resources": { "influence": 120.0, "detection_risk": 12.5, "plasma": 3.0 },
        "nodes": []
    }"#;
    let state = load_state(content, SimulationConfig::default()).unwrap();
    assert_eq!(state.clock(), 42.0);
    assert_eq!(state.get_resource(ResourceId::Influence), 120.0);
    assert_eq!(state.get_resource(ResourceId::DetectionRisk), 12.5);
    assert_eq!(state.tick_count(), 0);
    assert_eq!(state.doctrine(), DoctrineId::Balanced);
}

#[test]
fn test_saved_state_with_out_of_range_values_is_clamped() {
    let content = r#"{
        "version": 3,
        "clock": -5.0,
        "tick_count": 7,
        "tier": "nowhere",
        "resources": {
            "influence": { "value": 1e12, "per_second": 0.0 },
            "detection_risk": { "value": 250.0, "per_second": 1.0 }
        },
        "nodes": [],
        "upgrades": { "compression": 999 },
        "doctrine": "balanced",
        "constraints": {}
    }"#;
    let state = load_state(content, SimulationConfig::default()).unwrap();
    assert_eq!(state.clock(), 0.0);
    assert_eq!(state.tier().name, "street");
    assert_eq!(state.get_resource(ResourceId::Influence), state.influence_cap());
    assert_eq!(state.get_resource(ResourceId::DetectionRisk), 100.0);
    assert_eq!(
        state.upgrades().level(UpgradeId::Compression),
        SimulationConfig::default().upgrades.max_level
    );
}
