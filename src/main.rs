//! Undernet - Entry Point
//!
//! Interactive shell around the simulation. Each `tick` advances the
//! scheduler by one 100ms step of real time; the speed multiplier scales the
//! game time that step produces.
//!
//! Pass a TOML config path as the first argument to override the defaults.

use std::io::{self, Write};
use std::path::Path;

use undernet::core::error::Result;
use undernet::core::types::{ConstraintId, DistrictId, DoctrineId, ResourceId, UpgradeId};
use undernet::core::SimulationConfig;
use undernet::simulation::{Simulation, SimulationEvent};

const STEP_SECONDS: f64 = 0.1;

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("undernet=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(Path::new(&path))?,
        None => SimulationConfig::default(),
    };
    let mut sim = Simulation::new(config)?;

    tracing::info!("Undernet starting...");

    println!("\n=== UNDERNET ===");
    println!("Grow the network. Stay under the radar.");
    println!();
    print_help();

    loop {
        display_status(&sim);

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let arg = parts.next();

        match command {
            "quit" | "q" => break,
            "help" | "h" => print_help(),
            "tick" | "t" => {
                let events = sim.update(STEP_SECONDS);
                print_events(&events);
            }
            "run" => match arg.and_then(|a| a.parse::<u32>().ok()) {
                Some(n) => {
                    println!("Running {} steps...", n);
                    for _ in 0..n {
                        let events = sim.update(STEP_SECONDS);
                        print_events(&events);
                    }
                }
                None => println!("Usage: run <number>"),
            },
            "deploy" => {
                let district = arg.and_then(|a| a.parse::<u32>().ok()).map(DistrictId);
                match sim.state_mut().deploy_node(district) {
                    Ok(id) => println!("Deployed node #{}", id.0),
                    Err(e) => println!("Cannot deploy: {}", e),
                }
            }
            "remove" => with_index(arg, "remove", |i| match sim.state_mut().remove_node(i) {
                Ok(node) => println!("Removed node #{}", node.id.0),
                Err(e) => println!("Cannot remove: {}", e),
            }),
            "upgrade" => with_index(arg, "upgrade", |i| match sim.state_mut().upgrade_node(i) {
                Ok(level) => println!("Node {} is now level {}", i, level),
                Err(e) => println!("Cannot upgrade: {}", e),
            }),
            "repair" => with_index(arg, "repair", |i| match sim.state_mut().repair_node(i) {
                Ok(()) => println!("Node {} repaired", i),
                Err(e) => println!("Cannot repair: {}", e),
            }),
            "doctrine" => match arg.map(str::parse::<DoctrineId>) {
                Some(Ok(id)) => match sim.state_mut().switch_doctrine(id) {
                    Ok(()) => println!("Doctrine is now {}", id.name()),
                    Err(e) => println!("Cannot switch: {}", e),
                },
                Some(Err(e)) => println!("{}", e),
                None => println!("Usage: doctrine <balanced|aggressive|stealth|efficient>"),
            },
            "buy" => match arg.map(str::parse::<UpgradeId>) {
                Some(Ok(id)) => match sim.state_mut().purchase_upgrade(id) {
                    Ok(level) => println!("{} is now level {}", id.name(), level),
                    Err(e) => println!("Cannot buy: {}", e),
                },
                Some(Err(e)) => println!("{}", e),
                None => println!("Usage: buy <compression|encryption|scrubbers|routing|capacitors>"),
            },
            "pause" | "p" => {
                let paused = sim.scheduler_mut().toggle_pause();
                println!("{}", if paused { "Paused" } else { "Resumed" });
            }
            "speed" => match arg.and_then(|a| a.parse::<f64>().ok()) {
                Some(x) => println!("Speed set to {:.1}x", sim.scheduler_mut().set_speed(x)),
                None => println!("Usage: speed <multiplier>"),
            },
            "status" | "s" => display_detailed_status(&sim),
            "save" => match arg {
                Some(path) => match sim.save(Path::new(path)) {
                    Ok(()) => println!("Saved to {}", path),
                    Err(e) => println!("Save failed: {}", e),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match arg {
                Some(path) => match sim.load(Path::new(path)) {
                    Ok(()) => println!("Loaded {}", path),
                    Err(e) => println!("Load failed: {}", e),
                },
                None => println!("Usage: load <path>"),
            },
            _ => println!("Unknown command. Type 'help' for the list."),
        }
    }

    println!(
        "\nGoodbye! Final state: {} nodes, {:.1}s of game time, {} collapses.",
        sim.state().nodes().len(),
        sim.state().clock(),
        sim.state().total_collapses()
    );
    Ok(())
}

fn with_index(arg: Option<&str>, command: &str, mut action: impl FnMut(usize)) {
    match arg.and_then(|a| a.parse::<usize>().ok()) {
        Some(i) => action(i),
        None => println!("Usage: {} <node index>", command),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  tick / t          - Advance one step");
    println!("  run <n>           - Advance n steps");
    println!("  deploy [district] - Deploy a node");
    println!("  remove <i>        - Remove node i");
    println!("  upgrade <i>       - Upgrade node i");
    println!("  repair <i>        - Repair degraded node i");
    println!("  doctrine <name>   - Switch doctrine");
    println!("  buy <upgrade>     - Buy an upgrade level");
    println!("  pause / p         - Toggle pause");
    println!("  speed <x>         - Set speed multiplier");
    println!("  status / s        - Show detailed status");
    println!("  save <path>       - Save game");
    println!("  load <path>       - Load game");
    println!("  quit / q          - Exit");
    println!();
}

fn print_events(events: &[SimulationEvent]) {
    for event in events {
        match event {
            SimulationEvent::CollapseTriggered { collapse_type, report, .. } => println!(
                "!! COLLAPSE ({:?}): lost {:.1} influence, {} nodes cleared",
                collapse_type, report.influence_lost, report.nodes_cleared
            ),
            SimulationEvent::EquilibriumReached { at } => println!("-- Equilibrium reached at {:.1}s", at),
            SimulationEvent::EquilibriumLost { at } => println!("-- Equilibrium lost at {:.1}s", at),
            SimulationEvent::TierChanged { from, to } => println!("** Tier advanced: {} -> {}", from, to),
            SimulationEvent::NodeDegraded { node } => println!("   Node #{} degraded", node.0),
            SimulationEvent::ResourceChanged { .. } => {}
        }
    }
}

/// Display a brief status summary
fn display_status(sim: &Simulation) {
    let state = sim.state();
    println!();
    println!(
        "--- {:.1}s | {} | Influence {:.1} ({:+.2}/s) | Risk {:.1} | Nodes {}/{}{} ---",
        state.clock(),
        state.tier().name,
        state.get_resource(ResourceId::Influence),
        state.get_per_second(ResourceId::Influence),
        state.get_resource(ResourceId::DetectionRisk),
        state.nodes().len(),
        state.tier().node_capacity,
        if sim.scheduler().is_paused() { " | PAUSED" } else { "" },
    );
}

/// Display every resource, constraint and the analysis layer
fn display_detailed_status(sim: &Simulation) {
    let state = sim.state();
    println!();
    println!("=== Detailed Status ({:.1}s, tick {}) ===", state.clock(), state.tick_count());
    println!(
        "Tier: {}  Doctrine: {}  Speed: {:.1}x",
        state.tier().name,
        state.doctrine().name(),
        sim.scheduler().speed()
    );
    println!();

    println!("Resources:");
    for id in ResourceId::ALL {
        println!(
            "  {:<16} {:>10.2}  ({:+.3}/s)",
            id.name(),
            state.get_resource(id),
            state.get_per_second(id)
        );
    }

    println!("Constraints:");
    for id in ConstraintId::ALL {
        if let Some(c) = state.get_constraint(id) {
            println!(
                "  {:<8} {:<8} {:>6.1}/{:<6.1} {:?}",
                id.name(),
                if c.active { "active" } else { "off" },
                c.value,
                c.collapse_threshold,
                c.collapse_type
            );
        }
    }

    println!("Nodes (next deploy costs {:.1}):", state.deploy_cost());
    for (i, node) in state.nodes().nodes().iter().enumerate() {
        println!(
            "  [{}] #{} L{}{}",
            i,
            node.id.0,
            node.level,
            if node.degraded { " DEGRADED" } else { "" }
        );
    }

    println!("Upgrades:");
    for id in UpgradeId::ALL {
        println!(
            "  {:<12} L{:<2} next {:.1}",
            id.name(),
            state.upgrades().level(id),
            state.upgrades().next_cost(id, &state.config().upgrades)
        );
    }

    let eq = state.equilibrium();
    println!(
        "Stability: {:?} (d1 {:+.3}, d2 {:+.3}), equilibrium: {} ({:.1}s)",
        eq.state, eq.first_derivative, eq.second_derivative, eq.in_equilibrium, eq.timer
    );

    let report = state.get_adaptation_report();
    println!(
        "Adaptation: skill {:.3}, level {:.3}, risk gain x{:.2}, upkeep x{:.2}, regen x{:.2}",
        report.skill_score,
        report.adaptation_level,
        report.scalars.risk_gain,
        report.scalars.maintenance_cost,
        report.scalars.constraint_regen
    );
    println!("Collapses so far: {}", state.total_collapses());
    println!();
}
