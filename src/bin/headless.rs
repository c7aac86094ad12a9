//! Headless Runner
//!
//! Runs a seeded bot against the simulation for a fixed span of game time and
//! prints a JSON or text report. Several seeds can run in parallel.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use undernet::analysis::{AdaptationReport, StabilityState};
use undernet::core::error::{ActionError, Result};
use undernet::core::types::{DoctrineId, ResourceId, UpgradeId};
use undernet::core::SimulationConfig;
use undernet::simulation::{Simulation, SimulationEvent, SimulationState, TickSubscriber};

/// Headless Runner - seeded bot play for balance checks
#[derive(Parser, Debug)]
#[command(name = "undernet_headless")]
#[command(about = "Run a seeded bot against the simulation and report the outcome")]
struct Args {
    /// Game seconds to simulate
    #[arg(long, default_value_t = 600.0)]
    seconds: f64,

    /// Real seconds per scheduler step
    #[arg(long, default_value_t = 0.1)]
    step: f64,

    /// Speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Random seed for deterministic runs (first seed when --runs > 1)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runs with consecutive seeds
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Risk fraction of the collapse threshold at which the bot sells nodes
    #[arg(long, default_value_t = 0.8)]
    caution: f64,

    /// Optional TOML config overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    game_seconds: f64,
    ticks: u64,
    tier: String,
    nodes: usize,
    resources: BTreeMap<String, f64>,
    collapses: BTreeMap<String, u32>,
    equilibrium_reached: u32,
    equilibrium_lost: u32,
    in_equilibrium: bool,
    stability: StabilityState,
    actions_taken: u32,
    actions_refused: u32,
    adaptation: AdaptationReport,
}

#[derive(Default)]
struct BotStats {
    taken: u32,
    refused: u32,
}

/// Bot that acts once per slow tick
struct Bot {
    rng: ChaCha8Rng,
    caution: f64,
    stats: Rc<RefCell<BotStats>>,
}

impl Bot {
    fn attempt<T>(&mut self, action: &str, result: std::result::Result<T, ActionError>) {
        let mut stats = self.stats.borrow_mut();
        match result {
            Ok(_) => stats.taken += 1,
            Err(err) => {
                stats.refused += 1;
                tracing::debug!(action, %err, "bot action refused");
            }
        }
    }
}

impl TickSubscriber for Bot {
    fn on_slow_tick(&mut self, state: &mut SimulationState, _events: &[SimulationEvent]) {
        if let Some(index) = state.nodes().nodes().iter().position(|n| n.degraded) {
            let result = state.repair_node(index);
            self.attempt("repair", result);
        }

        let risk = state.get_resource(ResourceId::DetectionRisk);
        let limit = self.caution * state.config().risk.collapse_threshold;
        if risk > limit && !state.nodes().is_empty() {
            let last = state.nodes().len() - 1;
            let result = state.remove_node(last);
            self.attempt("remove", result);
            return;
        }

        match self.rng.gen_range(0..10) {
            0..=4 => {
                let result = state.deploy_node(None);
                self.attempt("deploy", result);
            }
            5 | 6 if !state.nodes().is_empty() => {
                let index = self.rng.gen_range(0..state.nodes().len());
                let result = state.upgrade_node(index);
                self.attempt("upgrade", result);
            }
            7 | 8 => {
                let id = UpgradeId::ALL[self.rng.gen_range(0..UpgradeId::ALL.len())];
                let result = state.purchase_upgrade(id);
                self.attempt("buy", result);
            }
            9 => {
                let id = DoctrineId::ALL[self.rng.gen_range(0..DoctrineId::ALL.len())];
                let result = state.switch_doctrine(id);
                self.attempt("doctrine", result);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("undernet=warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    config
        .validate()
        .map_err(undernet::core::UndernetError::InvalidConfig)?;

    let first_seed = args.seed.unwrap_or_else(rand::random);
    let seeds: Vec<u64> = (0..args.runs.max(1) as u64)
        .map(|i| first_seed.wrapping_add(i))
        .collect();

    let reports = seeds
        .into_par_iter()
        .map(|seed| run_once(&args, config.clone(), seed))
        .collect::<Result<Vec<RunReport>>>()?;

    match args.format.as_str() {
        "text" => {
            for report in &reports {
                print_text(report);
            }
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            if let [single] = reports.as_slice() {
                println!("{}", serde_json::to_string_pretty(single)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
    }

    Ok(())
}

fn run_once(args: &Args, config: SimulationConfig, seed: u64) -> Result<RunReport> {
    let mut sim = Simulation::new(config)?;
    sim.scheduler_mut().set_speed(args.speed);

    let stats = Rc::new(RefCell::new(BotStats::default()));
    sim.subscribe(Box::new(Bot {
        rng: ChaCha8Rng::seed_from_u64(seed),
        caution: args.caution.clamp(0.0, 1.0),
        stats: Rc::clone(&stats),
    }));

    let mut collapses: BTreeMap<String, u32> = BTreeMap::new();
    let mut reached = 0;
    let mut lost = 0;

    let step = if args.step > 0.0 { args.step } else { 0.1 };
    while sim.state().clock() < args.seconds {
        for event in sim.update(step) {
            match event {
                SimulationEvent::CollapseTriggered { collapse_type, .. } => {
                    *collapses.entry(format!("{:?}", collapse_type)).or_default() += 1;
                }
                SimulationEvent::EquilibriumReached { .. } => reached += 1,
                SimulationEvent::EquilibriumLost { .. } => lost += 1,
                _ => {}
            }
        }
    }

    let state = sim.state();
    let (taken, refused) = {
        let stats = stats.borrow();
        (stats.taken, stats.refused)
    };
    tracing::info!(seed, clock = state.clock(), "run finished");

    Ok(RunReport {
        seed,
        game_seconds: state.clock(),
        ticks: state.tick_count(),
        tier: state.tier().name.clone(),
        nodes: state.nodes().len(),
        resources: ResourceId::ALL
            .iter()
            .map(|id| (id.name().to_string(), state.get_resource(*id)))
            .collect(),
        collapses,
        equilibrium_reached: reached,
        equilibrium_lost: lost,
        in_equilibrium: state.is_in_equilibrium(),
        stability: state.equilibrium().state,
        actions_taken: taken,
        actions_refused: refused,
        adaptation: state.get_adaptation_report(),
    })
}

fn print_text(report: &RunReport) {
    println!("Run Result");
    println!("==========");
    println!("Seed: {}", report.seed);
    println!("Game time: {:.1}s over {} ticks", report.game_seconds, report.ticks);
    println!("Tier: {} ({} nodes)", report.tier, report.nodes);
    for (name, value) in &report.resources {
        println!("  {:<16} {:>10.2}", name, value);
    }
    println!("Collapses: {:?}", report.collapses);
    println!(
        "Equilibrium: reached {} / lost {} (now {}), stability {:?}",
        report.equilibrium_reached, report.equilibrium_lost, report.in_equilibrium, report.stability
    );
    println!(
        "Adaptation: skill {:.3}, level {:.3}, risk gain x{:.2}",
        report.adaptation.skill_score, report.adaptation.adaptation_level, report.adaptation.scalars.risk_gain
    );
    println!();
}
