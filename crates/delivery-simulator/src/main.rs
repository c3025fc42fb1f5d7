//! Delivery Simulator CLI
//!
//! Loads a scenario, runs the simulation on a fixed tick and streams view
//! events as JSON lines.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use delivery_simulator::{ConsoleController, Scenario, SimConfig, SimulationModel};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "delivery-simulator")]
#[command(about = "Simulate battery-powered delivery drones")]
struct Args {
    /// Scenario file
    #[arg(short, long, default_value = "scenarios/campus.json")]
    scenario: PathBuf,

    /// Simulated seconds per tick
    #[arg(long, default_value = "0.1")]
    dt: f64,

    /// Wall-clock milliseconds between ticks
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Number of ticks to run
    #[arg(long, default_value = "6000")]
    ticks: u64,

    /// Run as fast as possible instead of pacing ticks
    #[arg(long)]
    no_pace: bool,

    /// RNG seed (overrides SIM_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Accept every additional-delivery prompt
    #[arg(long)]
    auto_accept: bool,

    /// Write events to this file instead of stdout
    #[arg(long)]
    events: Option<PathBuf>,

    /// Log a fleet summary every N ticks (0 disables)
    #[arg(long, default_value = "200")]
    summary_every: u64,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.dt > 0.0, "--dt must be positive");

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = SimConfig::from_env();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;

    init_tracing(&config.log_level, args.log_json);

    let scenario = Scenario::load(&args.scenario)?;
    let out: Box<dyn Write> = match &args.events {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut model = SimulationModel::new(ConsoleController::new(out), config);
    let created = scenario.populate(&mut model);
    let mut trips = scenario.trip_queue();
    let auto_accept = args.auto_accept || scenario.auto_accept;

    info!(
        scenario = %scenario.name,
        run_id = %model.controller().run_id(),
        entities = created.len(),
        trips = trips.len(),
        auto_accept,
        "Starting delivery simulation"
    );
    info!("Tick: {}s sim / {}ms wall, {} ticks", args.dt, args.tick_ms, args.ticks);

    let mut interval = tokio::time::interval(Duration::from_millis(args.tick_ms));
    let mut clock = 0.0;

    for tick in 0..args.ticks {
        if !args.no_pace {
            tokio::select! {
                _ = interval.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    warn!(tick, "Interrupted");
                    break;
                }
            }
        }

        for trip in trips.due(clock) {
            model.schedule_trip(&trip);
        }

        model.update(args.dt);
        clock += args.dt;

        for prompt in model.controller_mut().take_prompts() {
            if auto_accept {
                let accepted = model.pit_stop_by_name(&prompt.drone, &prompt.poi);
                info!(drone = %prompt.drone, poi = %prompt.poi, accepted, "Additional delivery prompt");
            }
        }

        if args.summary_every > 0 && tick > 0 && tick % args.summary_every == 0 {
            log_summary(&model, clock);
        }
    }

    model.stop();
    log_summary(&model, clock);
    info!(events = model.controller().events_written(), "Simulation complete");

    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("delivery_simulator={level}")));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_writer(io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

fn log_summary<W: Write>(model: &SimulationModel<ConsoleController<W>>, clock: f64) {
    let fleet = model.fleet();
    let drones: Vec<_> = model.entities().filter_map(|e| Some((e, e.as_drone()?))).collect();
    let delivered = model
        .entities()
        .filter_map(|e| e.as_package())
        .filter(|p| p.is_delivered())
        .count();

    info!(
        "--- FLEET @ {:.1}s | drones {} | dead {} | charging {} | functional {} | stations {} | delivered {} ---",
        clock,
        drones.len(),
        fleet.dead_drones().len(),
        fleet.charging_drones().len(),
        fleet.functional_drones().len(),
        fleet.recharge_stations().len(),
        delivered
    );
    for (entity, drone) in drones {
        let charge = drone.battery.as_ref().map(|b| b.current_charge());
        info!(
            "  {} @ {} | charge {:?} | state {:?}",
            entity.name(),
            entity.core.position,
            charge,
            drone.battery.as_ref().map(|b| b.state())
        );
    }
}
