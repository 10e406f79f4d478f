use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mailbox::{BoilerConfig, Mailbox, Message, Mode};
use sim::{BoilerPlant, PumpFault, SensorFault};
use supervisor::SteamBoilerController;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Debug, ValueEnum)]
enum Scenario {
    Normal,
    LevelSensorFailure,
    StuckPump,
    SteamSensorFailure,
    TransmissionLoss,
}

#[derive(Parser, Debug)]
#[command(
    name = "steam-boiler",
    version,
    about = "Steam boiler control law driven against a simulated plant"
)]
struct Args {
    #[arg(value_enum, long, default_value = "normal")]
    scenario: Scenario,

    /// Number of 5 second control cycles
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// True water level at start (litres)
    #[arg(long, default_value_t = 150.0)]
    initial_level: f64,

    /// Cycle at which the scenario's fault is injected
    #[arg(long, default_value_t = 40)]
    fault_at: u64,

    /// Cycles the fault lasts before the unit is repaired
    #[arg(long, default_value_t = 15)]
    repair_after: u64,

    /// Standard deviation of sensor noise
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Boiler characteristics as JSON (defaults to the two-pump reference boiler)
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

#[derive(serde::Serialize)]
struct TraceRow<'a> {
    tick: u64,
    true_level: f64,
    measured_level: Option<f64>,
    steam: f64,
    mode: Mode,
    valve_open: bool,
    open_pumps: usize,
    outbound: &'a Mailbox,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BoilerConfig::default(),
    };
    let mut controller =
        SteamBoilerController::new(config.clone()).context("invalid boiler characteristics")?;
    let mut plant = BoilerPlant::new(config, args.initial_level, args.seed);
    plant.level_sensor.noise_std = args.noise;
    plant.steam_sensor.noise_std = args.noise;

    // Output JSONL trace to stdout (one object per line)
    for tick in 0..args.ticks {
        if tick == args.fault_at {
            inject(&args.scenario, &mut plant);
        }
        if tick == args.fault_at + args.repair_after {
            repair(&args.scenario, &mut plant);
        }

        let inbound = plant.inbound();
        let outbound = controller.tick(&inbound);
        plant.apply(&outbound);

        let row = TraceRow {
            tick,
            true_level: plant.level,
            measured_level: inbound.iter().find_map(|m| match *m {
                Message::Level(v) => Some(v),
                _ => None,
            }),
            steam: plant.steam,
            mode: controller.mode(),
            valve_open: plant.valve_open,
            open_pumps: plant.open_pumps(),
            outbound: &outbound,
        };
        println!("{}", serde_json::to_string(&row)?);

        if controller.mode().is_terminal() {
            tracing::info!(tick, status = %controller.status_message(), "controller stopped");
            break;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: &Path) -> Result<BoilerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn inject(s: &Scenario, plant: &mut BoilerPlant) {
    match s {
        Scenario::Normal => {}
        Scenario::LevelSensorFailure => {
            plant.fail_level_sensor(SensorFault::Stuck { value: -1.0 });
        }
        Scenario::StuckPump => plant.fail_pump(0, PumpFault::StuckOpen),
        Scenario::SteamSensorFailure => {
            plant.fail_steam_sensor(SensorFault::Stuck { value: 75.0 });
        }
        Scenario::TransmissionLoss => plant.lose_transmission = true,
    }
}

fn repair(s: &Scenario, plant: &mut BoilerPlant) {
    match s {
        Scenario::LevelSensorFailure => plant.repair_level_sensor(),
        Scenario::StuckPump => plant.repair_pump(0),
        Scenario::SteamSensorFailure => plant.repair_steam_sensor(),
        Scenario::Normal | Scenario::TransmissionLoss => {}
    }
}
