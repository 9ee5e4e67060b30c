//! Packrunner CLI - Warehouse Robot Simulation Engine
//!
//! Drives a single-robot warehouse simulation: a tick-driven loop generates
//! orders, assigns them to the robot, and advances it along a snake-path
//! route, while an interactive command surface lets an operator start,
//! pause, and inspect the run.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use packrunner_sim::{PushAdapter, PushSink, Simulator, Snapshot};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "packrunner")]
#[command(author = "Packrunner Team")]
#[command(version = "0.1.0")]
#[command(about = "Warehouse Robot Simulation Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive simulation from a config file
    Run {
        /// Path to the JSON config file (written with defaults if missing)
        #[arg(short, long, default_value = "packrunner.config.json")]
        config: PathBuf,

        /// Random seed (defaults to a fixed value for reproducibility)
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Start running immediately instead of waiting for `start`
        #[arg(long)]
        autostart: bool,
    },
    /// Validate a config file without running a simulation
    Validate {
        /// Path to the JSON config file
        #[arg(short, long, default_value = "packrunner.config.json")]
        config: PathBuf,
    },
    /// Run a short, non-interactive demo and print a summary
    Demo {
        /// Duration in simulated seconds
        #[arg(short, long, default_value_t = 120.0)]
        duration: f64,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, seed, autostart } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_interactive(&config, seed, autostart))
        }
        Commands::Validate { config } => validate_config(&config),
        Commands::Demo { duration, seed } => run_demo(duration, seed),
    };

    if let Err(e) = result {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn validate_config(path: &std::path::Path) -> anyhow::Result<()> {
    println!("Validating config: {}", path.display());

    if !path.exists() {
        println!("  Note: file not found; the defaults that would be written are valid.");
        let defaults = packrunner_config::Config::default();
        packrunner_config::validate(&defaults)
            .map_err(|errs| anyhow::anyhow!("default config failed its own validation: {errs:?}"))?;
        println!("Config valid (defaults).");
        return Ok(());
    }

    match packrunner_config::load(path) {
        Ok(config) => {
            println!("Config valid.");
            println!("  Simulation: {} v{}", config.simulation.name, config.simulation.version);
            println!("  Warehouse: {}x{} aisles/racks", config.warehouse.aisles, config.warehouse.racks);
            println!("  Target FPS: {}", config.timing.target_fps);
            println!(
                "  Generation interval: {}s, max items/order: {}",
                config.orders.generation_interval, config.orders.max_items_per_order
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Config invalid: {e}");
            std::process::exit(1);
        }
    }
}

/// A push sink that prints frames to stdout when `debug_prints` is set;
/// the real transport (HTTP/WS) lives outside this core per §1/§6.
struct ConsolePushSink {
    verbose: bool,
}

impl PushSink for ConsolePushSink {
    fn publish(&mut self, snapshot: &Snapshot) {
        if self.verbose {
            if let Ok(json) = serde_json::to_string(snapshot) {
                println!("[push] {json}");
            }
        }
    }
}

/// Two cooperating tasks per §5: this task owns the `Simulator` and the
/// tick loop exclusively; a sibling task owns the Push Adapter and only
/// ever reads the `Snapshot`s this task publishes on `snapshot_tx`. Inbound
/// operator commands arrive on a bounded channel and never block `tick()`.
async fn run_interactive(config_path: &std::path::Path, seed: u64, autostart: bool) -> anyhow::Result<()> {
    println!("Loading config from: {}", config_path.display());
    let config = packrunner_config::load(config_path)?;
    let tick_interval = config.timing.tick_interval.max(1.0 / config.timing.target_fps as f64);
    let debug_prints = config.engine.debug_prints;

    println!(
        "Warehouse {}x{}, target FPS {}, generation every {}s",
        config.warehouse.aisles,
        config.warehouse.racks,
        config.timing.target_fps,
        config.orders.generation_interval,
    );
    println!("Type `help` for the list of commands.");

    let mut sim = Simulator::new(config, seed);
    if autostart {
        sim.start();
        println!("simulation started");
    }

    const COMMAND_CHANNEL_CAPACITY: usize = 32;
    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::channel::<CliCommand>(COMMAND_CHANNEL_CAPACITY);
    let (snapshot_tx, snapshot_rx) = tokio::sync::watch::channel(sim.snapshot());
    let shutdown = std::sync::Arc::new(tokio::sync::Notify::new());

    let stdin_task = tokio::task::spawn_blocking(move || read_commands(cmd_tx));
    let push_task = tokio::spawn(run_push_adapter(snapshot_rx, debug_prints, shutdown.clone()));

    let mut reset_seed = seed;
    let mut quit = false;
    while !quit {
        sim.tick()?;
        let _ = snapshot_tx.send(sim.snapshot());

        while let Ok(cmd) = cmd_rx.try_recv() {
            quit = apply_command(&mut sim, cmd, &mut reset_seed);
        }

        tokio::time::sleep(Duration::from_secs_f64(tick_interval)).await;
    }

    println!("Shutting down...");
    sim.stop();
    let _ = snapshot_tx.send(sim.snapshot());
    shutdown.notify_one();
    let _ = push_task.await;
    // The stdin task is blocked on a blocking read with no input pending;
    // it is intentionally left to be torn down with the process on exit.
    drop(stdin_task);
    Ok(())
}

/// The sibling task from §5: reads published snapshots and pushes frames
/// out at a cadence independent of the 60 Hz tick rate (default 10 Hz).
async fn run_push_adapter(
    mut snapshot_rx: tokio::sync::watch::Receiver<Snapshot>,
    debug_prints: bool,
    shutdown: std::sync::Arc<tokio::sync::Notify>,
) {
    let mut adapter = PushAdapter::new(10.0);
    let mut sink = ConsolePushSink { verbose: debug_prints };
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / 10.0));

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {
                if snapshot_rx.changed().await.is_err() {
                    break;
                }
                let snapshot = snapshot_rx.borrow_and_update().clone();
                let now = packrunner_core::SimTime::from_seconds(snapshot.simulation_state.sim_time_s);
                adapter.maybe_push(now, snapshot, &mut sink);
            }
        }
    }
}

enum CliCommand {
    Start,
    Stop,
    Pause,
    Resume,
    Speed(f64),
    Status,
    Stats,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

/// Runs on a blocking task (§5's inbound command channel); parses stdin
/// lines into the CLI command surface from §6.
fn read_commands(tx: tokio::sync::mpsc::Sender<CliCommand>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let cmd = match parts.next().unwrap_or("").to_lowercase().as_str() {
            "start" => CliCommand::Start,
            "stop" => CliCommand::Stop,
            "pause" => CliCommand::Pause,
            "resume" => CliCommand::Resume,
            "speed" => match parts.next().and_then(|v| v.parse::<f64>().ok()) {
                Some(x) => CliCommand::Speed(x),
                None => CliCommand::Unknown("speed requires a numeric argument".to_string()),
            },
            "status" => CliCommand::Status,
            "stats" => CliCommand::Stats,
            "reset" => CliCommand::Reset,
            "help" => CliCommand::Help,
            "quit" | "exit" => CliCommand::Quit,
            other => CliCommand::Unknown(format!("unknown command: {other}")),
        };
        // Bounded and non-blocking: a command backlog drops the newest
        // entry rather than stalling the reader thread.
        if cmd_tx_try_send(&tx, cmd).is_err() {
            break;
        }
    }
}

fn cmd_tx_try_send(tx: &tokio::sync::mpsc::Sender<CliCommand>, cmd: CliCommand) -> Result<(), ()> {
    match tx.try_send(cmd) {
        Ok(()) => Ok(()),
        Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => Ok(()),
        Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => Err(()),
    }
}

/// Applies one interactive command; returns `true` if the loop should exit.
fn apply_command(sim: &mut Simulator, cmd: CliCommand, reset_seed: &mut u64) -> bool {
    match cmd {
        CliCommand::Start => {
            sim.start();
            println!("ok: simulation running");
        }
        CliCommand::Stop => {
            sim.stop();
            println!("ok: simulation stopped");
        }
        CliCommand::Pause => {
            sim.pause();
            println!("ok: simulation paused");
        }
        CliCommand::Resume => {
            sim.resume();
            println!("ok: simulation resumed");
        }
        CliCommand::Speed(x) => {
            let result = sim.set_speed(x);
            if result.clamped {
                println!("warning: speed clamped to {:.2}", result.speed);
            } else {
                println!("ok: speed set to {:.2}", result.speed);
            }
        }
        CliCommand::Status => print_status(sim),
        CliCommand::Stats => print_stats(sim),
        CliCommand::Reset => {
            *reset_seed = reset_seed.wrapping_add(1);
            sim.reset(*reset_seed);
            println!("ok: simulation reset");
        }
        CliCommand::Help => print_help(),
        CliCommand::Quit => {
            println!("ok: quitting");
            return true;
        }
        CliCommand::Unknown(msg) => println!("error: {msg}"),
    }
    let _ = io::stdout().flush();
    false
}

fn print_help() {
    println!("Commands:");
    println!("  start         start the simulation");
    println!("  stop          stop the simulation");
    println!("  pause         pause the simulation");
    println!("  resume        resume a paused simulation");
    println!("  speed <x>     set the speed multiplier (0.1-10.0)");
    println!("  status        print current simulation/robot state");
    println!("  stats         print cumulative order/error statistics");
    println!("  reset         reinitialize the world (fresh robot, empty queue)");
    println!("  help          show this message");
    println!("  quit          stop and exit");
}

fn print_status(sim: &Simulator) {
    let snap = sim.snapshot();
    println!(
        "sim: state={:?} t={:.2}s speed={:.2} frame={}",
        sim.state(),
        snap.simulation_state.sim_time_s,
        snap.simulation_state.speed,
        snap.simulation_state.frame_count,
    );
    println!(
        "robot: state={} pos=({:.2},{:.2}) dir={} held={}/{} order={}",
        snap.robot.state,
        snap.robot.aisle,
        snap.robot.rack,
        snap.robot.direction,
        snap.robot.held_items,
        snap.robot.capacity,
        snap.robot.current_order.as_deref().unwrap_or("-"),
    );
    println!(
        "queue: pending={} completed={} failed={} peak={} avg_wait={:.2}s",
        snap.order.pending,
        snap.order.completed,
        snap.order.failed,
        snap.order.peak_size,
        snap.order.avg_wait_time_s,
    );
}

fn print_stats(sim: &Simulator) {
    let snap = sim.snapshot();
    println!(
        "kpi: avg_efficiency={:.3} recent_trend={:.3} completed={} failed={} avg_fulfillment={:.2}s",
        snap.kpi.avg_efficiency,
        snap.kpi.recent_trend,
        snap.kpi.orders_completed,
        snap.kpi.orders_failed,
        snap.kpi.avg_fulfillment_time_s,
    );
    println!(
        "inventory: {} / {} cells with items remaining",
        snap.inventory.items_available, snap.inventory.total_cells,
    );
    println!(
        "bus: failed_events={}",
        sim.bus().failed_events,
    );
}

fn run_demo(duration_s: f64, seed: u64) -> anyhow::Result<()> {
    println!("Running demo simulation...");
    println!("  Duration: {duration_s}s (wall-clock, since the clock paces to real time)");
    println!("  Seed: {seed}");

    let mut config = packrunner_config::Config::default();
    config.orders.generation_interval = 15.0;
    config.timing.simulation_speed = 4.0; // speed the demo up without lying about the clock
    let tick_interval = config.timing.tick_interval;

    let mut sim = Simulator::new(config, seed);
    sim.start();

    while sim.now().as_seconds() < duration_s {
        sim.tick()?;
        std::thread::sleep(Duration::from_secs_f64(tick_interval));
    }

    sim.stop();

    let snap = sim.snapshot();
    println!("\nDemo complete.");
    println!(
        "  Orders completed: {}  failed: {}",
        snap.kpi.orders_completed, snap.kpi.orders_failed
    );
    println!("  Average efficiency: {:.3}", snap.kpi.avg_efficiency);
    println!("  Average fulfillment time: {:.2}s", snap.kpi.avg_fulfillment_time_s);
    println!(
        "  Queue — pending: {}, peak: {}",
        snap.order.pending, snap.order.peak_size
    );
    Ok(())
}
