use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use std::sync::{Arc, Mutex};

use loft_console::console::Console;
use loft_console::{doctor as console_doctor, ConsoleConfig};
use loft_link::TelemetryClient;
use loft_proto::{OperationMode, Waypoint};
use loft_vehicle::server::CommandServer;
use loft_vehicle::state::VehicleState;
use loft_vehicle::{doctor as vehicle_doctor, VehicleConfig};

#[derive(Debug, Parser)]
#[command(name = "loft", version, about = "loft - LTA swarm operator console & vehicle controller")]
struct Cli {
    /// TOML config; loopback defaults when omitted.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Doctor,
    /// Run the vehicle-side command server.
    Controller {
        /// Preload bench sensor readings (no sensor stack required).
        #[arg(long)]
        fixture: bool,
    },
    /// Run the operator console poll loop.
    Console,
    /// One-shot operator commands against a running controller.
    Cmd {
        #[command(subcommand)]
        cmd: OpCmd,
    },
}

#[derive(Debug, Subcommand)]
enum OpCmd {
    /// Set the drive mode (0 auto, 1 waypoint, 2 manual).
    Mode { code: i64 },
    /// Send a waypoint.
    Wp { x: i32, y: i32, z: i32, theta: i32 },
    /// Send a manual motion word (forward/backward/left/right/up/down/stop).
    Move { direction: String },
    /// Read the current waypoint.
    ShowWp,
    /// Read the fiducial snapshot.
    At,
    /// Read the proximity snapshot.
    Tof,
    /// Ask the controller to shut down.
    Quit,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    console: ConsoleConfig,
    vehicle: VehicleConfig,
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Controller { fixture } => controller(&cfg, fixture).await?,
        Command::Console => console_loop(&cfg).await?,
        Command::Cmd { cmd } => op_cmd(&cfg, cmd).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    console_doctor::check_console(&cfg.console)?;
    vehicle_doctor::check_bind(&cfg.vehicle.bind)?;
    info!("doctor: OK");
    Ok(())
}

async fn controller(cfg: &Config, fixture: bool) -> Result<()> {
    let mut state = VehicleState::default();
    if fixture {
        info!("controller: loading bench fixture readings");
        state.load_fixture();
    }
    let server = CommandServer::bind(&cfg.vehicle.bind).await?;
    server.run(Arc::new(Mutex::new(state))).await
}

async fn console_loop(cfg: &Config) -> Result<()> {
    info!(
        "console: polling {} at {} Hz",
        cfg.console.endpoint, cfg.console.frame_rate_hz
    );
    let mut console = Console::new(&cfg.console);
    let store = console.store();
    let period = std::time::Duration::from_secs_f64(1.0 / cfg.console.frame_rate_hz as f64);
    let mut ticker = tokio::time::interval(period);
    let mut frame: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                console.tick();
                frame += 1;
                // The graphical surface is a separate process reading the
                // store; a once-a-second snapshot line stands in for it.
                if frame % cfg.console.frame_rate_hz as u64 == 0 {
                    let snap = store.snapshot();
                    info!(
                        "mode={:?} wp={} fiducial={:?} proximity={:?} banner={:?}",
                        snap.mode, snap.waypoint, snap.fiducial, snap.proximity, snap.banner
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("console: shutting down");
                return Ok(());
            }
        }
    }
}

async fn op_cmd(cfg: &Config, cmd: OpCmd) -> Result<()> {
    let client = TelemetryClient::new(cfg.console.endpoint.clone());
    match cmd {
        OpCmd::Mode { code } => {
            let mode = OperationMode::from_code(code)?;
            client.send_drive_mode(mode).await?;
            println!("ok");
        }
        OpCmd::Wp { x, y, z, theta } => {
            client.send_waypoint(&Waypoint { x, y, z, theta }).await?;
            println!("ok");
        }
        OpCmd::Move { direction } => {
            client.send_acceleration(&direction).await?;
            println!("sent {}", direction);
        }
        OpCmd::ShowWp => {
            println!("{}", client.request_waypoint().await?);
        }
        OpCmd::At => {
            let r = client.request_fiducial().await?;
            println!("visible={}", r.visible);
            if r.visible {
                println!("id={:?}", r.tag_id);
                println!("position={:?}", r.position);
                println!("altitude={:?}", r.altitude);
                println!("orientation={:?}", r.orientation);
            }
        }
        OpCmd::Tof => {
            let r = client.request_proximity().await?;
            for (n, name) in ["left", "center", "right"].iter().enumerate() {
                println!("{}: {} status={:?}", name, r.distance[n], r.status[n]);
            }
        }
        OpCmd::Quit => {
            client.send_terminate().await?;
            println!("quitting");
        }
    }
    Ok(())
}
