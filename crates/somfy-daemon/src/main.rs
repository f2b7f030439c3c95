//! Somfy PoE blinds - command-line entry point
//!
//! Discovers controllers on the local subnet, keeps a device list in the
//! configuration file and drives individual blinds.

mod commands;
mod config;
mod watch;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use somfy_core::{Direction, LimitSetting};
use somfy_discovery::Subnet;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{Action, ScanOptions};
use config::DeviceConfig;

#[derive(Parser, Debug)]
#[command(name = "somfy")]
#[command(about = "Discovery and control for Somfy PoE blinds")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "somfy.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a subnet for blind controllers
    Scan {
        /// Subnet in CIDR notation; defaults to the configured or local one
        #[arg(short, long)]
        subnet: Option<Subnet>,
        /// Match on the web UI banner instead of the MAC vendor prefix
        #[arg(long)]
        identify: bool,
        /// Store found devices in the configuration file
        #[arg(long)]
        save: bool,
        /// PIN used to log into found devices
        #[arg(long)]
        pin: Option<String>,
    },
    /// List configured devices
    Devices,
    /// Add or replace a configured device
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        ip: Ipv4Addr,
        #[arg(long)]
        pin: String,
    },
    /// Remove a configured device
    Remove { name: String },
    /// Show the current position
    Status { name: String },
    /// Show device identity
    Info { name: String },
    /// Open the blind
    Up { name: String },
    /// Close the blind
    Down { name: String },
    /// Stop any motion
    Stop { name: String },
    /// Move to an absolute position (0 = open, 100 = closed)
    Move { name: String, position: u8 },
    /// Move in one direction for a number of milliseconds
    Jog {
        name: String,
        direction: Direction,
        duration_ms: u32,
    },
    /// Set an end limit at the current position
    Limit { name: String, setting: LimitSetting },
    /// Stop if moving, otherwise reverse the last direction
    Toggle { name: String },
    /// Poll status until interrupted
    Watch {
        name: String,
        /// Seconds between polls
        #[arg(short, long, default_value_t = 60)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Somfy v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;

    match args.command {
        Command::Scan {
            subnet,
            identify,
            save,
            pin,
        } => {
            let options = ScanOptions {
                subnet,
                identify,
                save,
                pin,
            };
            commands::scan(&mut config, &args.config, options).await?;
        }
        Command::Devices => commands::list_devices(&config),
        Command::Add { name, ip, pin } => {
            commands::add_device(&mut config, &args.config, DeviceConfig { name, ip, pin })?;
        }
        Command::Remove { name } => commands::remove_device(&mut config, &args.config, &name)?,
        Command::Status { name } => commands::run_action(&config, &name, Action::Status).await?,
        Command::Info { name } => commands::run_action(&config, &name, Action::Info).await?,
        Command::Up { name } => commands::run_action(&config, &name, Action::Up).await?,
        Command::Down { name } => commands::run_action(&config, &name, Action::Down).await?,
        Command::Stop { name } => commands::run_action(&config, &name, Action::Stop).await?,
        Command::Toggle { name } => commands::run_action(&config, &name, Action::Toggle).await?,
        Command::Move { name, position } => {
            commands::run_action(&config, &name, Action::MoveTo(position)).await?;
        }
        Command::Jog {
            name,
            direction,
            duration_ms,
        } => {
            commands::run_action(&config, &name, Action::Jog(direction, duration_ms)).await?;
        }
        Command::Limit { name, setting } => {
            commands::run_action(&config, &name, Action::Limit(setting)).await?;
        }
        Command::Watch {
            name,
            interval_secs,
        } => {
            let device = config
                .device(&name)
                .ok_or_else(|| anyhow!("No device named {name:?} in configuration"))?;
            watch::run(
                device,
                config.transport(),
                Duration::from_secs(interval_secs.max(1)),
            )
            .await?;
        }
    }

    Ok(())
}
