//! Subcommand implementations

use anyhow::{anyhow, bail, Context, Result};
use somfy_client::{Identifier, LogFailureHandler, SessionClient, TransportConfig};
use somfy_core::{Device, Direction, LimitSetting, Status, StatusOutcome};
use somfy_discovery::{
    build_resolver, guess_local_subnet, identify_scan, DiscoveryScanner, IcmpProbe, Subnet,
};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{save_config, Config, DeviceConfig};

/// Motion and query actions against a single configured device
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Status,
    Info,
    Up,
    Down,
    Stop,
    Toggle,
    MoveTo(u8),
    Jog(Direction, u32),
    Limit(LimitSetting),
}

pub struct ScanOptions {
    pub subnet: Option<Subnet>,
    pub identify: bool,
    pub save: bool,
    pub pin: Option<String>,
}

/// Sweep the subnet, printing devices as they are found
pub async fn scan(config: &mut Config, config_path: &Path, options: ScanOptions) -> Result<()> {
    if options.save && options.pin.is_none() {
        bail!("--save needs --pin so that found devices can be logged into");
    }

    let subnet = options
        .subnet
        .or(config.discovery.subnet)
        .or_else(guess_local_subnet)
        .ok_or_else(|| anyhow!("No subnet given and none could be guessed; use --subnet"))?;

    info!(subnet = %subnet, identify = options.identify, "Running discovery scan");

    let mut found: Vec<Device> = Vec::new();
    if options.identify {
        let identifier = Arc::new(Identifier::new(config.probe_timeout())?);
        let mut rx = identify_scan(subnet, identifier, config.discovery.workers);
        while let Some(device) = rx.recv().await {
            println!("  - {}", device.ip);
            found.push(device);
        }
    } else {
        let resolver = build_resolver(
            config.discovery.arp,
            config.discovery.remote_arp_url.as_deref(),
        )?;
        let probe = Arc::new(IcmpProbe::new(config.probe_timeout()));
        let scanner = DiscoveryScanner::new(config.to_scanner_config(), probe, resolver);

        let mut rx = scanner.scan(subnet);
        while let Some(hit) = rx.recv().await {
            println!("  - {} ({})", hit.ip, hit.mac);
            found.push(hit.into());
        }
    }

    println!("Discovered {} devices in {}", found.len(), subnet);

    let Some(pin) = options.pin else {
        return Ok(());
    };

    let transport = config.transport();
    let mut identified = Vec::new();
    for device in &found {
        match describe(device.ip, &pin, transport.clone()).await {
            Ok(info) => {
                print_device(&info);
                identified.push(info);
            }
            Err(e) => warn!(ip = %device.ip, error = %e, "Could not identify device"),
        }
    }

    if options.save {
        config.discovery.subnet = Some(subnet);
        for device in identified {
            config.upsert_device(DeviceConfig {
                name: device.label(),
                ip: device.ip,
                pin: pin.clone(),
            });
        }
        save_config(config_path, config)?;
    }

    Ok(())
}

/// Log into a freshly found device and read its identity
async fn describe(ip: Ipv4Addr, pin: &str, transport: TransportConfig) -> Result<Device> {
    let mut client = SessionClient::new(
        ip.to_string(),
        ip,
        pin,
        transport,
        Arc::new(LogFailureHandler),
    )?;
    client.login().await?;
    if !client.is_authenticated() {
        bail!("login rejected");
    }
    client
        .get_info()
        .await?
        .ok_or_else(|| anyhow!("no response to status.info"))
}

pub fn list_devices(config: &Config) {
    if config.devices.is_empty() {
        println!("No devices configured");
        return;
    }
    for device in &config.devices {
        println!("  - {} at {}", device.name, device.ip);
    }
}

pub fn add_device(config: &mut Config, config_path: &Path, device: DeviceConfig) -> Result<()> {
    let name = device.name.clone();
    if config.upsert_device(device) {
        info!(device = %name, "Replaced existing device entry");
    }
    save_config(config_path, config)
}

pub fn remove_device(config: &mut Config, config_path: &Path, name: &str) -> Result<()> {
    if !config.remove_device(name) {
        bail!("No device named {name:?}");
    }
    save_config(config_path, config)
}

/// Log into the named device and run `action`
pub async fn run_action(config: &Config, name: &str, action: Action) -> Result<()> {
    let device = config
        .device(name)
        .ok_or_else(|| anyhow!("No device named {name:?} in configuration"))?;

    let mut client = SessionClient::new(
        device.name.clone(),
        device.ip,
        device.pin.clone(),
        config.transport(),
        Arc::new(LogFailureHandler),
    )?;
    client
        .login()
        .await
        .with_context(|| format!("Login to {} failed", device.ip))?;
    if !client.is_authenticated() {
        warn!(device = %device.name, "Not authenticated, the command will likely be rejected");
    }

    let answered = match action {
        Action::Status => {
            let status = client
                .get_status()
                .await?
                .ok_or_else(|| anyhow!("No response from {}", device.ip))?;
            print_status(&device.name, &status);
            true
        }
        Action::Info => {
            let info = client
                .get_info()
                .await?
                .ok_or_else(|| anyhow!("No response from {}", device.ip))?;
            print_device(&info);
            true
        }
        Action::Up => client.up().await,
        Action::Down => client.down().await,
        Action::Stop => client.stop().await,
        Action::Toggle => client.toggle().await?,
        Action::MoveTo(position) => client.move_to(position).await?,
        Action::Jog(direction, duration_ms) => client.move_relative(direction, duration_ms).await,
        Action::Limit(setting) => client.set_limit(setting).await,
    };

    if !answered {
        bail!("{} did not acknowledge {:?}", device.name, action);
    }
    Ok(())
}

pub fn print_status(name: &str, status: &Status) {
    match &status.outcome {
        StatusOutcome::Success(position) => {
            println!(
                "{}: position {} ({}% open), {}, direction {:?} [{}], cause {:?}, source {:?}",
                name,
                position.value,
                position.open_percent(),
                if status.is_moving() { "moving" } else { "stopped" },
                position.direction,
                position.direction(),
                position.cause,
                position.source,
            );
        }
        StatusOutcome::Failure { reason } => {
            println!("{}: device error on target {}: {}", name, status.target_id, reason);
        }
    }
}

pub fn print_device(device: &Device) {
    println!("  - {} at {}", device.label(), device.ip);
    if let Some(mac) = &device.mac {
        println!("    MAC: {}", mac);
    }
    if let Some(model) = &device.model {
        println!("    Model: {}", model);
    }
    if let Some(hardware) = &device.hardware {
        println!("    Hardware: {}", hardware);
    }
    if let Some(firmware) = &device.firmware {
        println!("    Firmware: {}", firmware);
    }
    if let Some(hostname) = &device.hostname {
        println!("    Hostname: {}", hostname);
    }
}
