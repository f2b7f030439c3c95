//! Configuration loading and persistence

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use somfy_client::{TransportConfig, IDENTIFY_TIMEOUT};
use somfy_discovery::{ArpMode, ScannerConfig, Subnet, VENDOR_MAC_PREFIXES};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Subnet to scan; guessed from local interfaces when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
    /// Concurrent host checks
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// MAC resolution strategy
    #[serde(default)]
    pub arp: ArpMode,
    /// Base URL of the remote ARP service (remote mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_arp_url: Option<String>,
    /// Accepted vendor MAC prefixes
    #[serde(default = "default_vendor_prefixes")]
    pub vendor_prefixes: Vec<String>,
    /// Liveness and identify probe timeout
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            subnet: None,
            workers: default_workers(),
            arp: ArpMode::default(),
            remote_arp_url: None,
            vendor_prefixes: default_vendor_prefixes(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

fn default_workers() -> usize {
    16
}

fn default_vendor_prefixes() -> Vec<String> {
    VENDOR_MAC_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_probe_timeout() -> u64 {
    IDENTIFY_TIMEOUT.as_millis() as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout for device sessions
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_client_timeout(),
        }
    }
}

fn default_client_timeout() -> u64 {
    5
}

/// A configured blind controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub ip: Ipv4Addr,
    pub pin: String,
}

impl Config {
    /// Convert to ScannerConfig
    pub fn to_scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            vendor_prefixes: self.discovery.vendor_prefixes.clone(),
            workers: self.discovery.workers,
            ..ScannerConfig::default()
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::with_timeout(Duration::from_secs(self.client.timeout_secs))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery.probe_timeout_ms)
    }

    pub fn device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Add a device, replacing any entry with the same name or address;
    /// returns true when an entry was replaced
    pub fn upsert_device(&mut self, device: DeviceConfig) -> bool {
        let before = self.devices.len();
        self.devices
            .retain(|d| d.name != device.name && d.ip != device.ip);
        let replaced = self.devices.len() != before;
        self.devices.push(device);
        replaced
    }

    /// Remove a device by name; returns true if it was present
    pub fn remove_device(&mut self, name: &str) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| d.name != name);
        self.devices.len() != before
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save configuration to file
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), devices = config.devices.len(), "Saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.devices.is_empty());
        assert_eq!(config.discovery.workers, 16);
        assert_eq!(config.discovery.vendor_prefixes, vec!["4C:C2:06".to_string()]);
        assert_eq!(config.discovery.arp, ArpMode::Local);
        assert_eq!(config.client.timeout_secs, 5);
        assert_eq!(config.probe_timeout(), IDENTIFY_TIMEOUT);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [discovery]
            subnet = "10.0.7.0/24"
            arp = "remote"
            remote_arp_url = "http://arp-mock:8080"

            [[device]]
            name = "Living room"
            ip = "10.0.7.117"
            pin = "1234"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.subnet, Some("10.0.7.0/24".parse().unwrap()));
        assert_eq!(config.discovery.arp, ArpMode::Remote);
        assert_eq!(config.discovery.probe_timeout_ms, 1200);
        let device = config.device("Living room").unwrap();
        assert_eq!(device.ip, Ipv4Addr::new(10, 0, 7, 117));
        assert_eq!(device.pin, "1234");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("somfy.toml");

        let mut config = Config::default();
        config.discovery.subnet = Some("192.168.1.0/24".parse().unwrap());
        config.upsert_device(DeviceConfig {
            name: "Office".into(),
            ip: Ipv4Addr::new(192, 168, 1, 20),
            pin: "0000".into(),
        });
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.discovery.subnet, config.discovery.subnet);
        assert_eq!(loaded.devices, config.devices);
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut config = Config::default();
        let office = DeviceConfig {
            name: "Office".into(),
            ip: Ipv4Addr::new(192, 168, 1, 20),
            pin: "0000".into(),
        };

        assert!(!config.upsert_device(office.clone()));
        assert!(config.upsert_device(DeviceConfig {
            pin: "1111".into(),
            ..office
        }));
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].pin, "1111");

        assert!(config.remove_device("Office"));
        assert!(!config.remove_device("Office"));
        assert!(config.devices.is_empty());
    }
}
