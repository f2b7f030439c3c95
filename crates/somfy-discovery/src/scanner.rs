//! Discovery scanner that sweeps a subnet for Somfy controllers
//!
//! A scan is a producer task feeding a bounded channel. Hosts are checked by
//! a bounded pool of workers; each match is sent as soon as it is found, so
//! consumers can act on early hits while the sweep continues. Dropping the
//! receiver ends the sweep: no new hosts are probed and in-flight probes are
//! allowed to finish.

use somfy_core::Device;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::arp::MacResolver;
use crate::mac::{matches_vendor_prefix, VENDOR_MAC_PREFIXES};
use crate::probe::{LivenessProbe, WebUiProbe};
use crate::subnet::Subnet;

/// Concurrent host checks; small enough not to flood the LAN
pub const DEFAULT_WORKERS: usize = 16;

/// Progress is logged every this many checked hosts
pub const PROGRESS_INTERVAL: usize = 25;

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// MAC prefixes accepted as Somfy devices
    pub vendor_prefixes: Vec<String>,
    /// Maximum hosts checked concurrently
    pub workers: usize,
    /// Matches buffered ahead of the consumer
    pub channel_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            vendor_prefixes: VENDOR_MAC_PREFIXES.iter().map(|p| p.to_string()).collect(),
            workers: DEFAULT_WORKERS,
            channel_capacity: 32,
        }
    }
}

/// A live host whose MAC carries a vendor prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredDevice {
    pub ip: Ipv4Addr,
    pub mac: String,
}

impl From<DiscoveredDevice> for Device {
    fn from(found: DiscoveredDevice) -> Self {
        Device::discovered(found.ip, Some(found.mac))
    }
}

/// MAC-targeted discovery scanner
pub struct DiscoveryScanner {
    config: ScannerConfig,
    probe: Arc<dyn LivenessProbe>,
    resolver: Arc<dyn MacResolver>,
}

impl DiscoveryScanner {
    pub fn new(
        config: ScannerConfig,
        probe: Arc<dyn LivenessProbe>,
        resolver: Arc<dyn MacResolver>,
    ) -> Self {
        Self {
            config,
            probe,
            resolver,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Start a sweep of `subnet`; matches arrive on the returned channel,
    /// which closes when the sweep is done
    ///
    /// Must be called within a Tokio runtime.
    pub fn scan(&self, subnet: Subnet) -> mpsc::Receiver<DiscoveredDevice> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let probe = self.probe.clone();
        let resolver = self.resolver.clone();
        let prefixes = Arc::new(self.config.vendor_prefixes.clone());

        let check = move |ip: Ipv4Addr| {
            let probe = probe.clone();
            let resolver = resolver.clone();
            let prefixes = prefixes.clone();
            async move { check_host(ip, probe.as_ref(), resolver.as_ref(), &prefixes).await }
        };

        tokio::spawn(sweep(subnet, self.config.workers, tx, check));
        rx
    }

    /// Run a full sweep and collect every match
    pub async fn scan_all(&self, subnet: Subnet) -> Vec<DiscoveredDevice> {
        let mut rx = self.scan(subnet);
        let mut found = Vec::new();
        while let Some(device) = rx.recv().await {
            found.push(device);
        }
        found
    }
}

/// Ping-only discovery: hosts whose web UI shows the Somfy banner
///
/// Needs no neighbor table access, at the cost of yielding devices without a
/// MAC. Must be called within a Tokio runtime.
pub fn identify_scan(
    subnet: Subnet,
    probe: Arc<dyn WebUiProbe>,
    workers: usize,
) -> mpsc::Receiver<Device> {
    let (tx, rx) = mpsc::channel(workers.max(1));

    let check = move |ip: Ipv4Addr| {
        let probe = probe.clone();
        async move {
            debug!(ip = %ip, "Checking web UI");
            probe
                .serves_web_ui(ip)
                .await
                .then(|| Device::discovered(ip, None))
        }
    };

    tokio::spawn(sweep(subnet, workers, tx, check));
    rx
}

/// Ping, then resolve the MAC only for live hosts, then filter by vendor
async fn check_host(
    ip: Ipv4Addr,
    probe: &dyn LivenessProbe,
    resolver: &dyn MacResolver,
    prefixes: &[String],
) -> Option<DiscoveredDevice> {
    debug!(ip = %ip, "Pinging");
    if !probe.is_alive(ip).await {
        return None;
    }

    debug!(ip = %ip, "Host alive, resolving MAC");
    let mac = resolver.resolve(ip).await?;

    if matches_vendor_prefix(&mac, prefixes) {
        info!(ip = %ip, mac = %mac, "Found Somfy device");
        Some(DiscoveredDevice { ip, mac })
    } else {
        debug!(ip = %ip, mac = %mac, "MAC does not match vendor prefixes");
        None
    }
}

/// Drive `check` over every host of `subnet` with at most `workers` in flight
async fn sweep<T, F, Fut>(subnet: Subnet, workers: usize, tx: mpsc::Sender<T>, check: F)
where
    T: Send + 'static,
    F: Fn(Ipv4Addr) -> Fut + Send + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    let workers = workers.max(1);
    info!(
        subnet = %subnet,
        hosts = subnet.host_count(),
        workers = workers,
        "Searching for devices"
    );

    let mut hosts = subnet.hosts();
    let mut tasks = JoinSet::new();
    let mut consuming = true;
    let mut checked = 0usize;
    let mut found = 0usize;

    loop {
        if consuming && tx.is_closed() {
            debug!(subnet = %subnet, "Scan consumer gone, draining in-flight probes");
            consuming = false;
        }

        while consuming && tasks.len() < workers {
            match hosts.next() {
                Some(ip) => {
                    tasks.spawn(check(ip));
                }
                None => break,
            }
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        checked += 1;

        match joined {
            Ok(Some(item)) if consuming => {
                if tx.send(item).await.is_ok() {
                    found += 1;
                } else {
                    debug!(subnet = %subnet, "Scan consumer gone, draining in-flight probes");
                    consuming = false;
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Host check task failed"),
        }

        if checked % PROGRESS_INTERVAL == 0 {
            info!(checked = checked, found = found, "Scan progress");
        }
    }

    info!(subnet = %subnet, checked = checked, found = found, "Scan complete");
}
