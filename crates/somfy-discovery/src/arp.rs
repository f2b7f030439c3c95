//! Hardware address resolution for live hosts
//!
//! Two strategies:
//! - Local: read the OS neighbor table (`ip neigh`, falling back to `arp -n`)
//! - Remote: ask an HTTP ARP lookup service (`GET {base_url}/arp/{ip}`)
//!
//! Neither treats a miss as an error; an unresolved host simply has no MAC.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::DiscoveryError;
use crate::mac::extract_mac;

/// Deadline for one remote ARP lookup
pub const REMOTE_ARP_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves an address to a normalized MAC, if one is known
#[async_trait]
pub trait MacResolver: Send + Sync {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String>;
}

/// Which resolver a scan uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArpMode {
    #[default]
    Local,
    Remote,
}

/// Build the resolver for `mode`; remote mode needs `remote_url`
pub fn build_resolver(
    mode: ArpMode,
    remote_url: Option<&str>,
) -> Result<Arc<dyn MacResolver>, DiscoveryError> {
    match mode {
        ArpMode::Local => Ok(Arc::new(LocalArpResolver)),
        ArpMode::Remote => {
            let url = remote_url.ok_or(DiscoveryError::MissingArpUrl)?;
            Ok(Arc::new(RemoteArpResolver::new(url, REMOTE_ARP_TIMEOUT)?))
        }
    }
}

/// Reads the local neighbor table
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalArpResolver;

impl LocalArpResolver {
    async fn query(program: &str, args: &[&str]) -> Option<String> {
        let output = match Command::new(program).args(args).output().await {
            Ok(output) => output,
            Err(e) => {
                trace!(program = program, error = %e, "Neighbor table query unavailable");
                return None;
            }
        };

        if !output.status.success() {
            trace!(program = program, status = %output.status, "Neighbor table query failed");
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(program = program, output = %stdout.trim(), "Neighbor table output");
        extract_mac(&stdout)
    }
}

#[async_trait]
impl MacResolver for LocalArpResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        let ip = ip.to_string();
        let mac = match Self::query("ip", &["neigh", "show", &ip]).await {
            Some(mac) => Some(mac),
            None => Self::query("arp", &["-n", &ip]).await,
        };
        debug!(ip = %ip, mac = ?mac, "Local MAC lookup");
        mac
    }
}

/// One entry of the remote service's JSON array
#[derive(Debug, Deserialize)]
struct ArpRecord {
    #[serde(default)]
    mac: Option<String>,
}

/// Queries an HTTP ARP lookup service
#[derive(Debug, Clone)]
pub struct RemoteArpResolver {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteArpResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn lookup_url(&self, ip: Ipv4Addr) -> String {
        format!("{}/arp/{}", self.base_url, ip)
    }
}

#[async_trait]
impl MacResolver for RemoteArpResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> Option<String> {
        let url = self.lookup_url(ip);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Remote ARP lookup failed");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(url = %url, status = %response.status(), "Remote ARP lookup rejected");
            return None;
        }

        let records = match response.json::<Vec<ArpRecord>>().await {
            Ok(records) => records,
            Err(e) => {
                debug!(url = %url, error = %e, "Remote ARP response malformed");
                return None;
            }
        };

        let mac = records
            .into_iter()
            .next()
            .and_then(|record| record.mac)
            .and_then(|mac| extract_mac(&mac));
        debug!(ip = %ip, mac = ?mac, "Remote MAC lookup");
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_trims_slash() {
        let resolver = RemoteArpResolver::new("http://arp-mock:8080/", REMOTE_ARP_TIMEOUT).unwrap();
        assert_eq!(
            resolver.lookup_url(Ipv4Addr::new(10, 0, 0, 2)),
            "http://arp-mock:8080/arp/10.0.0.2"
        );
    }

    #[test]
    fn test_remote_mode_requires_url() {
        assert!(matches!(
            build_resolver(ArpMode::Remote, None),
            Err(DiscoveryError::MissingArpUrl)
        ));
        assert!(build_resolver(ArpMode::Local, None).is_ok());
    }
}
