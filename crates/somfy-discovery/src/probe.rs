//! Host liveness and web UI probing

use async_trait::async_trait;
use somfy_client::Identifier;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

/// Shorter deadlines produce false negatives against real devices
pub const LIVENESS_TIMEOUT: Duration = Duration::from_millis(1200);

/// Decides whether an address answers at all, before any MAC lookup
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_alive(&self, ip: Ipv4Addr) -> bool;
}

/// Single ICMP echo through the system `ping`
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    timeout: Duration,
}

impl IcmpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self::new(LIVENESS_TIMEOUT)
    }
}

#[async_trait]
impl LivenessProbe for IcmpProbe {
    async fn is_alive(&self, ip: Ipv4Addr) -> bool {
        // ping only accepts whole seconds for -W
        let wait_secs = self.timeout.as_secs().max(1).to_string();
        let ping = Command::new("ping")
            .args(["-c", "1", "-W", &wait_secs, &ip.to_string()])
            .kill_on_drop(true)
            .output();

        let alive = match timeout(self.timeout, ping).await {
            Ok(Ok(output)) => output.status.success(),
            Ok(Err(e)) => {
                trace!(ip = %ip, error = %e, "ping could not be run");
                false
            }
            Err(_) => false,
        };

        trace!(ip = %ip, alive = alive, "Ping result");
        alive
    }
}

/// Decides whether an address serves the Somfy web UI
#[async_trait]
pub trait WebUiProbe: Send + Sync {
    async fn serves_web_ui(&self, ip: Ipv4Addr) -> bool;
}

#[async_trait]
impl WebUiProbe for Identifier {
    async fn serves_web_ui(&self, ip: Ipv4Addr) -> bool {
        self.identify(ip).await
    }
}
