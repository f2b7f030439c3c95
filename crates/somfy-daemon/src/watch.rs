//! Status polling loop
//!
//! Polls one device on a fixed interval. A transport failure does not end the
//! loop; it marks the session for a fresh login on the next tick.

use anyhow::Result;
use somfy_client::{ClientError, FailureHandler, SessionClient, TransportConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::commands::print_status;
use crate::config::DeviceConfig;

/// Failure handler that requests a reconnect
#[derive(Debug, Default)]
pub struct ReconnectFlag {
    pending: AtomicBool,
}

impl ReconnectFlag {
    /// Clear the flag, returning whether a reconnect was requested
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

impl FailureHandler for ReconnectFlag {
    fn on_transport_failure(&self, error: &ClientError) {
        error!(error = %error, "Device transport failure, will log in again");
        self.pending.store(true, Ordering::SeqCst);
    }
}

/// Poll `device` every `interval` until Ctrl-C
pub async fn run(device: &DeviceConfig, transport: TransportConfig, interval: Duration) -> Result<()> {
    let reconnect = Arc::new(ReconnectFlag::default());
    let mut client = SessionClient::new(
        device.name.clone(),
        device.ip,
        device.pin.clone(),
        transport,
        reconnect.clone(),
    )?;

    info!(
        device = %device.name,
        ip = %device.ip,
        interval_secs = interval.as_secs(),
        "Watching device"
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!(device = %device.name, "Stopping watch");
                return Ok(());
            }
        }

        if reconnect.take() || !client.is_authenticated() {
            if let Err(e) = client.login().await {
                warn!(device = %device.name, error = %e, "Login failed");
                continue;
            }
        }

        match client.get_status().await {
            Ok(Some(status)) => print_status(&device.name, &status),
            Ok(None) => warn!(device = %device.name, "Unable to retrieve shade status"),
            Err(e) => warn!(device = %device.name, error = %e, "Unreadable shade status"),
        }
    }
}
