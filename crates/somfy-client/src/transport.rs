//! HTTPS transport configuration for device connections

use reqwest::cookie::Jar;
use reqwest::Url;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::error::ClientError;

/// Default bound on any single request to a device
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport settings shared by every request a client makes
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout (connect + response)
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build an HTTP client bound to `jar`
    ///
    /// Certificate validation is off: devices serve a self-signed certificate.
    pub fn build_client(&self, jar: Arc<Jar>) -> Result<reqwest::Client, ClientError> {
        trace!(timeout_ms = self.timeout.as_millis() as u64, "Building device HTTP client");
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .cookie_provider(jar)
            .timeout(self.timeout)
            .build()?;
        Ok(client)
    }
}

/// Root URL of the device web service
pub fn device_url(ip: Ipv4Addr) -> Result<Url, ClientError> {
    let raw = format!("https://{}/", ip);
    Url::parse(&raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_url() {
        let url = device_url(Ipv4Addr::new(10, 0, 7, 117)).unwrap();
        assert_eq!(url.as_str(), "https://10.0.7.117/");
        assert_eq!(url.join("req").unwrap().as_str(), "https://10.0.7.117/req");
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(TransportConfig::default().timeout, Duration::from_secs(5));
    }
}
