//! Unauthenticated presence probe against the device web UI

use reqwest::{StatusCode, Url};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

use crate::error::ClientError;
use crate::transport::device_url;

/// Banner served by the device web UI
pub const WEB_UI_BANNER: &str = "SOMFY PoE WebGUI";

/// Anything shorter produces false negatives against real devices
pub const IDENTIFY_TIMEOUT: Duration = Duration::from_millis(1200);

/// Checks whether an address serves the Somfy web UI
///
/// Holds one HTTP client so that a subnet sweep reuses its connection pool.
#[derive(Debug, Clone)]
pub struct Identifier {
    http: reqwest::Client,
}

impl Identifier {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Probe `https://{ip}/`
    pub async fn identify(&self, ip: Ipv4Addr) -> bool {
        match device_url(ip) {
            Ok(url) => self.identify_url(url).await,
            Err(e) => {
                debug!(ip = %ip, error = %e, "Cannot build device URL");
                false
            }
        }
    }

    /// POST an empty body to `url`; true only for a 200 carrying the banner
    pub async fn identify_url(&self, url: Url) -> bool {
        let response = match self.http.post(url.clone()).body("").send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Identify probe failed");
                return false;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(url = %url, status = %response.status(), "Identify probe rejected");
            return false;
        }

        match response.text().await {
            Ok(body) => body.contains(WEB_UI_BANNER),
            Err(e) => {
                debug!(url = %url, error = %e, "Identify probe body unreadable");
                false
            }
        }
    }
}
