//! Authenticated session against one blind controller
//!
//! A client is single-writer: [`SessionClient::login`] takes `&mut self`, so
//! a login can never race a command on the same instance. Callers that share
//! a client across tasks must serialize access themselves.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde_json::Value;
use somfy_core::{Device, Direction, LimitSetting, ModelError, Status};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::command::{methods, CommandParams, CommandRequest, PRIORITY_HIGH, PRIORITY_NORMAL};
use crate::error::ClientError;
use crate::failure::FailureHandler;
use crate::transport::{device_url, TransportConfig};

/// Cookie carrying the session credential
pub const SESSION_COOKIE: &str = "sessionId";

/// Path commands are posted to, relative to the device root
const COMMAND_PATH: &str = "req";

/// Credential state held by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Unauthenticated,
    Authenticated { session_id: String },
}

/// Session and command client for a single device
pub struct SessionClient {
    name: String,
    ip: Ipv4Addr,
    password: String,
    base_url: Url,
    command_url: Url,
    transport: TransportConfig,
    jar: Arc<Jar>,
    http: reqwest::Client,
    session: Session,
    on_failure: Arc<dyn FailureHandler>,
}

impl SessionClient {
    /// Create a client for the device at `https://{ip}/`
    pub fn new(
        name: impl Into<String>,
        ip: Ipv4Addr,
        password: impl Into<String>,
        transport: TransportConfig,
        on_failure: Arc<dyn FailureHandler>,
    ) -> Result<Self, ClientError> {
        let base_url = device_url(ip)?;
        Self::with_base_url(name, ip, password, base_url, transport, on_failure)
    }

    /// Create a client that talks to `base_url` while reporting `ip` as the
    /// device address
    pub fn with_base_url(
        name: impl Into<String>,
        ip: Ipv4Addr,
        password: impl Into<String>,
        base_url: Url,
        transport: TransportConfig,
        on_failure: Arc<dyn FailureHandler>,
    ) -> Result<Self, ClientError> {
        let command_url = base_url
            .join(COMMAND_PATH)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}{COMMAND_PATH}: {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = transport.build_client(jar.clone())?;

        Ok(Self {
            name: name.into(),
            ip,
            password: password.into(),
            base_url,
            command_url,
            transport,
            jar,
            http,
            session: Session::Unauthenticated,
            on_failure,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.session, Session::Authenticated { .. })
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.session {
            Session::Authenticated { session_id } => Some(session_id),
            Session::Unauthenticated => None,
        }
    }

    /// Authenticate with the device password
    ///
    /// Every login starts from an empty cookie jar. Success is decided solely
    /// by a `sessionId` cookie being issued; a response without one is logged
    /// and leaves the client unauthenticated without returning an error. Only
    /// transport failures are returned.
    pub async fn login(&mut self) -> Result<(), ClientError> {
        self.session = Session::Unauthenticated;
        self.jar = Arc::new(Jar::default());
        self.http = self.transport.build_client(self.jar.clone())?;

        debug!(device = %self.name, ip = %self.ip, "Logging in");

        let response = self
            .http
            .post(self.base_url.clone())
            .form(&[("password", self.password.as_str())])
            .send()
            .await?;

        let Some(session_id) = self.session_cookie() else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(
                device = %self.name,
                ip = %self.ip,
                status = %status,
                "Login failed, no sessionId issued"
            );
            info!(device = %self.name, response = %body, "Login response");
            return Ok(());
        };

        info!(device = %self.name, ip = %self.ip, session_id = %session_id, "Authenticated");
        self.session = Session::Authenticated { session_id };
        Ok(())
    }

    fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == SESSION_COOKIE)
            .map(|(_, value)| value.to_string())
    }

    /// Post a command envelope and return the decoded response body
    ///
    /// Transport failures (connect, timeout, TLS, unreadable body) go to the
    /// failure handler once and yield `None`.
    pub async fn send_command(&self, method: &str, params: CommandParams) -> Option<Value> {
        info!(device = %self.name, method = method, "Start command");

        let request = CommandRequest::new(method, &params);
        debug!(device = %self.name, payload = ?request, "Command payload");

        let result = async {
            let response = self
                .http
                .post(self.command_url.clone())
                .json(&request)
                .send()
                .await?;
            response.json::<Value>().await
        }
        .await;

        match result {
            Ok(body) => {
                info!(device = %self.name, method = method, "Completed command");
                Some(body)
            }
            Err(e) => {
                warn!(device = %self.name, method = method, error = %e, "Command failed");
                self.on_failure
                    .on_transport_failure(&ClientError::Transport(e));
                None
            }
        }
    }

    /// Query the current position
    ///
    /// `Ok(None)` means the request never completed (already reported to the
    /// failure handler). A device-side failure is returned as a `Status`
    /// carrying an error.
    pub async fn get_status(&self) -> Result<Option<Status>, ClientError> {
        let Some(data) = self
            .send_command(methods::STATUS_POSITION, CommandParams::new())
            .await
        else {
            return Ok(None);
        };

        debug!(device = %self.name, response = %data, "Status response");
        let status = Status::from_value(&data)?;
        debug!(device = %self.name, status = ?status, "Status decoded");

        if let Some(reason) = status.error() {
            warn!(
                device = %self.name,
                target_id = %status.target_id,
                reason = reason,
                "Status query rejected"
            );
        }

        Ok(Some(status))
    }

    /// Query device identity; the address is always the one this client
    /// connects to
    pub async fn get_info(&self) -> Result<Option<Device>, ClientError> {
        let Some(data) = self
            .send_command(methods::STATUS_INFO, CommandParams::new())
            .await
        else {
            return Ok(None);
        };

        let info = data.get("info").ok_or(ModelError::MissingField("info"))?;
        let device = Device::from_info(self.ip, info)?;
        debug!(device = %self.name, info = ?device, "Device info decoded");
        Ok(Some(device))
    }

    /// Start opening; returns whether the device answered
    pub async fn up(&self) -> bool {
        let sent = self
            .send_command(methods::MOVE_UP, CommandParams::new().priority(PRIORITY_NORMAL))
            .await
            .is_some();
        info!(device = %self.name, "Moving up");
        sent
    }

    /// Start closing; returns whether the device answered
    pub async fn down(&self) -> bool {
        let sent = self
            .send_command(methods::MOVE_DOWN, CommandParams::new().priority(PRIORITY_NORMAL))
            .await
            .is_some();
        info!(device = %self.name, "Moving down");
        sent
    }

    /// Move to an absolute device-native position (0-100)
    pub async fn move_to(&self, position: u8) -> Result<bool, ClientError> {
        if position > 100 {
            return Err(ClientError::InvalidPosition(position));
        }

        info!(device = %self.name, position = position, "Moving to position");
        let params = CommandParams::new()
            .priority(PRIORITY_HIGH)
            .position(position);
        Ok(self.send_command(methods::MOVE_TO, params).await.is_some())
    }

    /// Jog in `direction` for `duration_ms`
    pub async fn move_relative(&self, direction: Direction, duration_ms: u32) -> bool {
        info!(
            device = %self.name,
            direction = %direction,
            duration_ms = duration_ms,
            "Moving relative"
        );
        let params = CommandParams::new()
            .direction(direction)
            .duration(duration_ms);
        self.send_command(methods::SETTINGS_MOVE_RELATIVE, params)
            .await
            .is_some()
    }

    pub async fn stop(&self) -> bool {
        let sent = self
            .send_command(methods::MOVE_STOP, CommandParams::new().priority(PRIORITY_HIGH))
            .await
            .is_some();
        info!(device = %self.name, "Stopping");
        sent
    }

    /// Store the current physical position as the given travel limit
    pub async fn set_limit(&self, setting: LimitSetting) -> bool {
        info!(device = %self.name, limit = %setting, "Setting end limit");
        let params = CommandParams::new()
            .end_limit(setting)
            .mode(methods::END_LIMIT_AT_CURRENT_POSITION);
        self.send_command(methods::SETTINGS_END_LIMIT, params)
            .await
            .is_some()
    }

    /// Stop if moving, otherwise reverse the last direction of travel
    ///
    /// Returns `Ok(false)` without commanding anything when no usable status
    /// could be read.
    pub async fn toggle(&self) -> Result<bool, ClientError> {
        let Some(status) = self.get_status().await? else {
            return Ok(false);
        };
        let Some(direction) = status.direction() else {
            return Ok(false);
        };

        let sent = if status.is_moving() {
            self.stop().await
        } else if direction == Direction::Up {
            self.down().await
        } else {
            self.up().await
        };
        Ok(sent)
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("name", &self.name)
            .field("ip", &self.ip)
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
