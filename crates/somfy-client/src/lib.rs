//! Somfy Client - Session and command client for Somfy PoE blinds
//!
//! This crate speaks the device's HTTPS/JSON dialect:
//! - Password login yielding a `sessionId` cookie
//! - JSON-RPC style commands posted to `/req`
//! - Unauthenticated web UI probing for presence checks
//!
//! Transport failures on commands never surface as errors; they are handed to
//! a [`FailureHandler`] and the call yields nothing.

pub mod client;
pub mod command;
pub mod error;
pub mod failure;
pub mod identify;
pub mod transport;

pub use client::{Session, SessionClient, SESSION_COOKIE};
pub use command::{methods, CommandParams, CommandRequest, PRIORITY_HIGH, PRIORITY_NORMAL};
pub use error::ClientError;
pub use failure::{FailureHandler, LogFailureHandler, NoopFailureHandler};
pub use identify::{Identifier, IDENTIFY_TIMEOUT, WEB_UI_BANNER};
pub use transport::{device_url, TransportConfig, DEFAULT_TIMEOUT};
