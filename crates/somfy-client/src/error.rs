//! Client error type

use somfy_core::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid response: {0}")]
    Decode(#[from] ModelError),
    #[error("Position {0} is outside 0-100")]
    InvalidPosition(u8),
}
