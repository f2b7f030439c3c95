//! Discovery error type

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),
    #[error("Remote ARP service URL missing")]
    MissingArpUrl,
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
