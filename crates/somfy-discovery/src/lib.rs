//! Somfy Discovery - Finding Somfy PoE blinds on a local network
//!
//! This crate provides two discovery modes:
//! - MAC-targeted: ping each host, resolve its hardware address (local
//!   neighbor table or a remote ARP service) and keep vendor prefix matches
//! - Ping-only: probe each host's web UI for the Somfy banner

pub mod arp;
pub mod error;
pub mod local;
pub mod mac;
pub mod probe;
pub mod scanner;
pub mod subnet;

pub use arp::{build_resolver, ArpMode, LocalArpResolver, MacResolver, RemoteArpResolver};
pub use error::DiscoveryError;
pub use local::guess_local_subnet;
pub use mac::{extract_mac, matches_vendor_prefix, normalize_mac, VENDOR_MAC_PREFIXES};
pub use probe::{IcmpProbe, LivenessProbe, WebUiProbe, LIVENESS_TIMEOUT};
pub use scanner::{identify_scan, DiscoveredDevice, DiscoveryScanner, ScannerConfig};
pub use subnet::Subnet;
