//! Somfy Core - Device and status model for Somfy PoE blinds
//!
//! This crate provides the data types decoded from device responses:
//! - Device identity records (from `status.info` or from discovery)
//! - Shade position and status snapshots (from `status.position`)
//! - Direction and travel-limit enumerations used by motion commands

pub mod device;
pub mod error;
pub mod status;

pub use device::Device;
pub use error::ModelError;
pub use status::{Direction, LimitSetting, Position, Status, StatusOutcome};
