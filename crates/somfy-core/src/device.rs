//! Device identity records

use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;

use crate::error::ModelError;

/// Placeholder the firmware reports for a shade that was never named
const UNDEFINED_NAME: &str = "undefined";

/// Identifying and descriptive record for a blind controller
///
/// Built either from a `status.info` response or, partially, from discovery
/// (ip and mac only). Every descriptive field is emitted on serialization,
/// absent ones as `null`. A record without an address decodes with `ip` set
/// to `0.0.0.0`, which is left out again on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Address the device is reached at
    #[serde(default = "unknown_ip", skip_serializing_if = "Ipv4Addr::is_unspecified")]
    pub ip: Ipv4Addr,
    /// Hardware address, if known
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub hardware: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// User-assigned name (`"undefined"` on the wire decodes to `None`)
    #[serde(default, deserialize_with = "defined_name")]
    pub name: Option<String>,
}

/// Device-info object as nested under `info` in a `status.info` response
///
/// The self-reported `ip` is not read; the connection target is trusted instead.
#[derive(Debug, Deserialize)]
struct InfoPayload {
    #[serde(default)]
    mac: Option<String>,
    #[serde(default)]
    firmware: Option<String>,
    #[serde(default)]
    hardware: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default, deserialize_with = "defined_name")]
    name: Option<String>,
}

fn unknown_ip() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

fn defined_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.filter(|n| n != UNDEFINED_NAME))
}

impl Device {
    /// Create a partial record from a discovery hit
    pub fn discovered(ip: Ipv4Addr, mac: Option<String>) -> Self {
        Self {
            ip,
            mac,
            firmware: None,
            hardware: None,
            hostname: None,
            model: None,
            name: None,
        }
    }

    /// Decode a device-info object, using `ip` in place of whatever address
    /// the device reports about itself
    pub fn from_info(ip: Ipv4Addr, info: &serde_json::Value) -> Result<Self, ModelError> {
        if !info.is_object() {
            return Err(ModelError::InvalidValue {
                field: "info",
                value: info.to_string(),
            });
        }

        let payload = InfoPayload::deserialize(info)?;
        Ok(Self {
            ip,
            mac: payload.mac,
            firmware: payload.firmware,
            hardware: payload.hardware,
            hostname: payload.hostname,
            model: payload.model,
            name: payload.name,
        })
    }

    /// Best human-readable label: name, then hostname, then address
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.hostname.clone())
            .unwrap_or_else(|| self.ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info_body(name: &str) -> serde_json::Value {
        json!({
            "ip": "10.0.7.117",
            "mac": "4C:C2:06:00:00:01",
            "firmware": "1.2.3",
            "hardware": "rev-b",
            "hostname": "somfy-poe-0001",
            "model": "PoE Motor",
            "name": name,
        })
    }

    #[test]
    fn test_device_round_trip_preserves_fields() {
        let body = info_body("Kitchen");
        let device: Device = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(device.name.as_deref(), Some("Kitchen"));
        assert_eq!(serde_json::to_value(&device).unwrap(), body);
    }

    #[test]
    fn test_device_round_trip_without_ip() {
        let mut body = info_body("Kitchen");
        body.as_object_mut().unwrap().remove("ip");

        let device: Device = serde_json::from_value(body.clone()).unwrap();
        assert!(device.ip.is_unspecified());
        assert_eq!(device.hostname.as_deref(), Some("somfy-poe-0001"));
        assert_eq!(serde_json::to_value(&device).unwrap(), body);
    }

    #[test]
    fn test_undefined_name_is_absent() {
        let device: Device = serde_json::from_value(info_body("undefined")).unwrap();
        assert_eq!(device.name, None);

        let device = Device::from_info(Ipv4Addr::new(10, 0, 7, 117), &info_body("undefined")).unwrap();
        assert_eq!(device.name, None);
    }

    #[test]
    fn test_from_info_overlays_connection_ip() {
        let target = Ipv4Addr::new(192, 168, 1, 50);
        let device = Device::from_info(target, &info_body("Office")).unwrap();
        assert_eq!(device.ip, target);
        assert_eq!(device.hostname.as_deref(), Some("somfy-poe-0001"));
        assert_eq!(device.mac.as_deref(), Some("4C:C2:06:00:00:01"));
    }

    #[test]
    fn test_from_info_tolerates_missing_fields() {
        let device = Device::from_info(Ipv4Addr::new(10, 0, 0, 2), &json!({"model": "PoE"})).unwrap();
        assert_eq!(device.model.as_deref(), Some("PoE"));
        assert_eq!(device.firmware, None);
        assert_eq!(device.name, None);
    }

    #[test]
    fn test_from_info_rejects_non_object() {
        let result = Device::from_info(Ipv4Addr::new(10, 0, 0, 2), &json!("nope"));
        assert!(matches!(result, Err(ModelError::InvalidValue { field: "info", .. })));
    }

    #[test]
    fn test_discovered_serializes_nulls() {
        let device = Device::discovered(Ipv4Addr::new(10, 0, 0, 2), Some("4C:C2:06:00:00:01".into()));
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["ip"], "10.0.0.2");
        assert_eq!(value["mac"], "4C:C2:06:00:00:01");
        assert!(value["name"].is_null());
        assert_eq!(device.label(), "10.0.0.2");
    }
}
