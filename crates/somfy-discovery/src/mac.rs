//! Hardware address parsing and vendor matching

use regex::Regex;
use std::sync::LazyLock;

/// Organizationally-assigned prefixes of Somfy PoE controllers
pub const VENDOR_MAC_PREFIXES: &[&str] = &["4C:C2:06"];

/// Colon-separated MAC whose octets may have lost their leading zero
static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(([0-9a-fA-F]{1,2}:){5}[0-9a-fA-F]{1,2})").expect("MAC pattern is valid")
});

/// Find the first MAC address in `text` and normalize it
pub fn extract_mac(text: &str) -> Option<String> {
    MAC_PATTERN
        .find(text)
        .map(|m| normalize_mac(m.as_str()))
}

/// Uppercase with every octet padded to two hex digits
pub fn normalize_mac(mac: &str) -> String {
    mac.split(':')
        .map(|octet| format!("{:0>2}", octet.to_uppercase()))
        .collect::<Vec<_>>()
        .join(":")
}

/// Case-insensitive prefix match against any of `prefixes`
pub fn matches_vendor_prefix<S: AsRef<str>>(mac: &str, prefixes: &[S]) -> bool {
    let mac = mac.to_uppercase();
    prefixes
        .iter()
        .any(|prefix| mac.starts_with(&prefix.as_ref().to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pads_and_uppercases() {
        assert_eq!(normalize_mac("4c:c2:6:1:2:3"), "4C:C2:06:01:02:03");
        assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF"), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_extract_from_arp_output() {
        let output = "? (10.0.7.117) at 4c:c2:6:a:b:c [ether] on eth0";
        assert_eq!(extract_mac(output).as_deref(), Some("4C:C2:06:0A:0B:0C"));
    }

    #[test]
    fn test_extract_from_ip_neigh_output() {
        let output = "10.0.7.117 dev eth0 lladdr 4c:c2:06:aa:bb:cc REACHABLE";
        assert_eq!(extract_mac(output).as_deref(), Some("4C:C2:06:AA:BB:CC"));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_mac("10.0.7.117 dev eth0 INCOMPLETE"), None);
        assert_eq!(extract_mac("no entry for 10.0.7.5"), None);
    }

    #[test]
    fn test_vendor_prefix_match() {
        assert!(matches_vendor_prefix("4C:C2:06:AA:BB:CC", VENDOR_MAC_PREFIXES));
        assert!(matches_vendor_prefix("4c:c2:06:aa:bb:cc", VENDOR_MAC_PREFIXES));
        assert!(!matches_vendor_prefix("4C:C2:07:AA:BB:CC", VENDOR_MAC_PREFIXES));

        let custom = vec!["aa:bb:cc".to_string()];
        assert!(matches_vendor_prefix("AA:BB:CC:00:00:01", &custom));
    }
}
