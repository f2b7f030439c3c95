//! IPv4 subnet arithmetic and host enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::DiscoveryError;

/// IPv4 network in CIDR form; host bits are always cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, DiscoveryError> {
        if prefix_len > 32 {
            return Err(DiscoveryError::InvalidSubnet(format!(
                "{addr}/{prefix_len}: prefix longer than 32"
            )));
        }
        let network = Ipv4Addr::from(u32::from(addr) & mask(prefix_len));
        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !mask(self.prefix_len))
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = mask(self.prefix_len);
        (u32::from(ip) & mask) == u32::from(self.network)
    }

    /// Usable host addresses
    ///
    /// Network and broadcast addresses are skipped, except for /31
    /// (point-to-point, both usable) and /32 (the single address).
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Send + 'static {
        let network = u32::from(self.network);
        let broadcast = u32::from(self.broadcast());
        let range = match self.prefix_len {
            31 | 32 => network..=broadcast,
            _ => (network + 1)..=(broadcast - 1),
        };
        range.map(Ipv4Addr::from)
    }

    pub fn host_count(&self) -> u64 {
        let size = 1u64 << (32 - u32::from(self.prefix_len));
        match self.prefix_len {
            31 | 32 => size,
            _ => size - 2,
        }
    }
}

fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else if prefix_len >= 32 {
        0xFFFFFFFF
    } else {
        !((1u32 << (32 - prefix_len)) - 1)
    }
}

impl FromStr for Subnet {
    type Err = DiscoveryError;

    /// Parse `a.b.c.d/n`; a bare address is a /32
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = s.split_once('/').unwrap_or((s, "32"));
        let addr = Ipv4Addr::from_str(addr)
            .map_err(|e| DiscoveryError::InvalidSubnet(format!("{s}: {e}")))?;
        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|e| DiscoveryError::InvalidSubnet(format!("{s}: {e}")))?;
        Self::new(addr, prefix_len)
    }
}

impl TryFrom<String> for Subnet {
    type Error = DiscoveryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_24_has_254_hosts() {
        let subnet: Subnet = "10.0.7.0/24".parse().unwrap();
        let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
        assert_eq!(hosts.len(), 254);
        assert_eq!(subnet.host_count(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(10, 0, 7, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(10, 0, 7, 254));
    }

    #[test]
    fn test_slash_30() {
        let subnet: Subnet = "10.0.0.0/30".parse().unwrap();
        let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]);
    }

    #[test]
    fn test_point_to_point_and_single_host() {
        let p2p: Subnet = "10.0.0.0/31".parse().unwrap();
        assert_eq!(p2p.hosts().count(), 2);
        assert_eq!(p2p.host_count(), 2);

        let single: Subnet = "10.0.0.9".parse().unwrap();
        assert_eq!(single.prefix_len(), 32);
        assert_eq!(single.hosts().collect::<Vec<_>>(), vec![Ipv4Addr::new(10, 0, 0, 9)]);
    }

    #[test]
    fn test_host_bits_are_cleared() {
        let subnet: Subnet = "192.168.186.77/24".parse().unwrap();
        assert_eq!(subnet.network(), Ipv4Addr::new(192, 168, 186, 0));
        assert_eq!(subnet.broadcast(), Ipv4Addr::new(192, 168, 186, 255));
        assert_eq!(subnet.to_string(), "192.168.186.0/24");
    }

    #[test]
    fn test_contains() {
        let subnet: Subnet = "192.168.186.0/24".parse().unwrap();
        assert!(subnet.contains(Ipv4Addr::new(192, 168, 186, 1)));
        assert!(subnet.contains(Ipv4Addr::new(192, 168, 186, 255)));
        assert!(!subnet.contains(Ipv4Addr::new(192, 168, 187, 1)));
        assert!(!subnet.contains(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_invalid_subnets() {
        assert!("10.0.0.0/33".parse::<Subnet>().is_err());
        assert!("10.0.0/24".parse::<Subnet>().is_err());
        assert!("10.0.0.0/x".parse::<Subnet>().is_err());
    }
}
