//! Local interface inspection

use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use tracing::debug;

use crate::subnet::Subnet;

/// Prefix assumed for the guessed subnet
const ASSUMED_PREFIX: u8 = 24;

/// Guess the subnet to scan from the first non-loopback IPv4 interface,
/// assuming a /24
pub fn guess_local_subnet() -> Option<Subnet> {
    let interfaces = match NetworkInterface::show() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            debug!(error = %e, "Cannot list network interfaces");
            return None;
        }
    };

    let ip = interfaces.iter().find_map(|iface| {
        iface.addr.iter().find_map(|addr| match addr {
            network_interface::Addr::V4(v4) if !v4.ip.is_loopback() => Some(v4.ip),
            _ => None,
        })
    })?;

    let subnet = Subnet::new(ip, ASSUMED_PREFIX).ok()?;
    debug!(ip = %ip, subnet = %subnet, "Guessed local subnet");
    Some(subnet)
}
