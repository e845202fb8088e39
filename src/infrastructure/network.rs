//! 本机网络地址

use std::net::{IpAddr, Ipv4Addr};

/// 找不到可用地址时的占位文案
pub const UNKNOWN_ADDRESS: &str = "Unable to determine IP address";

/// 第一个非回环 IPv4 地址，找不到时返回占位文案
pub fn network_address() -> String {
    match local_ip_address::list_afinet_netifas() {
        Ok(interfaces) => first_external_ipv4(interfaces.into_iter().map(|(_, ip)| ip))
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to list network interfaces");
            UNKNOWN_ADDRESS.to_string()
        }
    }
}

fn first_external_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(ipv4) if !ipv4.is_loopback() => Some(ipv4),
        _ => None,
    })
}
