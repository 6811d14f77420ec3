// ── Primary address resolution ──
//
// Helpers for the DNS-driven primary-address step: which device names are
// worth resolving, which interface holds the management address, and what
// prefix length a freshly learned address should carry.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::graph::Graph;
use crate::model::{IpAddress, NaturalKey, Port, Subnet};

// Stack-member and MAC-derived AP names never resolve to anything useful.
static MEMBER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s-\s\w+\s?\d+").expect("pattern compiles"));
static AP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AP[A-F0-9]{4}\.[A-F0-9]{4}\.[A-F0-9]{4}").expect("pattern compiles")
});
static HOSTNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9\.\/\?\:\-_=#]+\.[a-zA-Z]{2,6}").expect("pattern compiles"));

/// Interface names probed for a management port, in preference order.
pub const MGMT_PORT_PROBE: [&str; 4] = ["mgmt0", "management", "management0", "Management"];

/// Name given to a management port created because none was found.
pub const MGMT_PORT_NAME: &str = "Management";

/// Whether a device name is eligible for DNS resolution at all.
pub fn eligible(device_name: &str) -> bool {
    !MEMBER_NAME.is_match(device_name) && !AP_NAME.is_match(device_name)
}

/// The hostname-shaped substring of a device name, if any.
pub fn hostname(device_name: &str) -> Option<&str> {
    HOSTNAME.find(device_name).map(|m| m.as_str())
}

/// The device's management port in this graph, by probe order.
pub fn mgmt_port<'a>(graph: &'a Graph, device: &str) -> Option<&'a Port> {
    MGMT_PORT_PROBE
        .iter()
        .find_map(|name| graph.get::<Port>(&NaturalKey::new([device, name])))
}

/// The address already registered for `addr` in this graph, preferring the
/// most specific prefix when several lengths are present.
pub fn find_existing(graph: &Graph, addr: IpAddr) -> Option<&IpAddress> {
    graph
        .all::<IpAddress>()
        .filter_map(|ip| Some((ip, parse_cidr(&ip.address)?)))
        .filter(|(_, (ip_addr, _))| *ip_addr == addr)
        .max_by_key(|(_, (_, bits))| *bits)
        .map(|(ip, _)| ip)
}

/// Prefix length for a newly learned address: the most specific subnet
/// containing it across the given graphs, else a host mask.
pub fn prefix_for(addr: IpAddr, graphs: &[&Graph]) -> u8 {
    graphs
        .iter()
        .flat_map(|graph| graph.all::<Subnet>())
        .filter(|subnet| contains(subnet, addr))
        .map(|subnet| subnet.mask_bits)
        .max()
        .unwrap_or(match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        })
}

fn parse_cidr(address: &str) -> Option<(IpAddr, u8)> {
    let (addr, bits) = address.split_once('/')?;
    Some((addr.parse().ok()?, bits.parse().ok()?))
}

fn contains(subnet: &Subnet, addr: IpAddr) -> bool {
    let Ok(network) = subnet.network.parse::<IpAddr>() else {
        return false;
    };
    match (network, addr) {
        (IpAddr::V4(net), IpAddr::V4(host)) => {
            let bits = u32::from(subnet.mask_bits.min(32));
            let mask = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
            (u32::from(net) & mask) == (u32::from(host) & mask)
        }
        (IpAddr::V6(net), IpAddr::V6(host)) => {
            let bits = u32::from(subnet.mask_bits.min(128));
            let mask = if bits == 0 { 0 } else { u128::MAX << (128 - bits) };
            (u128::from(net) & mask) == (u128::from(host) & mask)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;

    #[test]
    fn member_and_ap_names_are_skipped() {
        assert!(!eligible("C1 - Switch 2"));
        assert!(!eligible("AP0012.3456.789A"));
        assert!(eligible("core-sw01.example.com"));
    }

    #[test]
    fn hostname_extraction_finds_fqdn_shape() {
        assert_eq!(
            hostname("core-sw01.example.com (primary)"),
            Some("core-sw01.example.com")
        );
        assert_eq!(hostname("no dots here"), None);
    }

    #[test]
    fn mgmt_probe_prefers_mgmt0() {
        let mut graph = Graph::default();
        graph
            .insert(Device {
                name: "sw1".into(),
                hardware: "EX".into(),
                ..Device::default()
            })
            .unwrap();
        for name in ["Management", "mgmt0"] {
            graph
                .insert(Port {
                    device: "sw1".into(),
                    name: name.into(),
                    ..Port::default()
                })
                .unwrap();
        }
        assert_eq!(mgmt_port(&graph, "sw1").unwrap().name, "mgmt0");
    }

    #[test]
    fn prefix_comes_from_most_specific_subnet() {
        let mut graph = Graph::default();
        for (network, bits) in [("10.0.0.0", 8), ("10.1.0.0", 16), ("10.1.2.0", 24)] {
            graph
                .insert(Subnet {
                    network: network.into(),
                    mask_bits: bits,
                    ..Subnet::default()
                })
                .unwrap();
        }
        let addr: IpAddr = "10.1.2.3".parse().unwrap();
        assert_eq!(prefix_for(addr, &[&graph]), 24);

        let outside: IpAddr = "192.168.0.1".parse().unwrap();
        assert_eq!(prefix_for(outside, &[&graph]), 32);
    }

    #[test]
    fn existing_lookup_matches_any_prefix_length() {
        let mut graph = Graph::default();
        graph
            .insert(IpAddress {
                address: "10.0.0.5/24".into(),
                ..IpAddress::default()
            })
            .unwrap();
        let found = find_existing(&graph, "10.0.0.5".parse().unwrap()).unwrap();
        assert_eq!(found.address, "10.0.0.5/24");
        assert!(find_existing(&graph, "10.0.0.6".parse().unwrap()).is_none());
    }
}
