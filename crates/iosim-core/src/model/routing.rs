// ── Routing protocol configuration ──

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

/// A routing protocol instance as named on the `router` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum RoutingProtocol {
    Rip,
    Ospf { process_id: u32 },
    Eigrp { asn: u32 },
}

impl RoutingProtocol {
    /// Route-table code shown by `show ip route`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Rip => "R",
            Self::Ospf { .. } => "O",
            Self::Eigrp { .. } => "D",
        }
    }

    pub fn admin_distance(self) -> u8 {
        match self {
            Self::Rip => 120,
            Self::Ospf { .. } => 110,
            Self::Eigrp { .. } => 90,
        }
    }
}

impl fmt::Display for RoutingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rip => f.write_str("rip"),
            Self::Ospf { process_id } => write!(f, "ospf {process_id}"),
            Self::Eigrp { asn } => write!(f, "eigrp {asn}"),
        }
    }
}

/// A `network` statement under a routing process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatement {
    pub address: Ipv4Addr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<u32>,
}

impl NetworkStatement {
    /// A bare statement (`network 10.0.0.0`), matched on class boundaries.
    pub fn classful(address: Ipv4Addr) -> Self {
        Self {
            address,
            wildcard: None,
            area: None,
        }
    }

    /// Whether an interface holding `addr` is enabled by this statement.
    /// Without a wildcard the statement address's class picks the mask.
    pub fn covers(&self, addr: Ipv4Addr) -> bool {
        let ignored = match self.wildcard {
            Some(wildcard) => u32::from(wildcard),
            None => match self.address.octets()[0] {
                0..=127 => 0x00FF_FFFF,
                128..=191 => 0x0000_FFFF,
                _ => 0x0000_00FF,
            },
        };
        (u32::from(self.address) & !ignored) == (u32::from(addr) & !ignored)
    }
}

impl fmt::Display for NetworkStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "network {}", self.address)?;
        if let Some(wildcard) = self.wildcard {
            write!(f, " {wildcard}")?;
        }
        if let Some(area) = self.area {
            write!(f, " area {area}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingProcess {
    pub protocol: RoutingProtocol,
    #[serde(default)]
    pub networks: Vec<NetworkStatement>,
    #[serde(default)]
    pub passive_interfaces: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(default = "default_auto_summary")]
    pub auto_summary: bool,
}

fn default_auto_summary() -> bool {
    true
}

impl RoutingProcess {
    pub fn new(protocol: RoutingProtocol) -> Self {
        Self {
            protocol,
            networks: Vec::new(),
            passive_interfaces: BTreeSet::new(),
            version: None,
            auto_summary: !matches!(protocol, RoutingProtocol::Ospf { .. }),
        }
    }

    /// Adds classful statements, skipping ones already present.
    #[must_use]
    pub fn with_networks(mut self, addresses: &[Ipv4Addr]) -> Self {
        for &address in addresses {
            let statement = NetworkStatement::classful(address);
            if !self.networks.contains(&statement) {
                self.networks.push(statement);
            }
        }
        self
    }

    /// The process runs on an interface holding `addr`.
    pub fn enables(&self, addr: Ipv4Addr) -> bool {
        self.networks.iter().any(|n| n.covers(addr))
    }

    /// The process sends updates out of `interface` (a canonical name).
    pub fn sends_on(&self, interface: &str, addr: Ipv4Addr) -> bool {
        self.enables(addr) && !self.passive_interfaces.contains(interface)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_router_command() {
        assert_eq!(RoutingProtocol::Rip.to_string(), "rip");
        assert_eq!(RoutingProtocol::Ospf { process_id: 1 }.to_string(), "ospf 1");
        assert_eq!(RoutingProtocol::Eigrp { asn: 100 }.to_string(), "eigrp 100");
    }

    #[test]
    fn network_statement_display() {
        let stmt = NetworkStatement {
            address: "10.0.0.0".parse().unwrap(),
            wildcard: Some("0.0.0.255".parse().unwrap()),
            area: Some(0),
        };
        assert_eq!(stmt.to_string(), "network 10.0.0.0 0.0.0.255 area 0");
    }

    #[test]
    fn classful_statement_covers_its_class() {
        let ip = |s: &str| s.parse::<Ipv4Addr>().unwrap();
        let a = NetworkStatement::classful(ip("10.0.0.0"));
        assert!(a.covers(ip("10.200.3.1")));
        assert!(!a.covers(ip("11.0.0.1")));

        let b = NetworkStatement::classful(ip("172.16.0.0"));
        assert!(b.covers(ip("172.16.9.9")));
        assert!(!b.covers(ip("172.17.0.1")));

        let c = NetworkStatement::classful(ip("192.168.2.0"));
        assert!(c.covers(ip("192.168.2.1")));
        assert!(!c.covers(ip("192.168.3.1")));
    }

    #[test]
    fn wildcard_statement_covers_masked_range() {
        let ip = |s: &str| s.parse::<Ipv4Addr>().unwrap();
        let stmt = NetworkStatement {
            address: ip("10.0.12.0"),
            wildcard: Some(ip("0.0.0.3")),
            area: Some(0),
        };
        assert!(stmt.covers(ip("10.0.12.2")));
        assert!(!stmt.covers(ip("10.0.12.5")));
    }

    #[test]
    fn passive_interface_still_enables_but_does_not_send() {
        let ip = |s: &str| s.parse::<Ipv4Addr>().unwrap();
        let mut rip = RoutingProcess::new(RoutingProtocol::Rip).with_networks(&[ip("10.0.0.0")]);
        rip.passive_interfaces.insert("GigabitEthernet0/0".into());
        assert!(rip.enables(ip("10.0.0.1")));
        assert!(!rip.sends_on("GigabitEthernet0/0", ip("10.0.0.1")));
        assert!(rip.sends_on("GigabitEthernet0/1", ip("10.0.1.1")));
    }

    #[test]
    fn protocol_serializes_with_name_tag() {
        let json = serde_json::to_value(RoutingProtocol::Ospf { process_id: 7 }).unwrap();
        assert_eq!(json["name"], "ospf");
        assert_eq!(json["process_id"], 7);
    }
}
