// ── Interface domain types ──
//
// Interface naming follows IOS: any unambiguous prefix of the type name
// followed by the slot/port numbering (`g0/0`, `Gig0/0`, `GigabitEthernet0/0`
// all name the same port). Lookups compare canonical forms, so the map key
// a caller chose for an interface is preserved as-is.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use super::addr::Ipv4Prefix;
use super::vlan::VlanId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum InterfaceKind {
    Ethernet,
    FastEthernet,
    GigabitEthernet,
    TenGigabitEthernet,
    Serial,
    Loopback,
    Vlan,
    Tunnel,
    PortChannel,
}

impl InterfaceKind {
    pub fn full_name(self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::FastEthernet => "FastEthernet",
            Self::GigabitEthernet => "GigabitEthernet",
            Self::TenGigabitEthernet => "TenGigabitEthernet",
            Self::Serial => "Serial",
            Self::Loopback => "Loopback",
            Self::Vlan => "Vlan",
            Self::Tunnel => "Tunnel",
            Self::PortChannel => "Port-channel",
        }
    }

    /// Two-letter form used by `show vlan` port lists.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Ethernet => "Et",
            Self::FastEthernet => "Fa",
            Self::GigabitEthernet => "Gi",
            Self::TenGigabitEthernet => "Te",
            Self::Serial => "Se",
            Self::Loopback => "Lo",
            Self::Vlan => "Vl",
            Self::Tunnel => "Tu",
            Self::PortChannel => "Po",
        }
    }

    /// Three-letter form used by `show cdp neighbors`.
    pub fn cdp_name(self) -> &'static str {
        match self {
            Self::Ethernet => "Eth",
            Self::FastEthernet => "Fas",
            Self::GigabitEthernet => "Gig",
            Self::TenGigabitEthernet => "Ten",
            Self::Serial => "Ser",
            Self::Loopback => "Loo",
            Self::Vlan => "Vla",
            Self::Tunnel => "Tun",
            Self::PortChannel => "Por",
        }
    }

    /// Software interfaces are created on first reference.
    pub fn is_virtual(self) -> bool {
        matches!(
            self,
            Self::Loopback | Self::Vlan | Self::Tunnel | Self::PortChannel
        )
    }

    pub fn bandwidth_kbps(self) -> u64 {
        match self {
            Self::Ethernet => 10_000,
            Self::FastEthernet => 100_000,
            Self::GigabitEthernet | Self::Vlan | Self::PortChannel => 1_000_000,
            Self::TenGigabitEthernet => 10_000_000,
            Self::Serial => 1_544,
            Self::Loopback => 8_000_000,
            Self::Tunnel => 100,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = Self::iter().filter(|k| k.full_name().to_ascii_lowercase().starts_with(&prefix));
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }
}

/// A parsed interface reference: kind plus slot/port numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceName {
    pub kind: InterfaceKind,
    pub number: String,
}

impl InterfaceName {
    /// Parse `raw` (`g0/0`, `Loopback 0`, `fa0/1.10`). Whitespace between
    /// the type and the number is tolerated.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw: String = raw.split_whitespace().collect();
        let split = raw.find(|c: char| c.is_ascii_digit())?;
        let (prefix, number) = raw.split_at(split);
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return None;
        }
        let numbering_ok = number
            .split(['/', '.', ':'])
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()));
        if !numbering_ok {
            return None;
        }
        Some(Self {
            kind: InterfaceKind::from_prefix(prefix)?,
            number: number.to_owned(),
        })
    }

    pub fn canonical(&self) -> String {
        format!("{}{}", self.kind.full_name(), self.number)
    }

    pub fn short(&self) -> String {
        format!("{}{}", self.kind.short_name(), self.number)
    }

    pub fn cdp(&self) -> String {
        format!("{} {}", self.kind.cdp_name(), self.number)
    }
}

/// Canonical spelling of an interface reference, if it parses.
pub fn canonical_interface_name(raw: &str) -> Option<String> {
    InterfaceName::parse(raw).map(|n| n.canonical())
}

/// Short form for display, falling back to the name as given.
pub fn short_interface_name(raw: &str) -> String {
    InterfaceName::parse(raw).map_or_else(|| raw.to_owned(), |n| n.short())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchportMode {
    Access,
    Trunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclDirection {
    In,
    Out,
}

/// Configured state of one interface. Every field defaults, so sparse
/// snapshots (`{"address": "10.0.0.1/30"}`) describe an admin-up port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    pub shutdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Ipv4Prefix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switchport: Option<SwitchportMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<VlanId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_out: Option<String>,
}

impl Interface {
    /// A port that ships administratively down (router Ethernet ports).
    pub fn shut() -> Self {
        Self {
            shutdown: true,
            ..Self::default()
        }
    }

    /// An access-mode switch port in VLAN 1.
    pub fn access_port() -> Self {
        Self {
            switchport: Some(SwitchportMode::Access),
            access_vlan: Some(VlanId::DEFAULT),
            ..Self::default()
        }
    }

    pub fn is_admin_up(&self) -> bool {
        !self.shutdown
    }

    pub fn is_switchport(&self) -> bool {
        self.switchport.is_some()
    }

    /// VLAN an access port carries traffic for; trunks and routed ports have none.
    pub fn effective_access_vlan(&self) -> Option<VlanId> {
        match self.switchport {
            Some(SwitchportMode::Access) => Some(self.access_vlan.unwrap_or(VlanId::DEFAULT)),
            _ => None,
        }
    }

    pub fn acl(&self, direction: AclDirection) -> Option<&str> {
        match direction {
            AclDirection::In => self.acl_in.as_deref(),
            AclDirection::Out => self.acl_out.as_deref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_canonicalize() {
        for raw in ["g0/0", "gi0/0", "Gig0/0", "GigabitEthernet0/0", "gigabitethernet 0/0"] {
            assert_eq!(
                canonical_interface_name(raw).as_deref(),
                Some("GigabitEthernet0/0"),
                "{raw}"
            );
        }
        assert_eq!(canonical_interface_name("fa0/1").as_deref(), Some("FastEthernet0/1"));
        assert_eq!(canonical_interface_name("lo0").as_deref(), Some("Loopback0"));
        assert_eq!(canonical_interface_name("vlan10").as_deref(), Some("Vlan10"));
        assert_eq!(canonical_interface_name("po1").as_deref(), Some("Port-channel1"));
        assert_eq!(
            canonical_interface_name("s0/0/0").as_deref(),
            Some("Serial0/0/0")
        );
    }

    #[test]
    fn ambiguous_or_malformed_names_fail() {
        assert!(canonical_interface_name("t0").is_none());
        assert!(canonical_interface_name("gx0/0").is_none());
        assert!(canonical_interface_name("gig").is_none());
        assert!(canonical_interface_name("gig0//0").is_none());
        assert!(canonical_interface_name("0/0").is_none());
    }

    #[test]
    fn subinterfaces_parse() {
        let name = InterfaceName::parse("g0/0.10").unwrap();
        assert_eq!(name.canonical(), "GigabitEthernet0/0.10");
        assert_eq!(name.short(), "Gi0/0.10");
        assert_eq!(name.cdp(), "Gig 0/0.10");
    }

    #[test]
    fn access_vlan_defaults_to_one_for_access_ports() {
        assert_eq!(Interface::access_port().effective_access_vlan(), Some(VlanId::DEFAULT));
        assert_eq!(Interface::default().effective_access_vlan(), None);
    }

    #[test]
    fn sparse_json_is_admin_up() {
        let iface: Interface = serde_json::from_str(r#"{"address": "10.0.0.1/30"}"#).unwrap();
        assert!(iface.is_admin_up());
        assert_eq!(iface.address.unwrap().to_string(), "10.0.0.1/30");
    }
}
