// ── Device configuration snapshot ──

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::acl::AclEntry;
use super::interface::{Interface, canonical_interface_name};
use super::mode::Mode;
use super::route::{Route, RouteSource};
use super::routing::{RoutingProcess, RoutingProtocol};
use super::vlan::{Vlan, VlanId};

pub const DEFAULT_HOSTNAME: &str = "Router";

/// Full configured state of one simulated device, including the CLI mode
/// its session is in. Snapshots are plain values: every command produces
/// a new snapshot rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub hostname: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub interfaces: BTreeMap<String, Interface>,
    #[serde(default)]
    pub vlans: BTreeMap<VlanId, Vlan>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub acl_entries: Vec<AclEntry>,
    #[serde(default)]
    pub routing: Vec<RoutingProcess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_motd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
}

impl DeviceConfig {
    /// A device with no interfaces, in user EXEC mode.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            mode: Mode::User,
            interfaces: BTreeMap::new(),
            vlans: BTreeMap::new(),
            routes: Vec::new(),
            acl_entries: Vec::new(),
            routing: Vec::new(),
            banner_motd: None,
            domain_name: None,
        }
    }

    /// A three-port router. Ethernet ports ship administratively down.
    pub fn router(hostname: impl Into<String>) -> Self {
        let mut device = Self::new(hostname);
        for port in 0..3 {
            device
                .interfaces
                .insert(format!("GigabitEthernet0/{port}"), Interface::shut());
        }
        device
    }

    /// A 24-port access switch: every port up in VLAN 1, plus two uplinks
    /// and a shut `Vlan1` management interface.
    pub fn switch(hostname: impl Into<String>) -> Self {
        let mut device = Self::new(hostname);
        device
            .vlans
            .insert(VlanId::DEFAULT, Vlan::with_default_name(VlanId::DEFAULT));
        for port in 1..=24 {
            device
                .interfaces
                .insert(format!("FastEthernet0/{port}"), Interface::access_port());
        }
        for port in 1..=2 {
            device
                .interfaces
                .insert(format!("GigabitEthernet0/{port}"), Interface::access_port());
        }
        device.interfaces.insert("Vlan1".into(), Interface::shut());
        device
    }

    pub fn prompt(&self) -> String {
        format!("{}{}", self.hostname, self.mode.prompt_suffix())
    }

    /// Find the map key of the interface `raw` refers to, accepting any
    /// abbreviation that canonicalizes to the same name.
    pub fn resolve_interface(&self, raw: &str) -> Option<&str> {
        if let Some((key, _)) = self.interfaces.get_key_value(raw) {
            return Some(key.as_str());
        }
        let wanted = canonical_interface_name(raw)?;
        self.interfaces
            .keys()
            .find(|key| canonical_interface_name(key).as_deref() == Some(wanted.as_str()))
            .map(String::as_str)
    }

    pub fn routing_process(&self, protocol: RoutingProtocol) -> Option<&RoutingProcess> {
        self.routing.iter().find(|p| p.protocol == protocol)
    }

    pub fn routing_process_mut(&mut self, protocol: RoutingProtocol) -> Option<&mut RoutingProcess> {
        self.routing.iter_mut().find(|p| p.protocol == protocol)
    }

    /// Protocol that labels learned routes in `show ip route`.
    pub fn dynamic_protocol(&self) -> RoutingProtocol {
        self.routing
            .first()
            .map_or(RoutingProtocol::Rip, |p| p.protocol)
    }

    pub fn routes_from(&self, source: RouteSource) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |r| r.source == source)
    }

    /// Interface holding `ip` as its own address.
    pub fn interface_with_address(&self, ip: Ipv4Addr) -> Option<(&str, &Interface)> {
        self.interfaces
            .iter()
            .find(|(_, iface)| iface.address.is_some_and(|a| a.addr() == ip))
            .map(|(name, iface)| (name.as_str(), iface))
    }

    /// Whether any port runs as a switchport; decides the CDP capability.
    pub fn is_switch(&self) -> bool {
        self.interfaces.values().any(Interface::is_switchport)
    }

    /// Check the structural invariants every snapshot must hold.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_hostname(&self.hostname) {
            return Err(format!("invalid hostname {:?}", self.hostname));
        }
        match &self.mode {
            Mode::InterfaceConfig { interface } if self.resolve_interface(interface).is_none() => {
                return Err(format!("mode references unknown interface {interface}"));
            }
            Mode::VlanConfig { vlan } if !self.vlans.contains_key(vlan) => {
                return Err(format!("mode references unknown VLAN {vlan}"));
            }
            Mode::RouterConfig { protocol } if self.routing_process(*protocol).is_none() => {
                return Err(format!("mode references unconfigured process router {protocol}"));
            }
            _ => {}
        }
        for route in &self.routes {
            if !route.destination.is_network() {
                return Err(format!("route destination {} has host bits set", route.destination));
            }
            if let Some(name) = &route.interface {
                if self.resolve_interface(name).is_none() {
                    return Err(format!(
                        "route to {} uses unknown interface {name}",
                        route.destination
                    ));
                }
            }
        }
        Ok(())
    }
}

/// IOS hostnames: a letter first, then letters, digits, or hyphens, at
/// most 63 characters, not ending in a hyphen.
pub fn is_valid_hostname(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && first.is_ascii_alphabetic()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !name.ends_with('-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn router_ports_ship_shut() {
        let r1 = DeviceConfig::router("R1");
        assert_eq!(r1.interfaces.len(), 3);
        assert!(r1.interfaces.values().all(|i| i.shutdown));
        assert_eq!(r1.prompt(), "R1>");
        assert!(!r1.is_switch());
    }

    #[test]
    fn switch_has_default_vlan_and_access_ports() {
        let sw = DeviceConfig::switch("SW1");
        assert_eq!(sw.vlans[&VlanId::DEFAULT].name, "default");
        assert_eq!(sw.interfaces.len(), 27);
        assert!(sw.is_switch());
        assert!(sw.interfaces["FastEthernet0/24"].is_admin_up());
    }

    #[test]
    fn resolve_interface_accepts_abbreviations() {
        let r1 = DeviceConfig::router("R1");
        assert_eq!(r1.resolve_interface("g0/1"), Some("GigabitEthernet0/1"));
        assert_eq!(r1.resolve_interface("Gig0/2"), Some("GigabitEthernet0/2"));
        assert_eq!(r1.resolve_interface("g0/3"), None);
    }

    #[test]
    fn resolve_interface_preserves_caller_keys() {
        let mut dev = DeviceConfig::new("R9");
        dev.interfaces.insert("Gig0/0".into(), Interface::default());
        assert_eq!(dev.resolve_interface("GigabitEthernet0/0"), Some("Gig0/0"));
    }

    #[test]
    fn hostname_rules() {
        assert!(is_valid_hostname("R1"));
        assert!(is_valid_hostname("core-sw-01"));
        assert!(!is_valid_hostname("1R"));
        assert!(!is_valid_hostname("bad name"));
        assert!(!is_valid_hostname("trailing-"));
        assert!(!is_valid_hostname(""));
    }

    #[test]
    fn validate_rejects_dangling_route_interface() {
        let mut r1 = DeviceConfig::router("R1");
        r1.routes.push(Route::static_out(
            "192.168.0.0/24".parse().unwrap(),
            "Serial0/0/0",
        ));
        assert!(r1.validate().is_err());
    }

    #[test]
    fn validate_rejects_mode_for_missing_vlan() {
        let mut sw = DeviceConfig::switch("SW1");
        sw.mode = Mode::VlanConfig {
            vlan: VlanId::new(30).unwrap(),
        };
        assert!(sw.validate().is_err());
    }

    #[test]
    fn minimal_json_snapshot_deserializes() {
        let dev: DeviceConfig = serde_json::from_str(r#"{"hostname": "R7"}"#).unwrap();
        assert_eq!(dev.mode, Mode::User);
        assert!(dev.interfaces.is_empty());
    }
}
