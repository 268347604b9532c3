// ── Topology: devices and the links between them ──

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use super::device::DeviceConfig;

/// Caller-chosen identifier for a device in a topology. Independent of
/// the device's hostname, which commands may change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One end of a link: a device and one of its interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub device: DeviceId,
    pub interface: String,
}

impl Endpoint {
    pub fn new(device: impl Into<DeviceId>, interface: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            interface: interface.into(),
        }
    }

    /// Whether this endpoint names `interface_key` on `device`, given the
    /// device's current configuration for abbreviation matching.
    pub fn is(&self, device: &DeviceId, config: &DeviceConfig, interface_key: &str) -> bool {
        &self.device == device && config.resolve_interface(&self.interface) == Some(interface_key)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.interface)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    #[default]
    Down,
}

impl LinkStatus {
    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// A point-to-point cable. `status` is derived by convergence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: Endpoint,
    pub b: Endpoint,
    #[serde(default)]
    pub status: LinkStatus,
}

impl Link {
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        Self {
            a,
            b,
            status: LinkStatus::Down,
        }
    }

    /// The far end as seen from `device`/`interface_key`, if this link
    /// terminates there.
    pub fn peer_of(
        &self,
        device: &DeviceId,
        config: &DeviceConfig,
        interface_key: &str,
    ) -> Option<&Endpoint> {
        if self.a.is(device, config, interface_key) {
            Some(&self.b)
        } else if self.b.is(device, config, interface_key) {
            Some(&self.a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub devices: BTreeMap<DeviceId, DeviceConfig>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// A topology holding just `device`, used to refresh connected routes
    /// for a standalone session.
    pub fn single(id: impl Into<DeviceId>, device: DeviceConfig) -> Self {
        let mut topology = Self::new();
        topology.devices.insert(id.into(), device);
        topology
    }

    pub fn with_device(mut self, id: impl Into<DeviceId>, device: DeviceConfig) -> Self {
        self.devices.insert(id.into(), device);
        self
    }

    pub fn with_link(mut self, a: Endpoint, b: Endpoint) -> Self {
        self.links.push(Link::new(a, b));
        self
    }

    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.get(id)
    }

    /// Hostname of the device stored under `id`.
    pub fn hostname_of(&self, id: &DeviceId) -> Option<&str> {
        self.devices.get(id).map(|d| d.hostname.as_str())
    }
}

/// A topology plus the device a command is being run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyContext {
    pub topology: Topology,
    pub device_id: DeviceId,
}

impl TopologyContext {
    pub fn new(topology: Topology, device_id: impl Into<DeviceId>) -> Self {
        Self {
            topology,
            device_id: device_id.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn peer_lookup_matches_abbreviated_endpoints() {
        let r1 = DeviceConfig::router("R1");
        let link = Link::new(Endpoint::new("r1", "g0/0"), Endpoint::new("r2", "Gig0/1"));
        let id = DeviceId::from("r1");

        let peer = link.peer_of(&id, &r1, "GigabitEthernet0/0").unwrap();
        assert_eq!(peer.device.as_str(), "r2");
        assert!(link.peer_of(&id, &r1, "GigabitEthernet0/1").is_none());
    }

    #[test]
    fn topology_json_defaults_link_status_down() {
        let topo: Topology = serde_json::from_str(
            r#"{
                "devices": {"a": {"hostname": "A"}, "b": {"hostname": "B"}},
                "links": [{"a": {"device": "a", "interface": "Gi0/0"},
                           "b": {"device": "b", "interface": "Gi0/0"}}]
            }"#,
        )
        .unwrap();
        assert_eq!(topo.links[0].status, LinkStatus::Down);
        assert_eq!(topo.device("b").unwrap().hostname, "B");
    }
}
