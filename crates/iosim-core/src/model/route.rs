// ── Routing table entries ──

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use super::addr::Ipv4Prefix;
use super::topology::DeviceId;

/// How a route entered the table. Connected and dynamic routes are
/// recomputed by convergence; static routes are only ever changed by
/// configuration commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Static,
    Connected,
    Dynamic,
}

impl RouteSource {
    pub fn is_derived(self) -> bool {
        !matches!(self, Self::Static)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination network, always in network form.
    pub destination: Ipv4Prefix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default)]
    pub hops: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_from: Option<DeviceId>,
    pub source: RouteSource,
}

impl Route {
    pub fn static_via(destination: Ipv4Prefix, next_hop: Ipv4Addr) -> Self {
        Self {
            destination: destination.network(),
            next_hop: Some(next_hop),
            interface: None,
            hops: 0,
            learned_from: None,
            source: RouteSource::Static,
        }
    }

    pub fn static_out(destination: Ipv4Prefix, interface: impl Into<String>) -> Self {
        Self {
            destination: destination.network(),
            next_hop: None,
            interface: Some(interface.into()),
            hops: 0,
            learned_from: None,
            source: RouteSource::Static,
        }
    }

    pub fn connected(destination: Ipv4Prefix, interface: impl Into<String>) -> Self {
        Self {
            destination: destination.network(),
            next_hop: None,
            interface: Some(interface.into()),
            hops: 0,
            learned_from: None,
            source: RouteSource::Connected,
        }
    }

    pub fn dynamic(
        destination: Ipv4Prefix,
        next_hop: Ipv4Addr,
        interface: impl Into<String>,
        hops: u32,
        learned_from: DeviceId,
    ) -> Self {
        Self {
            destination: destination.network(),
            next_hop: Some(next_hop),
            interface: Some(interface.into()),
            hops,
            learned_from: Some(learned_from),
            source: RouteSource::Dynamic,
        }
    }

    pub fn is_static(&self) -> bool {
        self.source == RouteSource::Static
    }
}

/// Longest-prefix match over `routes`.
pub fn lookup(routes: &[Route], ip: Ipv4Addr) -> Option<&Route> {
    routes
        .iter()
        .filter(|r| r.destination.contains(ip))
        .max_by_key(|r| r.destination.prefix_len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn prefix(s: &str) -> Ipv4Prefix {
        s.parse().unwrap()
    }

    #[test]
    fn constructors_normalize_destination() {
        let r = Route::connected(prefix("10.0.0.1/30"), "GigabitEthernet0/0");
        assert_eq!(r.destination.to_string(), "10.0.0.0/30");
        assert!(r.source.is_derived());
        assert!(!Route::static_via(prefix("0.0.0.0/0"), "10.0.0.2".parse().unwrap())
            .source
            .is_derived());
    }

    #[test]
    fn lookup_prefers_longest_prefix() {
        let routes = vec![
            Route::static_via(prefix("0.0.0.0/0"), "10.0.0.2".parse().unwrap()),
            Route::connected(prefix("192.168.1.0/24"), "GigabitEthernet0/1"),
            Route::static_via(prefix("192.168.1.128/25"), "10.0.0.6".parse().unwrap()),
        ];
        let hit = lookup(&routes, "192.168.1.200".parse().unwrap()).unwrap();
        assert_eq!(hit.destination.to_string(), "192.168.1.128/25");
        let hit = lookup(&routes, "8.8.8.8".parse().unwrap()).unwrap();
        assert_eq!(hit.destination.prefix_len(), 0);
    }
}
