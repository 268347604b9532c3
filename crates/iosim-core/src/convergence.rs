// ── Routing convergence ──
//
// Recomputes every derived route in a topology from configuration alone:
// link status, connected routes, then synchronous distance-vector rounds
// until no table changes. Static routes pass through untouched.
//
// Only interfaces enabled by a `network` statement take part: their
// connected prefixes are advertised, and updates cross a link only when
// the sender runs a protocol on its end that is not passive there and the
// receiver runs the same protocol on the other end.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{
    DeviceConfig, DeviceId, Endpoint, Interface, Ipv4Prefix, Link, LinkStatus, Route, Topology,
};

type Prefixes = BTreeMap<DeviceId, BTreeSet<Ipv4Prefix>>;

/// RIP's infinity: routes further than this are never installed.
pub const DEFAULT_MAX_HOPS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceOptions {
    pub max_hops: u32,
    /// Round limit. `None` uses the device count, which is enough for any
    /// loop-free shortest-path exchange to settle.
    pub max_iterations: Option<usize>,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Exchange rounds run, including the final round that changed nothing.
    pub iterations: usize,
    pub converged: bool,
    pub links_up: usize,
    pub links_down: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converged {
    pub topology: Topology,
    pub report: ConvergenceReport,
}

// ── Link evaluation ─────────────────────────────────────────────────

/// Two interfaces can carry traffic when both are admin up and hold
/// distinct addresses in the same subnet.
pub fn interfaces_compatible(a: &Interface, b: &Interface) -> bool {
    if !(a.is_admin_up() && b.is_admin_up()) {
        return false;
    }
    match (a.address, b.address) {
        (Some(x), Some(y)) => x.network() == y.network() && x.addr() != y.addr(),
        _ => false,
    }
}

/// Resolves link endpoints against a topology, optionally reading one
/// device from a newer snapshot than the one stored in the topology.
pub struct LinkView<'t> {
    topology: &'t Topology,
    local: Option<(&'t DeviceId, &'t DeviceConfig)>,
}

impl<'t> LinkView<'t> {
    pub fn new(topology: &'t Topology) -> Self {
        Self {
            topology,
            local: None,
        }
    }

    pub fn with_local(topology: &'t Topology, id: &'t DeviceId, config: &'t DeviceConfig) -> Self {
        Self {
            topology,
            local: Some((id, config)),
        }
    }

    pub fn device(&self, id: &DeviceId) -> Option<&'t DeviceConfig> {
        match self.local {
            Some((local_id, config)) if local_id == id => Some(config),
            _ => self.topology.devices.get(id),
        }
    }

    /// The interface an endpoint names, with its map key.
    pub fn interface(&self, endpoint: &Endpoint) -> Option<(&'t str, &'t Interface)> {
        let device = self.device(&endpoint.device)?;
        let key = device.resolve_interface(&endpoint.interface)?;
        device
            .interfaces
            .get_key_value(key)
            .map(|(name, iface)| (name.as_str(), iface))
    }

    pub fn status(&self, link: &Link) -> LinkStatus {
        match (self.interface(&link.a), self.interface(&link.b)) {
            (Some((_, a)), Some((_, b))) if interfaces_compatible(a, b) => LinkStatus::Up,
            _ => LinkStatus::Down,
        }
    }

    /// Operational state of `interface_key` on `device`: admin up, and if
    /// it terminates any link, at least one of those links is up.
    pub fn interface_is_up(&self, device: &DeviceId, interface_key: &str) -> bool {
        let Some(config) = self.device(device) else {
            return false;
        };
        let Some(iface) = config.interfaces.get(interface_key) else {
            return false;
        };
        if !iface.is_admin_up() {
            return false;
        }
        let mut attached = self
            .topology
            .links
            .iter()
            .filter(|link| link.peer_of(device, config, interface_key).is_some())
            .peekable();
        if attached.peek().is_none() {
            return true;
        }
        attached.any(|link| self.status(link).is_up())
    }
}

// ── Distance-vector exchange ────────────────────────────────────────

/// An up link seen from the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Adjacency {
    local: DeviceId,
    local_interface: String,
    neighbor: DeviceId,
    neighbor_address: Ipv4Addr,
}

/// A learned route. Field order is the tie-break order: fewest hops, then
/// lowest neighbor id, then exit interface, then next hop.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    hops: u32,
    learned_from: DeviceId,
    interface: String,
    next_hop: Ipv4Addr,
}

type Tables = BTreeMap<DeviceId, BTreeMap<Ipv4Prefix, Candidate>>;

fn adjacencies(topology: &Topology) -> Vec<Adjacency> {
    let view = LinkView::new(topology);
    let mut out = Vec::new();
    for link in topology.links.iter().filter(|l| l.status.is_up()) {
        if link.a.device == link.b.device {
            continue;
        }
        let (Some((a_key, a_iface)), Some((b_key, b_iface))) =
            (view.interface(&link.a), view.interface(&link.b))
        else {
            continue;
        };
        let (Some(a_addr), Some(b_addr)) = (a_iface.address, b_iface.address) else {
            continue;
        };
        let (Some(a_dev), Some(b_dev)) = (view.device(&link.a.device), view.device(&link.b.device))
        else {
            continue;
        };
        if carries_updates((b_dev, b_key, b_addr.addr()), (a_dev, a_addr.addr())) {
            out.push(Adjacency {
                local: link.a.device.clone(),
                local_interface: a_key.to_owned(),
                neighbor: link.b.device.clone(),
                neighbor_address: b_addr.addr(),
            });
        }
        if carries_updates((a_dev, a_key, a_addr.addr()), (b_dev, b_addr.addr())) {
            out.push(Adjacency {
                local: link.b.device.clone(),
                local_interface: b_key.to_owned(),
                neighbor: link.a.device.clone(),
                neighbor_address: a_addr.addr(),
            });
        }
    }
    out.sort();
    out
}

/// Updates flow from `sender` out of its interface to `receiver` when some
/// protocol sends on the sender's end and also runs on the receiver's.
fn carries_updates(
    (sender, sender_iface, sender_addr): (&DeviceConfig, &str, Ipv4Addr),
    (receiver, receiver_addr): (&DeviceConfig, Ipv4Addr),
) -> bool {
    sender.routing.iter().any(|process| {
        process.sends_on(sender_iface, sender_addr)
            && receiver
                .routing_process(process.protocol)
                .is_some_and(|p| p.enables(receiver_addr))
    })
}

fn exchange_round(
    adjacencies: &[Adjacency],
    connected: &BTreeMap<DeviceId, BTreeMap<Ipv4Prefix, String>>,
    advertised: &Prefixes,
    statics: &Prefixes,
    previous: &Tables,
    max_hops: u32,
) -> Tables {
    let mut next = Tables::new();
    for adj in adjacencies {
        let local_connected = connected.get(&adj.local);
        let local_statics = statics.get(&adj.local);

        let mut offers: Vec<(Ipv4Prefix, u32)> = Vec::new();
        if let Some(nets) = advertised.get(&adj.neighbor) {
            offers.extend(nets.iter().map(|p| (*p, 1)));
        }
        if let Some(learned) = previous.get(&adj.neighbor) {
            // Split horizon: never echo a route back to the device it came from.
            offers.extend(
                learned
                    .iter()
                    .filter(|(_, c)| c.learned_from != adj.local)
                    .map(|(p, c)| (*p, c.hops + 1)),
            );
        }

        for (prefix, hops) in offers {
            if hops > max_hops
                || local_connected.is_some_and(|c| c.contains_key(&prefix))
                || local_statics.is_some_and(|s| s.contains(&prefix))
            {
                continue;
            }
            let candidate = Candidate {
                hops,
                learned_from: adj.neighbor.clone(),
                interface: adj.local_interface.clone(),
                next_hop: adj.neighbor_address,
            };
            let better = next
                .get(&adj.local)
                .and_then(|table| table.get(&prefix))
                .is_none_or(|existing| candidate < *existing);
            if better {
                next.entry(adj.local.clone())
                    .or_default()
                    .insert(prefix, candidate);
            }
        }
    }
    next
}

// ── Entry point ─────────────────────────────────────────────────────

/// Recompute link status and all derived routes. Deterministic: the same
/// topology always yields the same tables.
pub fn converge(mut topology: Topology, options: &ConvergenceOptions) -> Converged {
    let statuses: Vec<LinkStatus> = {
        let view = LinkView::new(&topology);
        topology.links.iter().map(|l| view.status(l)).collect()
    };
    for (link, status) in topology.links.iter_mut().zip(&statuses) {
        link.status = *status;
    }
    let links_up = statuses.iter().filter(|s| s.is_up()).count();
    let links_down = statuses.len() - links_up;

    let mut connected: BTreeMap<DeviceId, BTreeMap<Ipv4Prefix, String>> = BTreeMap::new();
    let mut advertised = Prefixes::new();
    let mut statics = Prefixes::new();
    {
        let view = LinkView::new(&topology);
        for (id, device) in &topology.devices {
            let nets = connected.entry(id.clone()).or_default();
            let offered = advertised.entry(id.clone()).or_default();
            for (name, iface) in &device.interfaces {
                let Some(address) = iface.address else {
                    continue;
                };
                if !view.interface_is_up(id, name) {
                    continue;
                }
                nets.entry(address.network()).or_insert_with(|| name.clone());
                if device.routing.iter().any(|p| p.enables(address.addr())) {
                    offered.insert(address.network());
                }
            }
            statics.insert(
                id.clone(),
                device
                    .routes
                    .iter()
                    .filter(|r| r.is_static())
                    .map(|r| r.destination)
                    .collect(),
            );
        }
    }

    let adjacencies = adjacencies(&topology);
    let bound = options
        .max_iterations
        .unwrap_or(topology.devices.len())
        .max(1);

    let mut tables = Tables::new();
    let mut iterations = 0;
    let mut converged = false;
    while iterations < bound {
        iterations += 1;
        let next = exchange_round(
            &adjacencies,
            &connected,
            &advertised,
            &statics,
            &tables,
            options.max_hops,
        );
        let changed = next != tables;
        debug!(round = iterations, changed, "distance-vector round");
        tables = next;
        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            iterations,
            devices = topology.devices.len(),
            "routing did not converge within the iteration bound; keeping last tables"
        );
    }

    for (id, device) in &mut topology.devices {
        let mut routes: Vec<Route> = device.routes.iter().filter(|r| r.is_static()).cloned().collect();
        if let Some(nets) = connected.get(id) {
            routes.extend(
                nets.iter()
                    .map(|(prefix, iface)| Route::connected(*prefix, iface.clone())),
            );
        }
        if let Some(learned) = tables.get(id) {
            routes.extend(learned.iter().map(|(prefix, c)| {
                Route::dynamic(
                    *prefix,
                    c.next_hop,
                    c.interface.clone(),
                    c.hops,
                    c.learned_from.clone(),
                )
            }));
        }
        device.routes = routes;
    }

    let report = ConvergenceReport {
        iterations,
        converged,
        links_up,
        links_down,
    };
    debug!(?report, "convergence finished");
    Converged { topology, report }
}
