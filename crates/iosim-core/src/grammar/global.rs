// Global configuration mode: `Router(config)#`.

use super::{CONFIG_COMMON, Cmd, Keyword, OnMiss, Step, config_common, keyword};
use crate::command::CommandResult;
use crate::model::{
    AclAction, AclEntry, AclKind, AclMatch, DEFAULT_HOSTNAME, Interface, InterfaceName,
    Ipv4Prefix, Mode, Route, RoutingProcess, RoutingProtocol, Vlan, VlanId, addr,
    is_valid_hostname,
};

const GLOBAL: &[&str] = &[
    "access-list",
    "banner",
    "hostname",
    "interface",
    "ip",
    "no",
    "router",
    "vlan",
];

const NO: &[&str] = &["access-list", "banner", "hostname", "ip", "router", "vlan"];

const IP: &[&str] = &["domain-name", "route", "routing"];

const PROTOCOLS: &[&str] = &["eigrp", "ospf", "rip"];

const ACL_PROTOCOLS: &[&str] = &["icmp", "ip", "tcp", "udp"];

pub(super) fn evaluate(cx: &Cmd<'_>) -> Step<CommandResult> {
    let table: Vec<&str> = GLOBAL.iter().chain(CONFIG_COMMON.iter()).copied().collect();
    let command = cx.keyword(0, &table, OnMiss::Defer)?;
    match command {
        "do" | "end" | "exit" => config_common(cx, command, Mode::Privileged),
        "access-list" => access_list(cx),
        "banner" => banner(cx),
        "hostname" => hostname(cx),
        "interface" => interface(cx),
        "ip" => ip(cx),
        "no" => no(&cx.shifted(1)),
        "router" => router(cx),
        _ => vlan(cx),
    }
}

fn no(cx: &Cmd<'_>) -> Step<CommandResult> {
    let mut next = cx.state.clone();
    let mut output = "";
    match cx.keyword(0, NO, OnMiss::Defer)? {
        "access-list" => {
            let list = cx.number(1, 1..=199)?.to_string();
            cx.end(2)?;
            next.acl_entries.retain(|e| e.list != list);
        }
        "banner" => {
            cx.keyword(1, &["motd"], OnMiss::Defer)?;
            cx.end(2)?;
            next.banner_motd = None;
        }
        "hostname" => {
            cx.end(1)?;
            DEFAULT_HOSTNAME.clone_into(&mut next.hostname);
        }
        "ip" => match cx.keyword(1, IP, OnMiss::Defer)? {
            "domain-name" => {
                // IOS accepts the old name as a trailing argument.
                if cx.line.len() > 3 {
                    return Err(cx.invalid_at(3));
                }
                next.domain_name = None;
            }
            "route" => {
                let (destination, target) = route_destination(cx, 2)?;
                let before = next.routes.len();
                next.routes
                    .retain(|r| !(r.is_static() && r.destination == destination && target.matches(r)));
                if next.routes.len() == before {
                    output = "%No matching route to delete";
                }
            }
            _ => cx.end(2)?,
        },
        "router" => {
            let protocol = routing_protocol(cx, 1)?;
            next.routing.retain(|p| p.protocol != protocol);
        }
        _ => {
            let id = vlan_id(cx, 1)?;
            cx.end(2)?;
            if id == VlanId::DEFAULT {
                return Err(Cmd::fail("%Default VLAN 1 may not be deleted."));
            }
            next.vlans.remove(&id);
        }
    }
    Ok(CommandResult::transition(cx.state, next, output))
}

fn hostname(cx: &Cmd<'_>) -> Step<CommandResult> {
    let name = cx.arg(1)?;
    cx.end(2)?;
    if !is_valid_hostname(name) {
        return Err(Cmd::fail("% Hostname contains one or more illegal characters."));
    }
    let mut next = cx.state.clone();
    name.clone_into(&mut next.hostname);
    Ok(CommandResult::transition(cx.state, next, ""))
}

/// `interface <name>`: existing ports are entered, software interfaces
/// (loopback, SVI, tunnel, port-channel) are created on first use.
fn interface(cx: &Cmd<'_>) -> Step<CommandResult> {
    let raw = cx.arg(1).and_then(|_| cx.line.rest(1).ok_or_else(|| cx.incomplete()))?;
    if cx.line.len() > 3 {
        return Err(cx.invalid_at(3));
    }
    let name = InterfaceName::parse(raw).ok_or_else(|| cx.invalid_at(1))?;

    let mut next = cx.state.clone();
    let key = match cx.state.resolve_interface(&name.canonical()) {
        Some(key) => key.to_owned(),
        None if name.kind.is_virtual() => {
            let key = name.canonical();
            next.interfaces.insert(key.clone(), Interface::default());
            key
        }
        None => return Err(cx.invalid_at(1)),
    };
    next.mode = Mode::InterfaceConfig { interface: key };
    Ok(CommandResult::transition(cx.state, next, ""))
}

fn vlan(cx: &Cmd<'_>) -> Step<CommandResult> {
    let id = vlan_id(cx, 1)?;
    cx.end(2)?;
    let mut next = cx.state.clone();
    next.vlans
        .entry(id)
        .or_insert_with(|| Vlan::with_default_name(id));
    next.mode = Mode::VlanConfig { vlan: id };
    Ok(CommandResult::transition(cx.state, next, ""))
}

fn router(cx: &Cmd<'_>) -> Step<CommandResult> {
    let protocol = routing_protocol(cx, 1)?;
    let mut next = cx.state.clone();
    if next.routing_process(protocol).is_none() {
        next.routing.push(RoutingProcess::new(protocol));
    }
    next.mode = Mode::RouterConfig { protocol };
    Ok(CommandResult::transition(cx.state, next, ""))
}

fn ip(cx: &Cmd<'_>) -> Step<CommandResult> {
    let mut next = cx.state.clone();
    match cx.keyword(1, IP, OnMiss::Defer)? {
        "domain-name" => {
            let name = cx.arg(2)?;
            cx.end(3)?;
            next.domain_name = Some(name.to_owned());
        }
        "route" => {
            let route = static_route(cx, 2)?;
            if !next.routes.contains(&route) {
                next.routes.push(route);
            }
        }
        // `ip routing` is always on.
        _ => cx.end(2)?,
    }
    Ok(CommandResult::transition(cx.state, next, ""))
}

fn banner(cx: &Cmd<'_>) -> Step<CommandResult> {
    cx.keyword(1, &["motd"], OnMiss::Defer)?;
    let body = cx.line.rest(2).ok_or_else(|| cx.incomplete())?;
    let mut chars = body.chars();
    let delimiter = chars.next().ok_or_else(|| cx.incomplete())?;
    let text = chars.as_str();
    let text = text.find(delimiter).map_or(text, |end| &text[..end]);

    let mut next = cx.state.clone();
    next.banner_motd = Some(text.to_owned());
    Ok(CommandResult::transition(cx.state, next, ""))
}

// ── access-list ─────────────────────────────────────────────────────

fn access_list(cx: &Cmd<'_>) -> Step<CommandResult> {
    let number = cx.number(1, 1..=199)?;
    let kind = u16::try_from(number)
        .ok()
        .and_then(AclKind::for_number)
        .ok_or_else(|| cx.invalid_at(1))?;
    let action = match cx.keyword(2, &["deny", "permit"], OnMiss::Reject)? {
        "permit" => AclAction::Permit,
        _ => AclAction::Deny,
    };

    let entry = match kind {
        AclKind::Standard => {
            let (source, at) = acl_match(cx, 3, true)?;
            cx.end(at)?;
            AclEntry {
                list: number.to_string(),
                action,
                protocol: None,
                source,
                destination: None,
                port: None,
            }
        }
        AclKind::Extended => {
            let protocol = acl_protocol(cx, 3)?;
            let (source, at) = acl_match(cx, 4, false)?;
            let (destination, at) = acl_match(cx, at, false)?;
            let port = if cx.line.get(at).is_some() {
                cx.keyword(at, &["eq"], OnMiss::Reject)?;
                if !matches!(protocol.as_str(), "tcp" | "udp") {
                    return Err(cx.invalid_at(at));
                }
                let port = cx.arg(at + 1)?;
                cx.end(at + 2)?;
                Some(port.to_owned())
            } else {
                None
            };
            AclEntry {
                list: number.to_string(),
                action,
                protocol: Some(protocol),
                source,
                destination: Some(destination),
                port,
            }
        }
    };

    let mut next = cx.state.clone();
    next.acl_entries.push(entry);
    Ok(CommandResult::transition(cx.state, next, ""))
}

fn acl_protocol(cx: &Cmd<'_>, at: usize) -> Step<String> {
    let token = cx.arg(at)?;
    match keyword(token, ACL_PROTOCOLS) {
        Keyword::Hit(proto) => Ok(proto.to_owned()),
        Keyword::Ambiguous => Err(cx.ambiguous()),
        Keyword::Miss if token.parse::<u8>().is_ok() => Ok(token.to_owned()),
        Keyword::Miss => Err(cx.invalid_at(at)),
    }
}

/// Parse `any | host A.B.C.D | A.B.C.D [wildcard]` starting at `at`.
/// Standard lists treat a bare address as a host; extended lists require
/// the wildcard. Returns the match and the index after it.
fn acl_match(cx: &Cmd<'_>, at: usize, standard: bool) -> Step<(AclMatch, usize)> {
    match keyword(cx.arg(at)?, &["any", "host"]) {
        Keyword::Hit("any") => Ok((AclMatch::Any, at + 1)),
        Keyword::Hit(_) => Ok((
            AclMatch::Host {
                address: cx.ipv4(at + 1)?,
            },
            at + 2,
        )),
        Keyword::Ambiguous => Err(cx.ambiguous()),
        Keyword::Miss => {
            let address = cx.ipv4(at)?;
            let wildcard = match cx.line.get(at + 1).and_then(addr::parse_ipv4) {
                Some(wildcard) => wildcard,
                None if standard => return Ok((AclMatch::Host { address }, at + 1)),
                None => return Err(cx.invalid_at(at + 1)),
            };
            let clause = if wildcard.is_unspecified() {
                AclMatch::Host { address }
            } else {
                AclMatch::Wildcard { address, wildcard }
            };
            Ok((clause, at + 2))
        }
    }
}

// ── Shared argument parsers ─────────────────────────────────────────

fn vlan_id(cx: &Cmd<'_>, at: usize) -> Step<VlanId> {
    VlanId::parse(cx.arg(at)?).ok_or_else(|| cx.invalid_at(at))
}

/// `rip | ospf <pid> | eigrp <asn>` at `at`, consuming the rest of the line.
fn routing_protocol(cx: &Cmd<'_>, at: usize) -> Step<RoutingProtocol> {
    let protocol = match cx.keyword(at, PROTOCOLS, OnMiss::Defer)? {
        "rip" => {
            cx.end(at + 1)?;
            return Ok(RoutingProtocol::Rip);
        }
        "ospf" => RoutingProtocol::Ospf {
            process_id: cx.number(at + 1, 1..=65535)?,
        },
        _ => RoutingProtocol::Eigrp {
            asn: cx.number(at + 1, 1..=65535)?,
        },
    };
    cx.end(at + 2)?;
    Ok(protocol)
}

/// Where a static route sends traffic, as typed on `no ip route`.
enum RouteTarget {
    Any,
    NextHop(std::net::Ipv4Addr),
    Interface(String),
}

impl RouteTarget {
    fn matches(&self, route: &Route) -> bool {
        match self {
            Self::Any => true,
            Self::NextHop(hop) => route.next_hop == Some(*hop),
            Self::Interface(key) => route.interface.as_deref() == Some(key.as_str()),
        }
    }
}

/// `<network> <mask> [<next-hop> | <interface>]` starting at `at`.
fn route_destination(cx: &Cmd<'_>, at: usize) -> Step<(Ipv4Prefix, RouteTarget)> {
    let network = cx.ipv4(at)?;
    let len = cx.mask(at + 1)?;
    let destination = Ipv4Prefix::new(network, len).ok_or_else(|| cx.invalid_at(at + 1))?;
    if !destination.is_network() {
        return Err(Cmd::fail("%Inconsistent address and mask"));
    }
    let Some(token) = cx.line.get(at + 2) else {
        return Ok((destination, RouteTarget::Any));
    };
    let target = match addr::parse_ipv4(token) {
        Some(hop) => RouteTarget::NextHop(hop),
        None => RouteTarget::Interface(
            cx.state
                .resolve_interface(token)
                .ok_or_else(|| cx.invalid_at(at + 2))?
                .to_owned(),
        ),
    };
    cx.end(at + 3)?;
    Ok((destination, target))
}

fn static_route(cx: &Cmd<'_>, at: usize) -> Step<Route> {
    let (destination, target) = route_destination(cx, at)?;
    match target {
        RouteTarget::Any => Err(cx.incomplete()),
        RouteTarget::NextHop(hop) => {
            if cx.state.interface_with_address(hop).is_some() {
                return Err(Cmd::fail("%Invalid next hop address (it's this router)"));
            }
            Ok(Route::static_via(destination, hop))
        }
        RouteTarget::Interface(key) => Ok(Route::static_out(destination, key)),
    }
}
