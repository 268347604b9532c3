// `show` commands. Output mimics IOS 15 formatting closely enough for lab
// exercises; timers, counters, and MAC addresses are left out.

use std::fmt::Write as _;

use super::{Cmd, OnMiss, Step};
use crate::command::CommandResult;
use crate::convergence::LinkView;
use crate::model::{
    AclEntry, AclKind, DeviceConfig, Interface, InterfaceKind, InterfaceName, Ipv4Prefix, Route,
    RouteSource, RoutingProtocol, SwitchportMode, VlanId, short_interface_name,
};

const SHOW_USER: &[&str] = &["cdp", "interfaces", "ip", "version"];

const SHOW_PRIVILEGED: &[&str] = &[
    "access-lists",
    "cdp",
    "interfaces",
    "ip",
    "running-config",
    "version",
    "vlan",
];

pub(super) fn evaluate(cx: &Cmd<'_>, privileged: bool) -> Step<CommandResult> {
    let table = if privileged { SHOW_PRIVILEGED } else { SHOW_USER };
    let output = match cx.keyword(0, table, OnMiss::Defer)? {
        "access-lists" => {
            let filter = cx.line.get(1);
            cx.end(2)?;
            access_lists(cx.state, filter)
        }
        "cdp" => {
            cx.keyword(1, &["neighbors"], OnMiss::Defer)?;
            cx.end(2)?;
            cdp_neighbors(cx)
        }
        "interfaces" => match cx.line.rest(1) {
            None => cx
                .state
                .interfaces
                .iter()
                .map(|(name, iface)| interface_detail(cx, name, iface))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(raw) => {
                if cx.line.len() > 3 {
                    return Err(cx.invalid_at(3));
                }
                let key = cx
                    .state
                    .resolve_interface(raw)
                    .ok_or_else(|| cx.invalid_at(1))?;
                match cx.state.interfaces.get(key) {
                    Some(iface) => interface_detail(cx, key, iface),
                    None => return Err(cx.invalid_at(1)),
                }
            }
        },
        "ip" => match cx.keyword(1, &["interface", "route"], OnMiss::Defer)? {
            "route" => {
                cx.end(2)?;
                ip_route(cx.state)
            }
            _ => {
                cx.keyword(2, &["brief"], OnMiss::Defer)?;
                cx.end(3)?;
                ip_interface_brief(cx)
            }
        },
        "running-config" => {
            cx.end(1)?;
            running_config(cx.state)
        }
        "version" => {
            cx.end(1)?;
            version(cx.state)
        }
        _ => {
            if cx.line.len() > 1 {
                cx.keyword(1, &["brief"], OnMiss::Reject)?;
                cx.end(2)?;
            }
            vlan_brief(cx.state)
        }
    };
    Ok(CommandResult::ok(output))
}

// ── Interface status ────────────────────────────────────────────────

/// `(status, protocol)` as IOS words them.
fn line_state(cx: &Cmd<'_>, key: &str, iface: &Interface) -> (&'static str, &'static str) {
    if iface.shutdown {
        return ("administratively down", "down");
    }
    let up = cx.topology.is_none_or(|ctx| {
        LinkView::with_local(&ctx.topology, &ctx.device_id, cx.state)
            .interface_is_up(&ctx.device_id, key)
    });
    if up { ("up", "up") } else { ("down", "down") }
}

fn kind_of(name: &str) -> InterfaceKind {
    InterfaceName::parse(name).map_or(InterfaceKind::Ethernet, |n| n.kind)
}

/// Sort key giving `Fa0/2` before `Fa0/10`.
fn port_order(name: &str) -> (String, Vec<u32>) {
    let split = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
    let numbers = name[split..]
        .split(['/', '.', ':'])
        .filter_map(|n| n.parse().ok())
        .collect();
    (name[..split].to_owned(), numbers)
}

fn trim_lines(text: &str) -> String {
    text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

fn ip_interface_brief(cx: &Cmd<'_>) -> String {
    let mut names: Vec<&String> = cx.state.interfaces.keys().collect();
    names.sort_by_key(|n| port_order(n));

    let mut out = String::from(
        "Interface              IP-Address      OK? Method Status                Protocol",
    );
    for name in names {
        let Some(iface) = cx.state.interfaces.get(name.as_str()) else {
            continue;
        };
        let (status, protocol) = line_state(cx, name, iface);
        let (ip, method) = iface
            .address
            .map_or(("unassigned".to_owned(), "unset"), |a| {
                (a.addr().to_string(), "manual")
            });
        let _ = write!(
            out,
            "\n{name:<23}{ip:<16}YES {method:<7}{status:<22}{protocol}"
        );
    }
    trim_lines(&out)
}

fn interface_detail(cx: &Cmd<'_>, name: &str, iface: &Interface) -> String {
    let kind = kind_of(name);
    let (status, protocol) = line_state(cx, name, iface);
    let mut out = format!(
        "{name} is {status}, line protocol is {protocol}\n  Hardware is {}",
        kind.full_name()
    );
    if let Some(description) = &iface.description {
        let _ = write!(out, "\n  Description: {description}");
    }
    if let Some(address) = iface.address {
        let _ = write!(out, "\n  Internet address is {address}");
    }
    let (mtu, encapsulation) = if kind == InterfaceKind::Loopback {
        (1514, "LOOPBACK")
    } else {
        (1500, "ARPA")
    };
    let _ = write!(
        out,
        "\n  MTU {mtu} bytes, BW {} Kbit/sec\n  Encapsulation {encapsulation}",
        kind.bandwidth_kbps()
    );
    out
}

// ── Routing table ───────────────────────────────────────────────────

const ROUTE_CODES: &str = "\
Codes: L - local, C - connected, S - static, R - RIP, M - mobile, B - BGP
       D - EIGRP, EX - EIGRP external, O - OSPF, IA - OSPF inter area
       * - candidate default";

fn ip_route(state: &DeviceConfig) -> String {
    let protocol = state.dynamic_protocol();
    let mut entries: Vec<(Ipv4Prefix, u8, String)> = Vec::new();

    for route in &state.routes {
        let dest = route.destination;
        let default = dest.prefix_len() == 0;
        match route.source {
            RouteSource::Connected => {
                let iface = route.interface.as_deref().unwrap_or_default();
                entries.push((dest, 0, format!("{:<9}{dest} is directly connected, {iface}", "C")));
                let local = state
                    .interfaces
                    .get(iface)
                    .and_then(|i| i.address)
                    .filter(|a| a.prefix_len() < 32);
                if let Some(addr) = local {
                    entries.push((
                        dest,
                        1,
                        format!(
                            "{:<9}{}/32 is directly connected, {iface}",
                            "L",
                            addr.addr()
                        ),
                    ));
                }
            }
            RouteSource::Static => {
                let code = if default { "S*" } else { "S" };
                entries.push((dest, 2, format!("{code:<9}{dest} {}", static_target(route))));
            }
            RouteSource::Dynamic => {
                let via = route
                    .next_hop
                    .map(|h| h.to_string())
                    .unwrap_or_default();
                let iface = route.interface.as_deref().unwrap_or_default();
                entries.push((
                    dest,
                    3,
                    format!(
                        "{:<9}{dest} [{}/{}] via {via}, {iface}",
                        protocol.code(),
                        protocol.admin_distance(),
                        route.hops
                    ),
                ));
            }
        }
    }
    entries.sort();

    let gateway = state
        .routes
        .iter()
        .filter(|r| r.destination.prefix_len() == 0)
        .find_map(|r| r.next_hop)
        .map_or_else(
            || "Gateway of last resort is not set".to_owned(),
            |hop| format!("Gateway of last resort is {hop} to network 0.0.0.0"),
        );

    let mut out = format!("{ROUTE_CODES}\n\n{gateway}\n");
    for (_, _, line) in entries {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

fn static_target(route: &Route) -> String {
    match (route.next_hop, &route.interface) {
        (Some(hop), _) => format!("[1/0] via {hop}"),
        (None, Some(iface)) => format!("is directly connected, {iface}"),
        (None, None) => String::new(),
    }
}

// ── Configuration ───────────────────────────────────────────────────

fn running_config(state: &DeviceConfig) -> String {
    let mut body: Vec<String> = vec![
        "!".into(),
        "version 15.2".into(),
        "!".into(),
        format!("hostname {}", state.hostname),
        "!".into(),
    ];

    if let Some(domain) = &state.domain_name {
        body.push(format!("ip domain-name {domain}"));
        body.push("!".into());
    }

    for (id, vlan) in state.vlans.iter().filter(|(id, _)| **id != VlanId::DEFAULT) {
        body.push(format!("vlan {id}"));
        body.push(format!(" name {}", vlan.name));
        body.push("!".into());
    }

    let mut names: Vec<&String> = state.interfaces.keys().collect();
    names.sort_by_key(|n| port_order(n));
    for name in names {
        let Some(iface) = state.interfaces.get(name.as_str()) else {
            continue;
        };
        body.push(format!("interface {name}"));
        if let Some(description) = &iface.description {
            body.push(format!(" description {description}"));
        }
        if let Some(vlan) = iface.access_vlan.filter(|v| *v != VlanId::DEFAULT) {
            body.push(format!(" switchport access vlan {vlan}"));
        }
        match iface.switchport {
            Some(SwitchportMode::Access) => body.push(" switchport mode access".into()),
            Some(SwitchportMode::Trunk) => body.push(" switchport mode trunk".into()),
            None => body.push(iface.address.map_or_else(
                || " no ip address".to_owned(),
                |a| format!(" ip address {} {}", a.addr(), a.mask()),
            )),
        }
        if let Some(acl) = &iface.acl_in {
            body.push(format!(" ip access-group {acl} in"));
        }
        if let Some(acl) = &iface.acl_out {
            body.push(format!(" ip access-group {acl} out"));
        }
        if iface.shutdown {
            body.push(" shutdown".into());
        }
        body.push("!".into());
    }

    for process in &state.routing {
        body.push(format!("router {}", process.protocol));
        if let Some(version) = process.version {
            body.push(format!(" version {version}"));
        }
        for passive in &process.passive_interfaces {
            body.push(format!(" passive-interface {passive}"));
        }
        for network in &process.networks {
            body.push(format!(" {network}"));
        }
        if !process.auto_summary && !matches!(process.protocol, RoutingProtocol::Ospf { .. }) {
            body.push(" no auto-summary".into());
        }
        body.push("!".into());
    }

    let statics: Vec<String> = state
        .routes_from(RouteSource::Static)
        .map(|r| {
            let target = r
                .next_hop
                .map(|h| h.to_string())
                .or_else(|| r.interface.clone())
                .unwrap_or_default();
            format!(
                "ip route {} {} {target}",
                r.destination.addr(),
                r.destination.mask()
            )
        })
        .collect();
    if !statics.is_empty() {
        body.extend(statics);
        body.push("!".into());
    }

    if !state.acl_entries.is_empty() {
        body.extend(state.acl_entries.iter().map(AclEntry::config_line));
        body.push("!".into());
    }

    if let Some(banner) = &state.banner_motd {
        body.push(format!("banner motd ^C{banner}^C"));
        body.push("!".into());
    }

    body.extend(
        ["line con 0", "line vty 0 4", " login", "!", "end"]
            .iter()
            .map(|s| (*s).to_owned()),
    );

    let body = body.join("\n");
    format!(
        "Building configuration...\n\nCurrent configuration : {} bytes\n{body}",
        body.len() + 1
    )
}

fn access_lists(state: &DeviceConfig, filter: Option<&str>) -> String {
    let mut lists: Vec<&str> = Vec::new();
    for entry in &state.acl_entries {
        if !lists.contains(&entry.list.as_str()) {
            lists.push(&entry.list);
        }
    }

    let mut out = Vec::new();
    for list in lists.into_iter().filter(|l| filter.is_none_or(|f| f == *l)) {
        let kind = list
            .parse::<u16>()
            .ok()
            .and_then(AclKind::for_number)
            .unwrap_or(AclKind::Standard);
        out.push(format!("{} IP access list {list}", kind.label()));
        let entries = state.acl_entries.iter().filter(|e| e.list == list);
        for (seq, entry) in (1..).map(|n: u32| n * 10).zip(entries) {
            out.push(format!("    {seq} {}", entry.show_line()));
        }
    }
    out.join("\n")
}

// ── Switching ───────────────────────────────────────────────────────

fn vlan_brief(state: &DeviceConfig) -> String {
    let mut out = vec![
        "VLAN Name                             Status    Ports".to_owned(),
        "---- -------------------------------- --------- -------------------------------"
            .to_owned(),
    ];
    for (id, vlan) in &state.vlans {
        let mut ports: Vec<&String> = state
            .interfaces
            .iter()
            .filter(|(_, iface)| iface.effective_access_vlan() == Some(*id))
            .map(|(name, _)| name)
            .collect();
        ports.sort_by_key(|n| port_order(n));
        let ports: Vec<String> = ports.iter().map(|n| short_interface_name(n)).collect();

        let mut chunks = ports.chunks(4);
        let first = chunks.next().map(|c| c.join(", ")).unwrap_or_default();
        out.push(format!(
            "{:<5}{:<33}{:<10}{first}",
            id.to_string(),
            vlan.name,
            vlan.state.as_str()
        ));
        for chunk in chunks {
            out.push(format!("{:48}{}", "", chunk.join(", ")));
        }
    }
    trim_lines(&out.join("\n"))
}

fn cdp_neighbors(cx: &Cmd<'_>) -> String {
    let mut out = String::from(
        "Capability Codes: R - Router, T - Trans Bridge, B - Source Route Bridge\n                  \
         S - Switch, H - Host, I - IGMP, r - Repeater, P - Phone\n\n\
         Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID",
    );
    let Some(ctx) = cx.topology else {
        return out;
    };

    let view = LinkView::with_local(&ctx.topology, &ctx.device_id, cx.state);
    let mut rows: Vec<(String, String, String, &'static str, &'static str)> = Vec::new();
    for link in &ctx.topology.links {
        let (local, remote) = if link.a.device == ctx.device_id {
            (&link.a, &link.b)
        } else if link.b.device == ctx.device_id {
            (&link.b, &link.a)
        } else {
            continue;
        };
        let (Some((local_key, local_if)), Some((remote_key, remote_if))) =
            (view.interface(local), view.interface(remote))
        else {
            continue;
        };
        let Some(peer) = view.device(&remote.device) else {
            continue;
        };
        if !(local_if.is_admin_up() && remote_if.is_admin_up()) {
            continue;
        }
        let (capability, platform) = if peer.is_switch() {
            ("S I", "WS-C2960")
        } else {
            ("R", "C2900")
        };
        let cdp = |key: &str| InterfaceName::parse(key).map_or_else(|| key.to_owned(), |n| n.cdp());
        rows.push((
            peer.hostname.clone(),
            cdp(local_key),
            cdp(remote_key),
            capability,
            platform,
        ));
    }
    rows.sort();

    for (device, local, port, capability, platform) in rows {
        let _ = write!(
            out,
            "\n{device:<17}{local:<18}{:<11}{capability:<12}{platform:<10}{port}",
            150
        );
    }
    out
}

// ── Platform ────────────────────────────────────────────────────────

fn version(state: &DeviceConfig) -> String {
    let (image, model) = if state.is_switch() {
        ("C2960 Software (C2960-LANBASEK9-M), Version 15.0(2)SE11", "WS-C2960-24TT-L")
    } else {
        ("C2900 Software (C2900-UNIVERSALK9-M), Version 15.2(4)M5", "C2911/K9")
    };

    let mut counts: Vec<(InterfaceKind, usize)> = Vec::new();
    for name in state.interfaces.keys() {
        let kind = kind_of(name);
        if kind.is_virtual() {
            continue;
        }
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }

    let mut out = format!(
        "Cisco IOS Software, {image}, RELEASE SOFTWARE (fc2)\n\
         Technical Support: http://www.cisco.com/techsupport\n\
         Copyright (c) 1986-2016 by Cisco Systems, Inc.\n\n\
         {} uptime is 0 minutes\n\n\
         cisco {model} (revision 1.0) with 491520K/32768K bytes of memory.",
        state.hostname
    );
    for (kind, n) in counts {
        let label = match kind {
            InterfaceKind::GigabitEthernet => "Gigabit Ethernet",
            InterfaceKind::TenGigabitEthernet => "Ten Gigabit Ethernet",
            other => other.full_name(),
        };
        let _ = write!(out, "\n{n} {label} interfaces");
    }
    out.push_str("\n\nConfiguration register is 0x2102");
    out
}
