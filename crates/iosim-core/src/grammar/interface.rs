// Interface configuration mode: `Router(config-if)#`.

use super::{CONFIG_COMMON, Cmd, OnMiss, Step, config_common};
use crate::command::CommandResult;
use crate::convergence::LinkView;
use crate::model::{
    AclDirection, DeviceConfig, Interface, InterfaceName, Ipv4Prefix, Mode, SwitchportMode, Vlan,
    VlanId,
};

const INTERFACE: &[&str] = &["description", "ip", "no", "shutdown", "switchport"];

const NO: &[&str] = &["description", "ip", "shutdown", "switchport"];

const IP: &[&str] = &["access-group", "address"];

pub(super) fn evaluate(cx: &Cmd<'_>, interface: &str) -> Step<CommandResult> {
    let table: Vec<&str> = INTERFACE.iter().chain(CONFIG_COMMON.iter()).copied().collect();
    let command = cx.keyword(0, &table, OnMiss::Defer)?;
    if matches!(command, "do" | "end" | "exit") {
        return config_common(cx, command, Mode::GlobalConfig);
    }
    let Some(current) = cx.state.interfaces.get(interface) else {
        return Err(Cmd::fail(format!("% Interface {interface} does not exist")));
    };

    match command {
        "description" => {
            let text = cx.arg(1).and_then(|_| cx.line.rest(1).ok_or_else(|| cx.incomplete()))?;
            update(cx, interface, |i| i.description = Some(text.to_owned()))
        }
        "ip" => match cx.keyword(1, IP, OnMiss::Defer)? {
            "address" => ip_address(cx, interface, current),
            _ => {
                let acl = cx.arg(2)?;
                let direction = direction(cx, 3)?;
                cx.end(4)?;
                update(cx, interface, |i| match direction {
                    AclDirection::In => i.acl_in = Some(acl.to_owned()),
                    AclDirection::Out => i.acl_out = Some(acl.to_owned()),
                })
            }
        },
        "no" => no(&cx.shifted(1), interface, current),
        "shutdown" => {
            cx.end(1)?;
            set_shutdown(cx, interface, current, true)
        }
        _ => switchport(cx, interface, current),
    }
}

fn no(cx: &Cmd<'_>, interface: &str, current: &Interface) -> Step<CommandResult> {
    match cx.keyword(0, NO, OnMiss::Defer)? {
        "description" => update(cx, interface, |i| i.description = None),
        "ip" => match cx.keyword(1, IP, OnMiss::Defer)? {
            "address" => update(cx, interface, |i| i.address = None),
            _ => {
                // no ip access-group [<acl>] {in | out}
                let at = match cx.line.len() {
                    0..=2 => return Err(cx.incomplete()),
                    3 => 2,
                    _ => 3,
                };
                let direction = direction(cx, at)?;
                cx.end(at + 1)?;
                update(cx, interface, |i| match direction {
                    AclDirection::In => i.acl_in = None,
                    AclDirection::Out => i.acl_out = None,
                })
            }
        },
        "shutdown" => {
            cx.end(1)?;
            set_shutdown(cx, interface, current, false)
        }
        _ => {
            if cx.line.len() == 1 {
                // Routed port.
                return update(cx, interface, |i| {
                    i.switchport = None;
                    i.access_vlan = None;
                });
            }
            cx.keyword(1, &["access"], OnMiss::Reject)?;
            cx.keyword(2, &["vlan"], OnMiss::Reject)?;
            update(cx, interface, |i| i.access_vlan = None)
        }
    }
}

fn ip_address(cx: &Cmd<'_>, interface: &str, current: &Interface) -> Step<CommandResult> {
    let address = cx.ipv4(2)?;
    let len = cx.mask(3)?;
    cx.end(4)?;

    let prefix = Ipv4Prefix::new(address, len).ok_or_else(|| cx.invalid_at(3))?;
    if len == 0 || prefix.is_reserved_host() {
        return Err(Cmd::fail(format!("Bad mask /{len} for address {address}")));
    }
    if current.is_switchport() {
        return Err(Cmd::fail("% IP addresses may not be configured on L2 links."));
    }
    let clash = cx.state.interfaces.iter().find(|(name, other)| {
        name.as_str() != interface && other.address.is_some_and(|a| a.overlaps(prefix))
    });
    if let Some((name, _)) = clash {
        return Err(Cmd::fail(format!(
            "% {} overlaps with {name}",
            prefix.network().addr()
        )));
    }
    update(cx, interface, |i| i.address = Some(prefix))
}

fn switchport(cx: &Cmd<'_>, interface: &str, current: &Interface) -> Step<CommandResult> {
    if InterfaceName::parse(interface).is_some_and(|n| n.kind.is_virtual()) {
        return Err(cx.invalid_at(0));
    }
    match cx.keyword(1, &["access", "mode"], OnMiss::Reject)? {
        "mode" => {
            let mode = match cx.keyword(2, &["access", "trunk"], OnMiss::Reject)? {
                "access" => SwitchportMode::Access,
                _ => SwitchportMode::Trunk,
            };
            cx.end(3)?;
            update(cx, interface, |i| {
                i.switchport = Some(mode);
                i.address = None;
            })
        }
        _ => {
            cx.keyword(2, &["vlan"], OnMiss::Reject)?;
            let id = VlanId::parse(cx.arg(3)?).ok_or_else(|| cx.invalid_at(3))?;
            cx.end(4)?;

            let mut next = cx.state.clone();
            let mut output = String::new();
            if !next.vlans.contains_key(&id) {
                next.vlans.insert(id, Vlan::with_default_name(id));
                output = format!("% Access VLAN does not exist. Creating vlan {id}");
            }
            if let Some(iface) = next.interfaces.get_mut(interface) {
                iface.switchport = Some(current.switchport.unwrap_or(SwitchportMode::Access));
                iface.access_vlan = Some(id);
                iface.address = None;
            }
            Ok(CommandResult::transition(cx.state, next, output))
        }
    }
}

fn set_shutdown(
    cx: &Cmd<'_>,
    interface: &str,
    current: &Interface,
    shutdown: bool,
) -> Step<CommandResult> {
    let mut next = cx.state.clone();
    if let Some(iface) = next.interfaces.get_mut(interface) {
        iface.shutdown = shutdown;
    }
    let output = if current.shutdown == shutdown {
        String::new()
    } else if shutdown {
        format!("%LINK-5-CHANGED: Interface {interface}, changed state to administratively down")
    } else {
        link_up_log(cx, &next, interface)
    };
    Ok(CommandResult::transition(cx.state, next, output))
}

/// Console messages after `no shutdown`. Whether the line protocol comes
/// up depends on the far end, so the topology is consulted when present.
fn link_up_log(cx: &Cmd<'_>, next: &DeviceConfig, interface: &str) -> String {
    let up = cx.topology.is_none_or(|ctx| {
        LinkView::with_local(&ctx.topology, &ctx.device_id, next)
            .interface_is_up(&ctx.device_id, interface)
    });
    if up {
        format!(
            "%LINK-3-UPDOWN: Interface {interface}, changed state to up\n\
             %LINEPROTO-5-UPDOWN: Line protocol on Interface {interface}, changed state to up"
        )
    } else {
        format!("%LINK-3-UPDOWN: Interface {interface}, changed state to down")
    }
}

fn direction(cx: &Cmd<'_>, at: usize) -> Step<AclDirection> {
    match cx.keyword(at, &["in", "out"], OnMiss::Reject)? {
        "in" => Ok(AclDirection::In),
        _ => Ok(AclDirection::Out),
    }
}

fn update(cx: &Cmd<'_>, interface: &str, apply: impl FnOnce(&mut Interface)) -> Step<CommandResult> {
    let mut next = cx.state.clone();
    if let Some(iface) = next.interfaces.get_mut(interface) {
        apply(iface);
    }
    Ok(CommandResult::transition(cx.state, next, ""))
}
