// `ping <address>`: answered from the routing tables alone.

use std::net::Ipv4Addr;

use super::{Cmd, Step};
use crate::command::CommandResult;
use crate::convergence::LinkView;
use crate::model::{DeviceConfig, Route, TopologyContext, addr, route};

pub(super) fn evaluate(cx: &Cmd<'_>) -> Step<CommandResult> {
    let target = addr::parse_ipv4(cx.arg(0)?)
        .ok_or_else(|| Cmd::fail("% Unrecognized host or address, or protocol not running."))?;
    cx.end(1)?;

    let (marks, summary) = if reachable(cx.state, cx.topology, target) {
        (
            "!!!!!",
            "Success rate is 100 percent (5/5), round-trip min/avg/max = 1/1/1 ms",
        )
    } else {
        (".....", "Success rate is 0 percent (0/5)")
    };
    Ok(CommandResult::ok(format!(
        "Type escape sequence to abort.\n\
         Sending 5, 100-byte ICMP Echos to {target}, timeout is 2 seconds:\n\
         {marks}\n\
         {summary}"
    )))
}

/// Exit interface for `route`, resolving a next-hop-only static through
/// the table once.
fn egress<'r>(routes: &'r [Route], route: &'r Route) -> Option<&'r str> {
    route.interface.as_deref().or_else(|| {
        route
            .next_hop
            .and_then(|hop| route::lookup(routes, hop))
            .and_then(|r| r.interface.as_deref())
    })
}

fn reachable(state: &DeviceConfig, topology: Option<&TopologyContext>, target: Ipv4Addr) -> bool {
    if let Some((_, iface)) = state.interface_with_address(target) {
        return iface.is_admin_up();
    }
    let Some(route) = route::lookup(&state.routes, target) else {
        return false;
    };
    let Some(exit) = egress(&state.routes, route) else {
        return false;
    };
    let Some(ctx) = topology else {
        return state.interfaces.get(exit).is_some_and(|i| i.is_admin_up());
    };

    let view = LinkView::with_local(&ctx.topology, &ctx.device_id, state);
    if !view.interface_is_up(&ctx.device_id, exit) {
        return false;
    }

    // The far end must exist, be up, and know the way back.
    let source = state.interfaces.get(exit).and_then(|i| i.address).map(|a| a.addr());
    ctx.topology
        .devices
        .iter()
        .filter(|(id, _)| **id != ctx.device_id)
        .find_map(|(id, device)| {
            device
                .interface_with_address(target)
                .map(|(name, _)| (id, device, name))
        })
        .is_some_and(|(id, device, name)| {
            view.interface_is_up(id, name)
                && source.is_some_and(|src| route::lookup(&device.routes, src).is_some())
        })
}
