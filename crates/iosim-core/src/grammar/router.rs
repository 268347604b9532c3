// Router configuration mode: `Router(config-router)#`.

use super::{CONFIG_COMMON, Cmd, OnMiss, Step, config_common};
use crate::command::CommandResult;
use crate::model::{Mode, NetworkStatement, RoutingProtocol};

const ROUTER: &[&str] = &["auto-summary", "network", "no", "passive-interface", "version"];

const NO: &[&str] = &["auto-summary", "network", "passive-interface"];

pub(super) fn evaluate(cx: &Cmd<'_>, protocol: RoutingProtocol) -> Step<CommandResult> {
    let table: Vec<&str> = ROUTER.iter().chain(CONFIG_COMMON.iter()).copied().collect();
    let command = cx.keyword(0, &table, OnMiss::Defer)?;
    if matches!(command, "do" | "end" | "exit") {
        return config_common(cx, command, Mode::GlobalConfig);
    }

    let (cx, negate) = if command == "no" {
        let inner = cx.shifted(1);
        let command = inner.keyword(0, NO, OnMiss::Defer)?;
        (inner, Some(command))
    } else {
        (cx.shifted(0), None)
    };
    let command = negate.unwrap_or(command);

    let mut next = cx.state.clone();
    let Some(process) = next.routing_process_mut(protocol) else {
        return Err(Cmd::fail(format!("% Routing process {protocol} is not configured")));
    };

    match command {
        "auto-summary" => {
            if matches!(protocol, RoutingProtocol::Ospf { .. }) {
                return Err(cx.invalid_at(0));
            }
            cx.end(1)?;
            process.auto_summary = negate.is_none();
        }
        "network" => {
            let statement = network_statement(&cx, protocol)?;
            if negate.is_some() {
                process
                    .networks
                    .retain(|n| !(n.address == statement.address && n.wildcard == statement.wildcard));
            } else if !process.networks.contains(&statement) {
                process.networks.push(statement);
            }
        }
        "passive-interface" => {
            let raw = cx.arg(1)?;
            cx.end(2)?;
            let key = cx
                .state
                .resolve_interface(raw)
                .ok_or_else(|| cx.invalid_at(1))?
                .to_owned();
            if negate.is_some() {
                process.passive_interfaces.remove(&key);
            } else {
                process.passive_interfaces.insert(key);
            }
        }
        _ => {
            if protocol != RoutingProtocol::Rip {
                return Err(cx.invalid_at(0));
            }
            let version = cx.number(1, 1..=2)?;
            cx.end(2)?;
            process.version = u8::try_from(version).ok();
        }
    }
    Ok(CommandResult::transition(cx.state, next, ""))
}

/// `network <address> [<wildcard>] [area <id>]`, shaped per protocol: RIP
/// takes a bare classful network, OSPF needs a wildcard and an area,
/// EIGRP takes an optional wildcard.
fn network_statement(cx: &Cmd<'_>, protocol: RoutingProtocol) -> Step<NetworkStatement> {
    let address = cx.ipv4(1)?;
    let mut statement = NetworkStatement {
        address,
        wildcard: None,
        area: None,
    };
    match protocol {
        RoutingProtocol::Rip => cx.end(2)?,
        RoutingProtocol::Ospf { .. } => {
            statement.wildcard = Some(cx.ipv4(2)?);
            cx.keyword(3, &["area"], OnMiss::Reject)?;
            statement.area = Some(cx.number(4, 0..=u32::MAX)?);
            cx.end(5)?;
        }
        RoutingProtocol::Eigrp { .. } => {
            if cx.line.get(2).is_some() {
                statement.wildcard = Some(cx.ipv4(2)?);
            }
            cx.end(3)?;
        }
    }
    Ok(statement)
}
