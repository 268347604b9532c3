// VLAN configuration mode: `Switch(config-vlan)#`.

use super::{CONFIG_COMMON, Cmd, OnMiss, Step, config_common};
use crate::command::CommandResult;
use crate::model::{Mode, VlanId, VlanState, vlan::default_vlan_name};

const VLAN: &[&str] = &["name", "no", "state"];

pub(super) fn evaluate(cx: &Cmd<'_>, id: VlanId) -> Step<CommandResult> {
    let table: Vec<&str> = VLAN.iter().chain(CONFIG_COMMON.iter()).copied().collect();
    let command = cx.keyword(0, &table, OnMiss::Defer)?;
    if matches!(command, "do" | "end" | "exit") {
        return config_common(cx, command, Mode::GlobalConfig);
    }
    let mut next = cx.state.clone();
    let Some(vlan) = next.vlans.get_mut(&id) else {
        return Err(Cmd::fail(format!("% VLAN {id} does not exist")));
    };
    match command {
        "name" => {
            let name = cx.arg(1)?;
            cx.end(2)?;
            if name.len() > 32 {
                return Err(cx.invalid_at(1));
            }
            name.clone_into(&mut vlan.name);
        }
        "state" => {
            vlan.state = match cx.keyword(1, &["active", "suspend"], OnMiss::Reject)? {
                "active" => VlanState::Active,
                _ => VlanState::Suspended,
            };
            cx.end(2)?;
        }
        _ => {
            cx.keyword(1, &["name", "state"], OnMiss::Defer)?;
            // `no name` and `no state` both restore defaults.
            vlan.name = default_vlan_name(id);
            vlan.state = VlanState::Active;
        }
    }
    Ok(CommandResult::transition(cx.state, next, ""))
}
