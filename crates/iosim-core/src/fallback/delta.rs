// ── Proposed state changes ──
//
// A fallback reply may describe its effect as a delta. Deltas are
// untrusted: they are applied to a copy, checked against the snapshot
// invariants and the mode transition table, and discarded whole on the
// first violation.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    DeviceConfig, Ipv4Prefix, Mode, ModeKind, Route, Vlan, VlanId, VlanState, is_valid_hostname,
};

const MAX_VLAN_NAME: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateDelta {
    pub hostname: Option<String>,
    pub mode: Option<Mode>,
    /// Keyed by interface name in any accepted spelling.
    pub interfaces: BTreeMap<String, InterfacePatch>,
    /// Unknown VLAN ids are created.
    pub vlans: BTreeMap<u16, VlanPatch>,
    /// Added if not already present.
    pub static_routes: Vec<StaticRouteSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfacePatch {
    pub shutdown: Option<bool>,
    pub address: Option<Ipv4Prefix>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VlanPatch {
    pub name: Option<String>,
    pub state: Option<VlanState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRouteSpec {
    pub destination: Ipv4Prefix,
    #[serde(default)]
    pub next_hop: Option<Ipv4Addr>,
    #[serde(default)]
    pub interface: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    #[error("invalid hostname {0:?}")]
    Hostname(String),

    #[error("illegal mode transition {from} -> {to}")]
    Transition { from: ModeKind, to: ModeKind },

    #[error("unknown interface {0:?}")]
    UnknownInterface(String),

    #[error("interface {interface}: {reason}")]
    Interface { interface: String, reason: String },

    #[error("VLAN {0} outside 1-4094")]
    VlanRange(u16),

    #[error("VLAN {id}: {reason}")]
    Vlan { id: u16, reason: String },

    #[error("static route {destination}: {reason}")]
    Route { destination: Ipv4Prefix, reason: String },

    #[error("mode refers to missing {0}")]
    DanglingMode(String),

    #[error("{field} cannot be changed from {mode} mode")]
    WrongMode { field: &'static str, mode: ModeKind },

    #[error("{0}")]
    Invariant(String),
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a copy of `state`. Either every field applies cleanly and
    /// the resulting snapshot passes validation, or nothing is returned.
    pub fn apply(&self, state: &DeviceConfig) -> Result<DeviceConfig, DeltaError> {
        self.check_mode(&state.mode)?;
        let mut next = state.clone();

        if let Some(hostname) = &self.hostname {
            if !is_valid_hostname(hostname) {
                return Err(DeltaError::Hostname(hostname.clone()));
            }
            next.hostname.clone_from(hostname);
        }

        for (&id, patch) in &self.vlans {
            apply_vlan(&mut next, id, patch)?;
        }
        for (raw, patch) in &self.interfaces {
            apply_interface(&mut next, raw, patch)?;
        }
        check_overlaps(&next)?;
        for spec in &self.static_routes {
            let route = static_route(&next, spec)?;
            if !next.routes.contains(&route) {
                next.routes.push(route);
            }
        }

        if let Some(mode) = &self.mode {
            next.mode = target_mode(&state.mode, mode, &next)?;
        }

        next.validate().map_err(DeltaError::Invariant)?;
        Ok(next)
    }

    /// Configuration fields need a configuration mode; the hostname is a
    /// global command. Only `mode` may be proposed from EXEC.
    fn check_mode(&self, current: &Mode) -> Result<(), DeltaError> {
        let wrong = |field| DeltaError::WrongMode {
            field,
            mode: current.kind(),
        };
        if self.hostname.is_some() && *current != Mode::GlobalConfig {
            return Err(wrong("hostname"));
        }
        if current.is_config() {
            return Ok(());
        }
        if !self.interfaces.is_empty() {
            return Err(wrong("interfaces"));
        }
        if !self.vlans.is_empty() {
            return Err(wrong("vlans"));
        }
        if !self.static_routes.is_empty() {
            return Err(wrong("static routes"));
        }
        Ok(())
    }
}

fn apply_vlan(next: &mut DeviceConfig, id: u16, patch: &VlanPatch) -> Result<(), DeltaError> {
    let vlan_id = VlanId::new(id).ok_or(DeltaError::VlanRange(id))?;
    let vlan = next
        .vlans
        .entry(vlan_id)
        .or_insert_with(|| Vlan::with_default_name(vlan_id));
    if let Some(name) = &patch.name {
        if name.is_empty() || name.len() > MAX_VLAN_NAME {
            return Err(DeltaError::Vlan {
                id,
                reason: format!("name must be 1-{MAX_VLAN_NAME} characters"),
            });
        }
        vlan.name.clone_from(name);
    }
    if let Some(state) = patch.state {
        vlan.state = state;
    }
    Ok(())
}

fn apply_interface(
    next: &mut DeviceConfig,
    raw: &str,
    patch: &InterfacePatch,
) -> Result<(), DeltaError> {
    let key = next
        .resolve_interface(raw)
        .ok_or_else(|| DeltaError::UnknownInterface(raw.to_owned()))?
        .to_owned();
    let reject = |reason: &str| DeltaError::Interface {
        interface: key.clone(),
        reason: reason.to_owned(),
    };
    let Some(iface) = next.interfaces.get_mut(&key) else {
        return Err(DeltaError::UnknownInterface(raw.to_owned()));
    };

    if let Some(address) = patch.address {
        if address.prefix_len() == 0 || address.is_reserved_host() {
            return Err(reject("address is not a usable host address"));
        }
        if iface.is_switchport() {
            return Err(reject("layer 2 ports take no address"));
        }
        iface.address = Some(address);
    }
    if let Some(shutdown) = patch.shutdown {
        iface.shutdown = shutdown;
    }
    if let Some(description) = &patch.description {
        iface.description = Some(description.clone()).filter(|d| !d.is_empty());
    }
    Ok(())
}

fn check_overlaps(next: &DeviceConfig) -> Result<(), DeltaError> {
    let addressed: Vec<(&String, Ipv4Prefix)> = next
        .interfaces
        .iter()
        .filter_map(|(name, iface)| iface.address.map(|a| (name, a)))
        .collect();
    for (i, (name, address)) in addressed.iter().enumerate() {
        if let Some((other, _)) = addressed[i + 1..]
            .iter()
            .find(|(_, a)| a.overlaps(*address))
        {
            return Err(DeltaError::Interface {
                interface: (*name).clone(),
                reason: format!("overlaps with {other}"),
            });
        }
    }
    Ok(())
}

fn static_route(next: &DeviceConfig, spec: &StaticRouteSpec) -> Result<Route, DeltaError> {
    let reject = |reason: &str| DeltaError::Route {
        destination: spec.destination,
        reason: reason.to_owned(),
    };
    if !spec.destination.is_network() {
        return Err(reject("destination has host bits set"));
    }
    match (spec.next_hop, &spec.interface) {
        (Some(hop), None) => {
            if next.interface_with_address(hop).is_some() {
                return Err(reject("next hop is this device"));
            }
            Ok(Route::static_via(spec.destination, hop))
        }
        (None, Some(raw)) => {
            let key = next
                .resolve_interface(raw)
                .ok_or_else(|| reject("exit interface does not exist"))?;
            Ok(Route::static_out(spec.destination, key))
        }
        _ => Err(reject("needs exactly one of next_hop or interface")),
    }
}

/// Check a proposed mode against the transition table and make sure the
/// object it configures exists. Interface names come back canonical.
fn target_mode(current: &Mode, proposed: &Mode, next: &DeviceConfig) -> Result<Mode, DeltaError> {
    let resolved = match proposed {
        Mode::InterfaceConfig { interface } => Mode::InterfaceConfig {
            interface: next
                .resolve_interface(interface)
                .ok_or_else(|| DeltaError::DanglingMode(format!("interface {interface}")))?
                .to_owned(),
        },
        Mode::VlanConfig { vlan } if !next.vlans.contains_key(vlan) => {
            return Err(DeltaError::DanglingMode(format!("VLAN {vlan}")));
        }
        Mode::RouterConfig { protocol } if next.routing_process(*protocol).is_none() => {
            return Err(DeltaError::DanglingMode(format!("router {protocol}")));
        }
        other => other.clone(),
    };
    if !current.can_transition_to(&resolved) {
        return Err(DeltaError::Transition {
            from: current.kind(),
            to: resolved.kind(),
        });
    }
    Ok(resolved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn in_mode(mode: Mode) -> DeviceConfig {
        let mut r1 = DeviceConfig::router("R1");
        r1.mode = mode;
        r1
    }

    fn config() -> DeviceConfig {
        in_mode(Mode::GlobalConfig)
    }

    fn delta(json: &str) -> StateDelta {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn applies_hostname_interfaces_and_routes() {
        let state = config();
        let next = delta(
            r#"{
                "hostname": "Edge1",
                "interfaces": {"gi0/1": {"shutdown": false, "address": "10.1.1.1/24"}},
                "static_routes": [{"destination": "0.0.0.0/0", "next_hop": "10.1.1.254"}]
            }"#,
        )
        .apply(&state)
        .unwrap();

        assert_eq!(next.hostname, "Edge1");
        let iface = &next.interfaces["GigabitEthernet0/1"];
        assert!(iface.is_admin_up());
        assert_eq!(iface.address, "10.1.1.1/24".parse().ok());
        assert_eq!(next.routes.len(), 1);
        assert_eq!(next.mode, Mode::GlobalConfig);
    }

    #[test]
    fn vlan_patch_creates_missing_vlan() {
        let next = delta(r#"{"vlans": {"30": {"name": "Voice"}}}"#)
            .apply(&config())
            .unwrap();
        let vlan = &next.vlans[&VlanId::new(30).unwrap()];
        assert_eq!(vlan.name, "Voice");
        assert_eq!(vlan.state, VlanState::Active);
    }

    #[test]
    fn mode_jump_outside_table_is_rejected() {
        let user = DeviceConfig::router("R1");
        let err = delta(r#"{"mode": {"kind": "global-config"}}"#)
            .apply(&user)
            .unwrap_err();
        assert_eq!(
            err,
            DeltaError::Transition {
                from: ModeKind::User,
                to: ModeKind::GlobalConfig
            }
        );
    }

    #[test]
    fn exec_modes_cannot_change_configuration() {
        let attack = delta(
            r#"{
                "hostname": "Pwned",
                "interfaces": {"g0/0": {"shutdown": false, "address": "10.9.9.1/24"}},
                "static_routes": [{"destination": "0.0.0.0/0", "next_hop": "10.9.9.254"}]
            }"#,
        );
        for mode in [Mode::User, Mode::Privileged] {
            let state = in_mode(mode.clone());
            let err = attack.apply(&state).unwrap_err();
            assert_eq!(
                err,
                DeltaError::WrongMode {
                    field: "hostname",
                    mode: mode.kind()
                }
            );
        }

        let err = delta(r#"{"static_routes": [{"destination": "0.0.0.0/0", "next_hop": "10.9.9.254"}]}"#)
            .apply(&in_mode(Mode::Privileged))
            .unwrap_err();
        assert_eq!(
            err,
            DeltaError::WrongMode {
                field: "static routes",
                mode: ModeKind::Privileged
            }
        );

        // A mode change alone is still allowed from EXEC.
        let next = delta(r#"{"mode": {"kind": "privileged"}}"#)
            .apply(&in_mode(Mode::User))
            .unwrap();
        assert_eq!(next.mode, Mode::Privileged);
    }

    #[test]
    fn hostname_only_changes_from_global_config() {
        let state = in_mode(Mode::InterfaceConfig {
            interface: "GigabitEthernet0/0".into(),
        });
        let err = delta(r#"{"hostname": "Edge1"}"#).apply(&state).unwrap_err();
        assert!(matches!(err, DeltaError::WrongMode { field: "hostname", .. }));

        let next = delta(r#"{"interfaces": {"g0/0": {"description": "uplink"}}}"#)
            .apply(&state)
            .unwrap();
        assert_eq!(
            next.interfaces["GigabitEthernet0/0"].description.as_deref(),
            Some("uplink")
        );
    }

    #[test]
    fn sub_mode_needs_existing_object() {
        let state = config();
        let err = delta(r#"{"mode": {"kind": "vlan-config", "vlan": 99}}"#)
            .apply(&state)
            .unwrap_err();
        assert!(matches!(err, DeltaError::DanglingMode(_)));

        // Creating the VLAN in the same delta makes it legal.
        let next = delta(r#"{"vlans": {"99": {}}, "mode": {"kind": "vlan-config", "vlan": 99}}"#)
            .apply(&state)
            .unwrap();
        assert_eq!(next.mode.kind(), ModeKind::VlanConfig);
    }

    #[test]
    fn interface_mode_name_is_canonicalized() {
        let state = config();
        let next = delta(r#"{"mode": {"kind": "interface-config", "interface": "g0/2"}}"#)
            .apply(&state)
            .unwrap();
        assert_eq!(
            next.mode,
            Mode::InterfaceConfig {
                interface: "GigabitEthernet0/2".into()
            }
        );
    }

    #[test]
    fn one_bad_field_discards_everything() {
        let state = config();
        let err = delta(
            r#"{"hostname": "Fine", "interfaces": {"Serial9/9": {"shutdown": false}}}"#,
        )
        .apply(&state)
        .unwrap_err();
        assert_eq!(err, DeltaError::UnknownInterface("Serial9/9".into()));
        assert_eq!(state.hostname, "R1");
    }

    #[test]
    fn overlapping_addresses_are_rejected() {
        let err = delta(
            r#"{"interfaces": {
                "g0/0": {"address": "10.0.0.1/24"},
                "g0/1": {"address": "10.0.0.2/24"}
            }}"#,
        )
        .apply(&config())
        .unwrap_err();
        assert!(matches!(err, DeltaError::Interface { .. }));
    }

    #[test]
    fn route_needs_exactly_one_target() {
        let err = delta(r#"{"static_routes": [{"destination": "10.0.0.0/8"}]}"#)
            .apply(&config())
            .unwrap_err();
        assert!(matches!(err, DeltaError::Route { .. }));

        let err = delta(r#"{"static_routes": [{"destination": "10.1.0.0/8", "next_hop": "1.1.1.1"}]}"#)
            .apply(&config())
            .unwrap_err();
        assert!(matches!(err, DeltaError::Route { .. }));
    }

    #[test]
    fn out_of_range_vlan_is_rejected() {
        let err = delta(r#"{"vlans": {"5000": {}}}"#)
            .apply(&config())
            .unwrap_err();
        assert_eq!(err, DeltaError::VlanRange(5000));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        assert!(serde_json::from_str::<StateDelta>(r#"{"ntp": "1.2.3.4"}"#).is_err());
    }
}
