// ── CLI modes ──
//
// The mode a device's CLI is in, and the legal transitions between modes.
// Sub-modes carry the object being configured so the grammar knows which
// interface, VLAN, or routing process a command applies to.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::routing::RoutingProtocol;
use super::vlan::VlanId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    User,
    Privileged,
    GlobalConfig,
    InterfaceConfig {
        interface: String,
    },
    VlanConfig {
        vlan: VlanId,
    },
    RouterConfig {
        protocol: RoutingProtocol,
    },
}

/// Mode discriminant without the sub-mode payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ModeKind {
    User,
    Privileged,
    GlobalConfig,
    InterfaceConfig,
    VlanConfig,
    RouterConfig,
}

impl ModeKind {
    /// Whether a direct transition from `self` to `next` exists.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::User, Self::Privileged)
                | (Self::Privileged, Self::User | Self::GlobalConfig)
                | (
                    Self::GlobalConfig,
                    Self::Privileged
                        | Self::InterfaceConfig
                        | Self::VlanConfig
                        | Self::RouterConfig
                )
                | (
                    Self::InterfaceConfig | Self::VlanConfig | Self::RouterConfig,
                    Self::GlobalConfig | Self::Privileged
                )
        )
    }
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::User => ModeKind::User,
            Self::Privileged => ModeKind::Privileged,
            Self::GlobalConfig => ModeKind::GlobalConfig,
            Self::InterfaceConfig { .. } => ModeKind::InterfaceConfig,
            Self::VlanConfig { .. } => ModeKind::VlanConfig,
            Self::RouterConfig { .. } => ModeKind::RouterConfig,
        }
    }

    /// Suffix appended to the hostname to form the prompt.
    pub fn prompt_suffix(&self) -> &'static str {
        match self {
            Self::User => ">",
            Self::Privileged => "#",
            Self::GlobalConfig => "(config)#",
            Self::InterfaceConfig { .. } => "(config-if)#",
            Self::VlanConfig { .. } => "(config-vlan)#",
            Self::RouterConfig { .. } => "(config-router)#",
        }
    }

    pub fn is_config(&self) -> bool {
        !matches!(self, Self::User | Self::Privileged)
    }

    /// Staying in the same mode is always allowed; anything else must be
    /// an edge of the transition table. Moving between two different
    /// sub-modes requires passing through global config first.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        self == next || self.kind().can_transition_to(next.kind())
    }
}
