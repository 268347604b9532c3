// ── VLAN domain types ──

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 802.1Q VLAN identifier in the configurable range 1–4094.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    pub const DEFAULT: Self = Self(1);
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    pub fn new(id: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&id).then_some(Self(id))
    }

    /// Parse a CLI token. Out-of-range and non-numeric input both yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        token.parse::<u16>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = String;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id).ok_or_else(|| format!("VLAN id {id} outside 1-4094"))
    }
}

impl From<VlanId> for u16 {
    fn from(id: VlanId) -> Self {
        id.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VlanState {
    #[default]
    Active,
    Suspended,
}

impl VlanState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub name: String,
    #[serde(default)]
    pub state: VlanState,
}

impl Vlan {
    /// A freshly created VLAN named the way IOS names it (`VLAN0010`).
    pub fn with_default_name(id: VlanId) -> Self {
        Self {
            name: default_vlan_name(id),
            state: VlanState::Active,
        }
    }
}

pub fn default_vlan_name(id: VlanId) -> String {
    if id == VlanId::DEFAULT {
        "default".into()
    } else {
        format!("VLAN{:04}", id.get())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn range_is_enforced() {
        assert!(VlanId::new(0).is_none());
        assert!(VlanId::new(4095).is_none());
        assert_eq!(VlanId::parse("4094").map(VlanId::get), Some(4094));
        assert!(VlanId::parse("5000").is_none());
        assert!(VlanId::parse("ten").is_none());
    }

    #[test]
    fn default_names() {
        assert_eq!(default_vlan_name(VlanId::DEFAULT), "default");
        assert_eq!(default_vlan_name(VlanId::new(10).unwrap()), "VLAN0010");
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<VlanId>("0").is_err());
        assert_eq!(serde_json::from_str::<VlanId>("20").unwrap().get(), 20);
    }
}
