// ── Access control lists ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Permit,
    Deny,
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
        })
    }
}

/// Numbered ACL family, decided by the list number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclKind {
    Standard,
    Extended,
}

impl AclKind {
    pub fn for_number(number: u16) -> Option<Self> {
        match number {
            1..=99 => Some(Self::Standard),
            100..=199 => Some(Self::Extended),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Extended => "Extended",
        }
    }
}

/// Address match clause: `any`, `host A.B.C.D`, or address plus wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AclMatch {
    Any,
    Host { address: Ipv4Addr },
    Wildcard { address: Ipv4Addr, wildcard: Ipv4Addr },
}

impl AclMatch {
    /// Form used in `show running-config`.
    pub fn config_text(self) -> String {
        match self {
            Self::Any => "any".into(),
            Self::Host { address } => format!("host {address}"),
            Self::Wildcard { address, wildcard } => format!("{address} {wildcard}"),
        }
    }

    /// Form used in `show access-lists` for standard lists.
    pub fn show_text(self) -> String {
        match self {
            Self::Any => "any".into(),
            Self::Host { address } => address.to_string(),
            Self::Wildcard { address, wildcard } => {
                format!("{address}, wildcard bits {wildcard}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub list: String,
    pub action: AclAction,
    /// Extended lists only (`ip`, `tcp`, `udp`, `icmp`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub source: AclMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<AclMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl AclEntry {
    /// Body of the entry after the list number, shared by both renderers.
    fn body(&self, standard_source: impl Fn(AclMatch) -> String) -> String {
        let mut text = self.action.to_string();
        match &self.protocol {
            Some(proto) => {
                text.push(' ');
                text.push_str(proto);
                text.push(' ');
                text.push_str(&self.source.config_text());
                if let Some(dst) = self.destination {
                    text.push(' ');
                    text.push_str(&dst.config_text());
                }
                if let Some(port) = &self.port {
                    text.push_str(" eq ");
                    text.push_str(port);
                }
            }
            None => {
                text.push(' ');
                text.push_str(&standard_source(self.source));
            }
        }
        text
    }

    pub fn config_line(&self) -> String {
        format!("access-list {} {}", self.list, self.body(AclMatch::config_text))
    }

    pub fn show_line(&self) -> String {
        self.body(AclMatch::show_text)
    }
}
