// ── IPv4 addressing ──
//
// Dotted-quad masks, wildcard masks, and prefix arithmetic shared by the
// grammar (argument validation) and the convergence engine (subnet checks).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IPv4 prefix: {0}")]
pub struct PrefixParseError(String);

/// An IPv4 address with a prefix length.
///
/// Interface addresses keep their host bits (`10.0.0.1/30`); route
/// destinations are always stored in network form (`10.0.0.0/30`).
/// Serializes as the usual `a.b.c.d/len` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Prefix {
    addr: Ipv4Addr,
    len: u8,
}

impl Ipv4Prefix {
    pub fn new(addr: Ipv4Addr, len: u8) -> Option<Self> {
        (len <= 32).then_some(Self { addr, len })
    }

    /// Build from an address and a dotted-quad netmask.
    pub fn from_mask(addr: Ipv4Addr, mask: Ipv4Addr) -> Option<Self> {
        Self::new(addr, mask_len(mask)?)
    }

    /// Build from an address and a wildcard (inverse) mask.
    pub fn from_wildcard(addr: Ipv4Addr, wildcard: Ipv4Addr) -> Option<Self> {
        Self::new(addr, mask_len(Ipv4Addr::from(!u32::from(wildcard)))?)
    }

    pub fn addr(self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix_len(self) -> u8 {
        self.len
    }

    pub fn mask(self) -> Ipv4Addr {
        Ipv4Addr::from(len_to_bits(self.len))
    }

    pub fn wildcard(self) -> Ipv4Addr {
        Ipv4Addr::from(!len_to_bits(self.len))
    }

    /// The same prefix with host bits cleared.
    pub fn network(self) -> Self {
        Self {
            addr: Ipv4Addr::from(u32::from(self.addr) & len_to_bits(self.len)),
            len: self.len,
        }
    }

    /// `true` when no host bits are set.
    pub fn is_network(self) -> bool {
        self.network().addr == self.addr
    }

    pub fn contains(self, ip: Ipv4Addr) -> bool {
        let bits = len_to_bits(self.len);
        u32::from(ip) & bits == u32::from(self.addr) & bits
    }

    /// `true` if either prefix contains the other's network.
    pub fn overlaps(self, other: Self) -> bool {
        self.contains(other.network().addr) || other.contains(self.network().addr)
    }

    /// `true` for the all-zeros network address or the broadcast address
    /// of a subnet that has both (anything shorter than /31).
    pub fn is_reserved_host(self) -> bool {
        if self.len >= 31 {
            return false;
        }
        let host = u32::from(self.addr) & !len_to_bits(self.len);
        host == 0 || host == !len_to_bits(self.len)
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = PrefixParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PrefixParseError(s.to_owned());
        let (addr, len) = s.split_once('/').ok_or_else(err)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| err())?;
        let len: u8 = len.parse().map_err(|_| err())?;
        Self::new(addr, len).ok_or_else(err)
    }
}

impl TryFrom<String> for Ipv4Prefix {
    type Error = PrefixParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ipv4Prefix> for String {
    fn from(p: Ipv4Prefix) -> Self {
        p.to_string()
    }
}

// ── Mask helpers ────────────────────────────────────────────────────

fn len_to_bits(len: u8) -> u32 {
    match len {
        0 => 0,
        n => u32::MAX << (32 - u32::from(n.min(32))),
    }
}

/// Prefix length of a contiguous dotted-quad netmask.
pub fn mask_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let len = u8::try_from(bits.leading_ones()).ok()?;
    (len_to_bits(len) == bits).then_some(len)
}

/// Parse a dotted-quad address token. IOS never accepts shorthand forms.
pub fn parse_ipv4(token: &str) -> Option<Ipv4Addr> {
    if token.split('.').count() != 4 {
        return None;
    }
    token.parse().ok()
}
