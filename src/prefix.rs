//! IPv4 prefix algebra (C1): parsing, containment, longest-prefix comparison
//! and the mergeability test the aggregator builds on.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// Parse a dotted-quad IPv4 address into a big-endian `u32`.
pub fn parse_ip(s: &str) -> Result<u32, RouterError> {
    let octets = parse_octets(s)?;
    Ok(u32::from_be_bytes(octets))
}

/// Parse a dotted-quad netmask into a big-endian `u32`. Does not by itself
/// check contiguity; see [`mask_len`].
pub fn parse_mask(s: &str) -> Result<u32, RouterError> {
    parse_ip(s)
}

fn parse_octets(s: &str) -> Result<[u8; 4], RouterError> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return Err(RouterError::MalformedPrefix(format!(
            "`{s}` is not a dotted-quad address"
        )));
    }
    let mut octets = [0u8; 4];
    for (i, part) in parts.iter().enumerate() {
        octets[i] = part
            .parse::<u16>()
            .ok()
            .filter(|v| *v <= 255)
            .ok_or_else(|| {
                RouterError::MalformedPrefix(format!("octet `{part}` out of range in `{s}`"))
            })? as u8;
    }
    Ok(octets)
}

/// Count the leading one-bits of `mask` and verify they form a contiguous
/// run (i.e. `mask` is a valid CIDR netmask). Rejects non-contiguous masks
/// such as `255.0.255.0`.
pub fn mask_len(mask: u32) -> Result<u8, RouterError> {
    let len = mask.leading_ones() as u8;
    let reconstructed = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    if reconstructed != mask {
        return Err(RouterError::MalformedPrefix(format!(
            "netmask {:#010x} is not a contiguous prefix",
            mask
        )));
    }
    Ok(len)
}

/// Number of leading bits in which two IPv4 addresses agree.
pub fn common_prefix_len(a: u32, b: u32) -> u8 {
    (a ^ b).leading_zeros() as u8
}

/// An IPv4 network: a 32-bit `network` address and a 32-bit contiguous
/// `netmask`. The invariant `network & !netmask == 0` holds for every value
/// constructed through [`Prefix::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix {
    network: u32,
    netmask: u32,
}

impl Prefix {
    /// Build a prefix from a raw network and netmask, validating both the
    /// mask's contiguity and the "no host bits set" invariant.
    pub fn new(network: u32, netmask: u32) -> Result<Self, RouterError> {
        mask_len(netmask)?;
        if network & !netmask != 0 {
            return Err(RouterError::MalformedPrefix(format!(
                "network {} has host bits set under netmask {}",
                to_dotted(network),
                to_dotted(netmask)
            )));
        }
        Ok(Self { network, netmask })
    }

    /// Build a prefix from the wire's dotted-quad `network`/`netmask`
    /// strings (§6, Update `msg`).
    pub fn from_dotted(network: &str, netmask: &str) -> Result<Self, RouterError> {
        Self::new(parse_ip(network)?, parse_mask(netmask)?)
    }

    /// The default route, `0.0.0.0/0`.
    pub fn default_route() -> Self {
        Self {
            network: 0,
            netmask: 0,
        }
    }

    /// The network address, as a big-endian `u32`.
    pub fn network(&self) -> u32 {
        self.network
    }

    /// The netmask, as a big-endian `u32`.
    pub fn netmask(&self) -> u32 {
        self.netmask
    }

    /// The prefix length, `0..=32`.
    pub fn len(&self) -> u8 {
        // `netmask` was validated contiguous at construction time.
        self.netmask.leading_ones() as u8
    }

    /// A prefix of length 0 matches every address; it is never empty in the
    /// collection sense, but callers sometimes want to special-case it.
    pub fn is_default(&self) -> bool {
        self.len() == 0
    }

    /// True iff `addr` falls within this prefix.
    pub fn contains(&self, addr: u32) -> bool {
        (addr & self.netmask) == self.network
    }

    /// Render the network as a dotted quad, e.g. for the wire `table`/
    /// `update` representation.
    pub fn network_dotted(&self) -> String {
        to_dotted(self.network)
    }

    /// Render the netmask as a dotted quad.
    pub fn netmask_dotted(&self) -> String {
        to_dotted(self.netmask)
    }

    /// True iff `self` and `other` are the two halves of a common
    /// supernet one bit shorter: same netmask, non-zero length, and they
    /// differ in exactly the bit immediately above the mask boundary.
    pub fn mergeable(&self, other: &Self) -> bool {
        if self.netmask != other.netmask {
            return false;
        }
        let len = self.len();
        if len == 0 {
            return false;
        }
        let boundary_bit = 1u32 << (32 - len as u32);
        (self.network ^ other.network) == boundary_bit
    }

    /// Merge `self` and `other`, assuming [`Prefix::mergeable`] already
    /// returned true for this pair. Panics otherwise, since callers are
    /// expected to have checked mergeability first (the aggregator never
    /// calls this blind).
    pub fn merge(&self, other: &Self) -> Self {
        debug_assert!(self.mergeable(other));
        let len = self.len();
        let merged_mask = if len <= 1 { 0 } else { u32::MAX << (33 - len as u32) };
        Self {
            network: self.network.min(other.network),
            netmask: merged_mask,
        }
    }
}

fn to_dotted(addr: u32) -> String {
    let b = addr.to_be_bytes();
    format!("{}.{}.{}.{}", b[0], b[1], b[2], b[3])
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_dotted(), self.len())
    }
}

impl FromStr for Prefix {
    type Err = RouterError;

    /// Parse CIDR notation, `a.b.c.d/n`. Used for configuration and test
    /// convenience; the wire format instead carries `network`/`netmask` as
    /// separate dotted-quad strings (see [`Prefix::from_dotted`]).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s.split_once('/').ok_or_else(|| {
            RouterError::MalformedPrefix(format!("`{s}` is not in CIDR notation"))
        })?;
        let len: u8 = len
            .parse()
            .ok()
            .filter(|l| *l <= 32)
            .ok_or_else(|| RouterError::MalformedPrefix(format!("invalid prefix length in `{s}`")))?;
        let network = parse_ip(addr)?;
        let netmask = if len == 0 { 0 } else { u32::MAX << (32 - len as u32) };
        Self::new(network, netmask)
    }
}

impl Serialize for Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordering by prefix length only, for longest-prefix-match selection
/// (§4.4, step 6). Not a total order over all prefixes in the collection
/// sense (two distinct prefixes of equal length compare equal here); it
/// exists purely to pick the maximal-length candidate with `Iterator::max`.
pub fn by_len(a: &Prefix, b: &Prefix) -> Ordering {
    a.len().cmp(&b.len())
}
