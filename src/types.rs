//! Shared identifiers used across the RIB, policy and dispatch layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a neighbor session. This is the same string used as the
/// socket path for that neighbor, and as the `src`/`dst`/`peer` value on the
/// wire.
pub type NeighborId = String;

/// The commercial relationship of a neighbor, which governs both export
/// policy (§4.5/§4.6) and forwarding policy (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// A customer: routes are exported to everyone, and traffic to/from a
    /// customer may always be forwarded.
    Cust,
    /// A settlement-free peer.
    Peer,
    /// A transit provider.
    Prov,
}

impl Relation {
    /// Parse the `-cust`/`-peer`/`-prov` suffix of a neighbor descriptor.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cust" => Some(Self::Cust),
            "peer" => Some(Self::Peer),
            "prov" => Some(Self::Prov),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cust => "cust",
            Self::Peer => "peer",
            Self::Prov => "prov",
        };
        write!(f, "{s}")
    }
}

/// How a route entered BGP. Ordering here is preference order: `Igp` is the
/// most preferred, `Unk` the least. Derived `Ord` works because the variants
/// are declared in preference order and `PartialOrd`/`Ord` on an enum follow
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Learned from an interior routing protocol.
    IGP,
    /// Learned from an exterior gateway protocol.
    EGP,
    /// Origin unknown.
    UNK,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IGP => "IGP",
            Self::EGP => "EGP",
            Self::UNK => "UNK",
        };
        write!(f, "{s}")
    }
}

/// An AS number in a path.
pub type Asn = u32;
