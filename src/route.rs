//! The learned-route type and the pre-policy half of the decision process
//! (§4.4, steps 1-5).

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use crate::prefix::{self, Prefix};
use crate::types::{Asn, NeighborId, Origin};

/// A single path to `prefix`, as announced by `peer`.
///
/// `raw` holds these exactly as received: `as_path` is never mutated once
/// stored. The own-ASN prepend happens on the outgoing copy built by the
/// dispatcher, not here (§9, "ASPath mutation").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: Prefix,
    pub peer: NeighborId,
    pub localpref: u32,
    pub self_origin: bool,
    pub as_path: Vec<Asn>,
    pub origin: Origin,
}

impl Route {
    /// Do `self` and `other` share every attribute the aggregator cares
    /// about (§4.3, rule 1)? Prefix is deliberately excluded; that's
    /// checked separately via [`Prefix::mergeable`].
    pub fn same_attributes(&self, other: &Self) -> bool {
        self.peer == other.peer
            && self.localpref == other.localpref
            && self.self_origin == other.self_origin
            && self.as_path == other.as_path
            && self.origin == other.origin
    }

    /// Compare two candidates by the pre-policy decision ladder (§4.4,
    /// steps 1-5). Greater means more preferred. Longest-prefix-match
    /// (step 6) is not part of this ordering: it runs after policy
    /// filtering and needs the destination address, so [`crate::decision`]
    /// applies it separately.
    pub fn preference_cmp(&self, other: &Self) -> Ordering {
        match self.localpref.cmp(&other.localpref) {
            Ordering::Equal => {}
            o => return o,
        }
        match self.self_origin.cmp(&other.self_origin) {
            Ordering::Equal => {}
            o => return o,
        }
        // Shorter ASPath wins, so the natural length comparison is reversed.
        match other.as_path.len().cmp(&self.as_path.len()) {
            Ordering::Equal => {}
            o => return o,
        }
        // `Origin` is declared IGP < EGP < UNK, i.e. in reverse preference
        // order, so the comparison here is reversed too.
        match other.origin.cmp(&self.origin) {
            Ordering::Equal => {}
            o => return o,
        }
        // Lowest peer IP wins. A peer address that fails to parse sorts as
        // maximally unpreferred rather than panicking; descriptors are
        // validated at startup so this is not expected to trigger.
        let self_ip = prefix::parse_ip(&self.peer).unwrap_or(u32::MAX);
        let other_ip = prefix::parse_ip(&other.peer).unwrap_or(u32::MAX);
        other_ip.cmp(&self_ip)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} (localpref={}, selfOrigin={}, path=[{}], origin={})",
            self.prefix,
            self.peer,
            self.localpref,
            self.self_origin,
            self.as_path.iter().join(", "),
            self.origin
        )
    }
}
