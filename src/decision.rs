//! The decision process (C4): ladder steps 1-5, then policy, then
//! longest-prefix-match (step 6).

use std::cmp::Ordering;

use crate::error::RouterError;
use crate::policy;
use crate::route::Route;
use crate::types::{NeighborId, Relation};

/// Resolve a non-empty candidate set down to a single egress route, or
/// [`RouterError::UnreachableDestination`] if the candidate set is empty to
/// begin with, or if policy filtering leaves nothing (destination
/// unreachable, §4.4/§4.7). The dispatcher maps that error onto the wire's
/// `no route` reply rather than treating it as fatal.
///
/// `relation_of` maps a candidate's `peer` to its configured relationship;
/// a candidate whose peer cannot be resolved is treated as unreachable
/// rather than panicking, since neighbor identities are only ever the
/// fixed startup set.
pub fn decide<'a>(
    candidates: &[&'a Route],
    src_rel: Relation,
    relation_of: impl Fn(&str) -> Option<Relation>,
) -> Result<&'a Route, RouterError> {
    if candidates.is_empty() {
        return Err(RouterError::UnreachableDestination);
    }

    // Steps 1-5: find the most preferred route and retain everything tied
    // with it under the full five-step ladder.
    let best = candidates
        .iter()
        .copied()
        .max_by(|a, b| a.preference_cmp(b))
        .expect("candidates was just checked non-empty");
    let mut tied: Vec<&Route> = candidates
        .iter()
        .copied()
        .filter(|r| r.preference_cmp(best) == Ordering::Equal)
        .collect();

    // Policy filter: drop anything forwarding to it would violate (§4.5).
    tied.retain(|r| {
        relation_of(&r.peer)
            .map(|dst_rel| policy::forwardable(src_rel, dst_rel))
            .unwrap_or(false)
    });
    if tied.is_empty() {
        return Err(RouterError::UnreachableDestination);
    }

    // Step 6: longest prefix match among whatever policy left standing.
    let max_len = tied
        .iter()
        .map(|r| r.prefix.len())
        .max()
        .expect("tied was just checked non-empty");
    Ok(tied
        .into_iter()
        .find(|r| r.prefix.len() == max_len)
        .expect("max_len was computed from tied"))
}

/// Resolve the egress neighbor for a lookup, if any (thin wrapper over
/// [`decide`] for callers that only want the neighbor id).
pub fn decide_neighbor(
    candidates: &[&Route],
    src_rel: Relation,
    relation_of: impl Fn(&str) -> Option<Relation>,
) -> Result<NeighborId, RouterError> {
    decide(candidates, src_rel, relation_of).map(|r| r.peer.clone())
}
