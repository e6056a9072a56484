//! The RIB store (C2) and the aggregation/disaggregation engine (C3).

use crate::prefix::Prefix;
use crate::route::Route;
use crate::types::NeighborId;

/// One recorded `revoke`, kept for diagnostics (§3, `WithdrawalLog`). Not
/// consulted by the rebuild itself: disaggregation only needs the
/// post-removal `raw` set.
#[derive(Debug, Clone)]
pub struct WithdrawalEntry {
    pub peer: NeighborId,
    pub prefixes: Vec<Prefix>,
}

/// A single coalescing pass over `routes`: scan left to right and, for each
/// not-yet-merged entry, absorb every later not-yet-merged entry that
/// shares its attributes and is prefix-mergeable with its (possibly
/// already-grown) prefix. Returns the resulting list and whether any merge
/// happened, so the caller can iterate to a fixpoint.
fn aggregate_pass(routes: &[Route]) -> (Vec<Route>, bool) {
    let mut result = Vec::with_capacity(routes.len());
    let mut used = vec![false; routes.len()];
    let mut changed = false;
    for i in 0..routes.len() {
        if used[i] {
            continue;
        }
        let mut merged = routes[i].clone();
        used[i] = true;
        for j in (i + 1)..routes.len() {
            if used[j] {
                continue;
            }
            if merged.same_attributes(&routes[j]) && merged.prefix.mergeable(&routes[j].prefix) {
                merged.prefix = merged.prefix.merge(&routes[j].prefix);
                used[j] = true;
                changed = true;
            }
        }
        result.push(merged);
    }
    (result, changed)
}

/// Rebuild an aggregated view from `raw` by repeated single-pass
/// coalescing until a pass makes no change (§4.3). Order in the result
/// follows first-insertion order of each surviving aggregate, since a
/// merge always keeps the earlier entry's position.
pub fn aggregate(raw: &[Route]) -> Vec<Route> {
    let mut current = raw.to_vec();
    loop {
        let (next, changed) = aggregate_pass(&current);
        current = next;
        if !changed {
            return current;
        }
    }
}

/// The routing information base: `raw` as learned, `fib` as the
/// aggregated view every lookup uses.
#[derive(Debug, Default)]
pub struct Rib {
    raw: Vec<Route>,
    fib: Vec<Route>,
    withdrawals: Vec<WithdrawalEntry>,
}

impl Rib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `route` to `raw` and reaggregate.
    pub fn insert(&mut self, route: Route) {
        self.raw.push(route);
        self.reaggregate();
    }

    /// Remove every `raw` entry with an exact `(peer, prefix)` match and
    /// reaggregate. Does not touch entries contained within a larger
    /// aggregate that happens to cover the same prefix (§4.2).
    pub fn remove(&mut self, peer: &str, prefix: &Prefix) {
        self.raw.retain(|r| !(r.peer == peer && r.prefix == *prefix));
        self.reaggregate();
    }

    /// Record a withdrawal for the diagnostic log without touching `raw`.
    /// Callers pair this with one [`Rib::remove`] per listed prefix.
    pub fn log_withdrawal(&mut self, peer: NeighborId, prefixes: Vec<Prefix>) {
        self.withdrawals.push(WithdrawalEntry { peer, prefixes });
    }

    fn reaggregate(&mut self) {
        self.fib = aggregate(&self.raw);
    }

    /// Every `fib` entry whose prefix contains `addr`.
    pub fn lookup(&self, addr: u32) -> Vec<&Route> {
        self.fib.iter().filter(|r| r.prefix.contains(addr)).collect()
    }

    /// Snapshot of `fib` projected to `(prefix, peer)`, in `fib` order.
    pub fn dump(&self) -> Vec<(Prefix, NeighborId)> {
        self.fib.iter().map(|r| (r.prefix, r.peer.clone())).collect()
    }

    pub fn fib(&self) -> &[Route] {
        &self.fib
    }

    pub fn raw(&self) -> &[Route] {
        &self.raw
    }

    pub fn withdrawals(&self) -> &[WithdrawalEntry] {
        &self.withdrawals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn route(prefix: &str, peer: &str) -> Route {
        Route {
            prefix: Prefix::from_str(prefix).unwrap(),
            peer: peer.to_string(),
            localpref: 100,
            self_origin: true,
            as_path: vec![1],
            origin: Origin::IGP,
        }
    }

    #[test]
    fn s1_aggregation_fixpoint() {
        let mut rib = Rib::new();
        rib.insert(route("192.168.0.0/24", "peerA"));
        rib.insert(route("192.168.1.0/24", "peerA"));
        assert_eq!(rib.fib().len(), 1);
        assert_eq!(rib.fib()[0].prefix.to_string(), "192.168.0.0/23");

        rib.insert(route("192.168.2.0/24", "peerA"));
        rib.insert(route("192.168.3.0/24", "peerA"));
        assert_eq!(rib.fib().len(), 1);
        assert_eq!(rib.fib()[0].prefix.to_string(), "192.168.0.0/22");
    }

    #[test]
    fn s2_disaggregation() {
        let mut rib = Rib::new();
        for p in ["192.168.0.0/24", "192.168.1.0/24", "192.168.2.0/24", "192.168.3.0/24"] {
            rib.insert(route(p, "peerA"));
        }
        let withdrawn = Prefix::from_str("192.168.1.0/24").unwrap();
        rib.remove("peerA", &withdrawn);

        let mut fib_strs: Vec<String> = rib.fib().iter().map(|r| r.prefix.to_string()).collect();
        fib_strs.sort();
        assert_eq!(fib_strs, vec!["192.168.0.0/24".to_string(), "192.168.2.0/23".to_string()]);
    }

    #[test]
    fn fixpoint_has_no_remaining_mergeable_pair() {
        let mut rib = Rib::new();
        for p in ["10.0.0.0/24", "10.0.1.0/24", "10.0.4.0/24"] {
            rib.insert(route(p, "peerA"));
        }
        let fib = rib.fib();
        for i in 0..fib.len() {
            for j in (i + 1)..fib.len() {
                assert!(!fib[i].prefix.mergeable(&fib[j].prefix));
            }
        }
    }

    #[test]
    fn lookup_only_returns_containing_prefixes() {
        let mut rib = Rib::new();
        rib.insert(route("10.0.0.0/24", "peerA"));
        rib.insert(route("10.1.0.0/16", "peerB"));
        let hits = rib.lookup(crate::prefix::parse_ip("10.1.2.3").unwrap());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].peer, "peerB");
    }

    #[test]
    fn exact_remove_does_not_touch_unrelated_aggregate_members() {
        let mut rib = Rib::new();
        rib.insert(route("10.0.0.0/24", "peerA"));
        let other = Prefix::from_str("10.0.1.0/24").unwrap();
        rib.remove("peerA", &other);
        assert_eq!(rib.fib().len(), 1);
    }
}
