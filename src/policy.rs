//! Customer/peer/provider policy (C5): the forwarding rule and the
//! announcement export rule.

use crate::types::Relation;

/// Is traffic arriving from a neighbor of `src_rel` allowed to be
/// forwarded out to a candidate route learned from a neighbor of
/// `dst_rel`? (§4.5)
///
/// Forwarding is denied exactly when it would cross two non-customer
/// links: `peer -> peer`, `peer -> prov`, `prov -> peer`. Every other
/// combination involves at least one `cust` endpoint and is allowed.
pub fn forwardable(src_rel: Relation, dst_rel: Relation) -> bool {
    use Relation::*;
    !matches!(
        (src_rel, dst_rel),
        (Peer, Peer) | (Peer, Prov) | (Prov, Peer)
    )
}

/// Should an update or revoke received from a neighbor of `source_rel` be
/// re-announced to a neighbor of `dest_rel`? (§4.5, announcement export
/// rule.) A `cust`-sourced announcement goes to everyone; a `peer`- or
/// `prov`-sourced one goes only to `cust` neighbors. Callers are expected
/// to exclude the source neighbor itself before calling this.
pub fn should_export(source_rel: Relation, dest_rel: Relation) -> bool {
    match source_rel {
        Relation::Cust => true,
        Relation::Peer | Relation::Prov => dest_rel == Relation::Cust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Relation::*;

    #[test]
    fn peer_to_peer_is_not_forwardable() {
        assert!(!forwardable(Peer, Peer));
    }

    #[test]
    fn peer_to_prov_and_prov_to_peer_are_not_forwardable() {
        assert!(!forwardable(Peer, Prov));
        assert!(!forwardable(Prov, Peer));
    }

    #[test]
    fn anything_touching_cust_is_forwardable() {
        assert!(forwardable(Cust, Cust));
        assert!(forwardable(Cust, Peer));
        assert!(forwardable(Cust, Prov));
        assert!(forwardable(Peer, Cust));
        assert!(forwardable(Prov, Cust));
    }

    #[test]
    fn prov_to_prov_is_forwardable() {
        assert!(forwardable(Prov, Prov));
    }

    #[test]
    fn s4_export_only_to_customers_from_peer_or_prov() {
        assert!(should_export(Peer, Cust));
        assert!(!should_export(Peer, Peer));
        assert!(!should_export(Peer, Prov));
        assert!(should_export(Prov, Cust));
        assert!(!should_export(Prov, Prov));
    }

    #[test]
    fn cust_sourced_export_reaches_everyone() {
        assert!(should_export(Cust, Cust));
        assert!(should_export(Cust, Peer));
        assert!(should_export(Cust, Prov));
    }
}
