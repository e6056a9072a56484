//! The neighbor update dispatcher (C6) and the message dispatcher (C7).
//!
//! Both layers return the messages they want sent rather than writing to a
//! socket directly, so the transport (C8) and the tests can drive the same
//! logic without a real `SOCK_SEQPACKET` pair.

use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::json;

use crate::decision;
use crate::error::RouterError;
use crate::message::{Message, MessageType, RevokeEntry, TableEntry, UpdateBody};
use crate::policy;
use crate::prefix;
use crate::rib::Rib;
use crate::route::Route;
use crate::types::{Asn, NeighborId, Relation};

/// The router-side address of the link to `neighbor`: its first three
/// octets followed by `.1` (§4.6, §6).
fn router_side_address(neighbor: &str) -> Result<String, RouterError> {
    let parts: Vec<&str> = neighbor.split('.').collect();
    if parts.len() != 4 {
        return Err(RouterError::MalformedMessage(format!(
            "`{neighbor}` is not a dotted-quad neighbor address"
        )));
    }
    Ok(format!("{}.{}.{}.1", parts[0], parts[1], parts[2]))
}

/// Owns the RIB and the fixed neighbor table, and turns inbound messages
/// into RIB mutations plus the outbound messages they provoke.
pub struct Dispatcher {
    asn: Asn,
    relations: HashMap<NeighborId, Relation>,
    rib: Rib,
}

impl Dispatcher {
    pub fn new(asn: Asn, relations: HashMap<NeighborId, Relation>) -> Self {
        Self {
            asn,
            relations,
            rib: Rib::new(),
        }
    }

    pub fn rib(&self) -> &Rib {
        &self.rib
    }

    fn relation_of(&self, neighbor: &str) -> Option<Relation> {
        self.relations.get(neighbor).copied()
    }

    /// Every neighbor other than `source` that an announcement sourced
    /// from `source_rel` should reach (§4.5).
    fn export_targets(&self, source: &str, source_rel: Relation) -> Vec<NeighborId> {
        self.relations
            .iter()
            .filter(|(id, _)| id.as_str() != source)
            .filter(|(_, dest_rel)| policy::should_export(source_rel, **dest_rel))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Top-level demultiplex (§4.7). Never returns an `Err`: malformed
    /// input and unknown neighbors are logged and the message is dropped,
    /// matching the "first three [error kinds] are logged and discarded"
    /// policy of §7.
    pub fn handle(&mut self, incoming: &Message) -> Vec<Message> {
        let result = match incoming.kind {
            MessageType::Update => self.handle_update(incoming),
            MessageType::Revoke => self.handle_revoke(incoming),
            MessageType::Data => self.handle_data(incoming),
            MessageType::Dump => self.handle_dump(incoming),
            MessageType::Table | MessageType::NoRoute => {
                debug!("dropping inbound {:?} message from {}", incoming.kind, incoming.src);
                Ok(Vec::new())
            }
        };
        match result {
            Ok(out) => out,
            Err(e) => {
                warn!("dropping message from {}: {e}", incoming.src);
                Vec::new()
            }
        }
    }

    fn handle_update(&mut self, incoming: &Message) -> Result<Vec<Message>, RouterError> {
        let source_rel = self
            .relation_of(&incoming.src)
            .ok_or_else(|| RouterError::UnknownNeighbor(incoming.src.clone()))?;
        let body = incoming.update_body()?;
        let route = body.to_route(incoming.src.clone())?;
        debug!("learned {route} from {}", incoming.src);
        self.rib.insert(route.clone());

        let mut out = Vec::new();
        for target in self.export_targets(&incoming.src, source_rel) {
            let outgoing_body = UpdateBody::from_route(&route, self.asn);
            out.push(Message {
                src: router_side_address(&target)?,
                dst: target,
                kind: MessageType::Update,
                msg: serde_json::to_value(outgoing_body)
                    .map_err(|e| RouterError::MalformedMessage(e.to_string()))?,
            });
        }
        Ok(out)
    }

    fn handle_revoke(&mut self, incoming: &Message) -> Result<Vec<Message>, RouterError> {
        let source_rel = self
            .relation_of(&incoming.src)
            .ok_or_else(|| RouterError::UnknownNeighbor(incoming.src.clone()))?;
        let entries = incoming.revoke_body()?;
        let prefixes: Vec<_> = entries
            .iter()
            .map(RevokeEntry::to_prefix)
            .collect::<Result<_, _>>()?;
        self.rib.log_withdrawal(incoming.src.clone(), prefixes.clone());
        for prefix in &prefixes {
            self.rib.remove(&incoming.src, prefix);
        }
        debug!("withdrew {} prefixes from {}", prefixes.len(), incoming.src);

        let mut out = Vec::new();
        for target in self.export_targets(&incoming.src, source_rel) {
            out.push(Message {
                src: router_side_address(&target)?,
                dst: target,
                kind: MessageType::Revoke,
                msg: serde_json::to_value(&entries)
                    .map_err(|e| RouterError::MalformedMessage(e.to_string()))?,
            });
        }
        Ok(out)
    }

    fn handle_data(&mut self, incoming: &Message) -> Result<Vec<Message>, RouterError> {
        let source_rel = self
            .relation_of(&incoming.src)
            .ok_or_else(|| RouterError::UnknownNeighbor(incoming.src.clone()))?;
        let addr = prefix::parse_ip(&incoming.dst)?;
        let candidates = self.rib.lookup(addr);

        match decision::decide(&candidates, source_rel, |p| self.relation_of(p)) {
            Ok(route) => {
                debug!("forwarding data for {} via {}", incoming.dst, route.peer);
                Ok(vec![Message {
                    src: router_side_address(&route.peer)?,
                    dst: route.peer.clone(),
                    kind: MessageType::Data,
                    msg: incoming.msg.clone(),
                }])
            }
            Err(RouterError::UnreachableDestination) => {
                info!("no route to {} from {}", incoming.dst, incoming.src);
                Ok(vec![Message {
                    src: router_side_address(&incoming.src)?,
                    dst: incoming.src.clone(),
                    kind: MessageType::NoRoute,
                    msg: json!({}),
                }])
            }
            Err(e) => Err(e),
        }
    }

    fn handle_dump(&mut self, incoming: &Message) -> Result<Vec<Message>, RouterError> {
        let entries: Vec<TableEntry> = self
            .rib
            .dump()
            .into_iter()
            .map(|(prefix, peer)| TableEntry::new(prefix, peer))
            .collect();
        Ok(vec![Message {
            src: router_side_address(&incoming.src)?,
            dst: incoming.src.clone(),
            kind: MessageType::Table,
            msg: serde_json::to_value(entries)
                .map_err(|e| RouterError::MalformedMessage(e.to_string()))?,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher(asn: Asn, neighbors: &[(&str, Relation)]) -> Dispatcher {
        let relations = neighbors
            .iter()
            .map(|(id, rel)| (id.to_string(), *rel))
            .collect();
        Dispatcher::new(asn, relations)
    }

    fn update_message(src: &str, dst: &str, network: &str, netmask: &str, localpref: u32) -> Message {
        Message {
            src: src.to_string(),
            dst: dst.to_string(),
            kind: MessageType::Update,
            msg: json!({
                "network": network, "netmask": netmask,
                "localpref": localpref, "selfOrigin": true,
                "ASPath": [], "origin": "IGP"
            }),
        }
    }

    #[test]
    fn s4_update_from_peer_only_reaches_customers() {
        let mut d = dispatcher(
            1,
            &[
                ("10.0.0.1", Relation::Peer),
                ("10.0.1.1", Relation::Cust),
                ("10.0.2.1", Relation::Prov),
            ],
        );
        let out = d.handle(&update_message("10.0.0.1", "10.0.0.2", "192.168.0.0", "255.255.255.0", 100));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, "10.0.1.1");
        assert_eq!(out[0].kind, MessageType::Update);
    }

    #[test]
    fn update_from_customer_reaches_everyone_else() {
        let mut d = dispatcher(
            1,
            &[
                ("10.0.0.1", Relation::Cust),
                ("10.0.1.1", Relation::Cust),
                ("10.0.2.1", Relation::Peer),
            ],
        );
        let out = d.handle(&update_message("10.0.0.1", "10.0.0.2", "192.168.0.0", "255.255.255.0", 100));
        let mut dsts: Vec<_> = out.iter().map(|m| m.dst.clone()).collect();
        dsts.sort();
        assert_eq!(dsts, vec!["10.0.1.1".to_string(), "10.0.2.1".to_string()]);
    }

    #[test]
    fn as_path_is_prepended_on_the_outgoing_copy() {
        let mut d = dispatcher(65000, &[("10.0.0.1", Relation::Cust), ("10.0.1.1", Relation::Cust)]);
        let out = d.handle(&update_message("10.0.0.1", "10.0.0.2", "192.168.0.0", "255.255.255.0", 100));
        let body: UpdateBody = serde_json::from_value(out[0].msg.clone()).unwrap();
        assert_eq!(body.as_path, vec![65000]);
    }

    #[test]
    fn s4_data_from_peer_through_prov_route_is_no_route() {
        let mut d = dispatcher(1, &[("10.0.0.1", Relation::Peer), ("10.0.1.1", Relation::Prov)]);
        d.handle(&update_message("10.0.1.1", "10.0.0.2", "172.16.0.0", "255.255.0.0", 100));
        let data = Message {
            src: "10.0.0.1".to_string(),
            dst: "172.16.0.5".to_string(),
            kind: MessageType::Data,
            msg: json!({"payload": "hi"}),
        };
        let out = d.handle(&data);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MessageType::NoRoute);
        assert_eq!(out[0].dst, "10.0.0.1");
    }

    #[test]
    fn s6_no_route_reply_addressing() {
        let mut d = dispatcher(1, &[("10.0.0.1", Relation::Cust)]);
        let data = Message {
            src: "10.0.0.1".to_string(),
            dst: "172.16.0.1".to_string(),
            kind: MessageType::Data,
            msg: json!({}),
        };
        let out = d.handle(&data);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MessageType::NoRoute);
        assert_eq!(out[0].src, "10.0.0.1");
        assert_eq!(out[0].dst, "10.0.0.1");
    }

    #[test]
    fn unknown_neighbor_is_dropped_silently() {
        let mut d = dispatcher(1, &[("10.0.0.1", Relation::Cust)]);
        let out = d.handle(&update_message("10.9.9.9", "10.0.0.1", "192.168.0.0", "255.255.255.0", 100));
        assert!(out.is_empty());
    }

    #[test]
    fn dump_reflects_current_fib() {
        let mut d = dispatcher(1, &[("10.0.0.1", Relation::Cust)]);
        d.handle(&update_message("10.0.0.1", "10.0.0.2", "192.168.0.0", "255.255.255.0", 100));
        let dump = Message {
            src: "10.0.0.1".to_string(),
            dst: "10.0.0.2".to_string(),
            kind: MessageType::Dump,
            msg: json!({}),
        };
        let out = d.handle(&dump);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, MessageType::Table);
        let entries: Vec<TableEntry> = serde_json::from_value(out[0].msg.clone()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].network, "192.168.0.0");
    }
}
