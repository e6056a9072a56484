//! The on-wire JSON envelope (§6) and conversions to/from the RIB's
//! internal [`Route`] representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RouterError;
use crate::prefix::Prefix;
use crate::route::Route;
use crate::types::{NeighborId, Origin};

/// The `type` discriminant of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Update,
    Revoke,
    Data,
    #[serde(rename = "no route")]
    NoRoute,
    Dump,
    Table,
}

/// Every message exchanged over a neighbor socket: `{src, dst, type, msg}`.
/// `msg` is kept as a raw [`Value`] here because its shape depends on
/// `kind`; callers narrow it with [`Message::update_body`] and friends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub src: NeighborId,
    pub dst: NeighborId,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub msg: Value,
}

impl Message {
    /// Parse a single JSON document as received from a `SOCK_SEQPACKET`
    /// datagram. Any failure — invalid JSON, an unrecognized `type`, a
    /// missing field — is reported uniformly as `MalformedMessage`, since
    /// the dispatcher's policy is to drop the whole message regardless of
    /// which part of it was unparseable (§4.7).
    pub fn parse(bytes: &[u8]) -> Result<Self, RouterError> {
        serde_json::from_slice(bytes)
            .map_err(|e| RouterError::MalformedMessage(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RouterError> {
        serde_json::to_vec(self).map_err(|e| RouterError::MalformedMessage(e.to_string()))
    }

    pub fn update_body(&self) -> Result<UpdateBody, RouterError> {
        serde_json::from_value(self.msg.clone())
            .map_err(|e| RouterError::MalformedMessage(format!("bad update body: {e}")))
    }

    pub fn revoke_body(&self) -> Result<Vec<RevokeEntry>, RouterError> {
        serde_json::from_value(self.msg.clone())
            .map_err(|e| RouterError::MalformedMessage(format!("bad revoke body: {e}")))
    }
}

/// Body of an `update` message (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBody {
    pub network: String,
    pub netmask: String,
    pub localpref: u32,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl UpdateBody {
    /// Build the internal [`Route`] this update describes, as announced
    /// by `peer`. The `ASPath` is stored exactly as received; prepending
    /// the router's own ASN happens only on re-announcement (§9).
    pub fn to_route(&self, peer: NeighborId) -> Result<Route, RouterError> {
        Ok(Route {
            prefix: Prefix::from_dotted(&self.network, &self.netmask)?,
            peer,
            localpref: self.localpref,
            self_origin: self.self_origin,
            as_path: self.as_path.clone(),
            origin: self.origin,
        })
    }

    /// Build the wire body for re-announcing `route`, prepending `asn` to
    /// its `ASPath` (§4.6).
    pub fn from_route(route: &Route, asn: u32) -> Self {
        let mut as_path = Vec::with_capacity(route.as_path.len() + 1);
        as_path.push(asn);
        as_path.extend_from_slice(&route.as_path);
        Self {
            network: route.prefix.network_dotted(),
            netmask: route.prefix.netmask_dotted(),
            localpref: route.localpref,
            self_origin: route.self_origin,
            as_path,
            origin: route.origin,
        }
    }
}

/// One element of a `revoke` message's `msg` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeEntry {
    pub network: String,
    pub netmask: String,
}

impl RevokeEntry {
    pub fn to_prefix(&self) -> Result<Prefix, RouterError> {
        Prefix::from_dotted(&self.network, &self.netmask)
    }
}

/// One element of a `table` reply's `msg` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub network: String,
    pub netmask: String,
    pub peer: NeighborId,
}

impl TableEntry {
    pub fn new(prefix: Prefix, peer: NeighborId) -> Self {
        Self {
            network: prefix.network_dotted(),
            netmask: prefix.netmask_dotted(),
            peer,
        }
    }
}
