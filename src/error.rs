//! Error taxonomy for the route server.

use thiserror::Error;

use crate::types::NeighborId;

/// Errors that can occur while the router is processing neighbor traffic.
///
/// These are the steady-state errors: everything that can go wrong once the
/// process is up and the event loop is running. Startup misconfiguration is
/// a distinct, narrower kind, see [`ConfigError`].
#[derive(Error, Debug)]
pub enum RouterError {
    /// A netmask was not a contiguous run of leading ones, or an octet was
    /// out of the `0..=255` range.
    #[error("malformed prefix: {0}")]
    MalformedPrefix(String),
    /// A message referenced a neighbor that was not part of the startup set.
    #[error("unknown neighbor: {0}")]
    UnknownNeighbor(NeighborId),
    /// The message could not be parsed as JSON, or was missing a required
    /// field for its `type`.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    /// The decision process produced an empty candidate set for a `data`
    /// message. This is reported back to the sender as a `no route` message
    /// rather than propagated as a hard failure.
    #[error("no route to destination")]
    UnreachableDestination,
    /// A socket read or write failed. This is fatal: the event loop exits
    /// the process rather than attempting to continue with a neighbor whose
    /// transport is in an unknown state.
    #[error("transport failure on neighbor {0}: {1}")]
    TransportFailure(NeighborId, #[source] std::io::Error),
}

/// Errors that can occur while parsing startup arguments or opening neighbor
/// sockets, before the event loop is entered and before any RIB state
/// exists.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The AS number argument was missing or not a valid non-negative
    /// integer.
    #[error("invalid AS number: {0}")]
    InvalidAsn(String),
    /// A neighbor descriptor was not of the form `<address>-<relation>`.
    #[error("malformed neighbor descriptor: {0}")]
    MalformedDescriptor(String),
    /// A neighbor descriptor named a relation other than `cust`, `peer` or
    /// `prov`.
    #[error("unknown relation `{0}` in descriptor `{1}`")]
    UnknownRelation(String, String),
    /// At least one neighbor descriptor is required.
    #[error("at least one neighbor descriptor is required")]
    NoNeighbors,
    /// Connecting to a neighbor's socket path failed.
    #[error("failed to connect to neighbor socket {0}: {1}")]
    SocketConnect(String, #[source] std::io::Error),
}
