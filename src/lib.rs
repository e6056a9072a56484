//! A simplified single-AS BGP-like route server.
//!
//! The routing core — prefix algebra, the RIB and its aggregator, the
//! decision process, the policy filter and the neighbor/message dispatchers
//! — is transport-agnostic: it consumes and produces [`message::Message`]
//! values and never touches a socket directly. [`transport`] is the only
//! module that does, so the core can be (and is) exercised in tests without
//! a real `SOCK_SEQPACKET` pair.

pub mod config;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod policy;
pub mod prefix;
pub mod rib;
pub mod route;
pub mod transport;
pub mod types;

pub use config::{Cli, Config, NeighborDescriptor};
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, RouterError};
pub use transport::EventLoop;
