//! Startup configuration (C10): CLI argument parsing and neighbor
//! descriptor validation. Everything here runs before any socket is opened
//! or any RIB state exists; every failure is a [`ConfigError`], never a
//! [`crate::error::RouterError`].

use std::collections::HashMap;

use clap::Parser;

use crate::error::ConfigError;
use crate::types::{Asn, NeighborId, Relation};

/// `router <asn> <descriptor>...` (§4.10, §6). `asn` and the relation
/// suffix of each descriptor are validated after parsing, not by clap
/// itself, so that a bad value is reported as the router's own
/// [`ConfigError`] rather than a generic clap usage error.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A simplified single-AS BGP-like route server",
    long_about = None
)]
pub struct Cli {
    /// This router's AS number.
    pub asn: String,
    /// One or more `<address>-<relation>` neighbor descriptors.
    pub neighbors: Vec<String>,
}

/// A single `<address>-<relation>` descriptor, parsed and validated.
#[derive(Debug, Clone)]
pub struct NeighborDescriptor {
    pub id: NeighborId,
    pub relation: Relation,
}

impl NeighborDescriptor {
    /// Split on the *last* `-`, since a socket path may itself contain
    /// dashes (it is a filesystem path, not necessarily a dotted quad).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (addr, rel) = s
            .rsplit_once('-')
            .ok_or_else(|| ConfigError::MalformedDescriptor(s.to_string()))?;
        if addr.is_empty() {
            return Err(ConfigError::MalformedDescriptor(s.to_string()));
        }
        let relation = Relation::parse(rel)
            .ok_or_else(|| ConfigError::UnknownRelation(rel.to_string(), s.to_string()))?;
        Ok(Self {
            id: addr.to_string(),
            relation,
        })
    }
}

/// The fully validated startup configuration: this router's ASN plus its
/// fixed neighbor table. Constructing one never touches the filesystem or
/// a socket; that happens afterward, in the transport layer.
#[derive(Debug)]
pub struct Config {
    pub asn: Asn,
    pub neighbors: Vec<NeighborDescriptor>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let asn = cli
            .asn
            .parse::<Asn>()
            .map_err(|_| ConfigError::InvalidAsn(cli.asn.clone()))?;
        if cli.neighbors.is_empty() {
            return Err(ConfigError::NoNeighbors);
        }
        let neighbors = cli
            .neighbors
            .iter()
            .map(|s| NeighborDescriptor::parse(s))
            .collect::<Result<_, _>>()?;
        Ok(Self { asn, neighbors })
    }

    /// The neighbor-to-relation table the dispatcher needs.
    pub fn relations(&self) -> HashMap<NeighborId, Relation> {
        self.neighbors
            .iter()
            .map(|d| (d.id.clone(), d.relation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_descriptor() {
        let d = NeighborDescriptor::parse("192.168.0.2-cust").unwrap();
        assert_eq!(d.id, "192.168.0.2");
        assert_eq!(d.relation, Relation::Cust);
    }

    #[test]
    fn splits_on_last_dash_for_path_like_addresses() {
        let d = NeighborDescriptor::parse("/tmp/sockets/as-65000-peer").unwrap();
        assert_eq!(d.id, "/tmp/sockets/as-65000");
        assert_eq!(d.relation, Relation::Peer);
    }

    #[test]
    fn rejects_unknown_relation() {
        assert!(matches!(
            NeighborDescriptor::parse("192.168.0.2-frenemy"),
            Err(ConfigError::UnknownRelation(_, _))
        ));
    }

    #[test]
    fn rejects_descriptor_without_dash() {
        assert!(matches!(
            NeighborDescriptor::parse("192.168.0.2"),
            Err(ConfigError::MalformedDescriptor(_))
        ));
    }

    #[test]
    fn config_rejects_non_numeric_asn() {
        let cli = Cli {
            asn: "not-a-number".to_string(),
            neighbors: vec!["192.168.0.2-cust".to_string()],
        };
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::InvalidAsn(_))
        ));
    }

    #[test]
    fn config_rejects_empty_neighbor_list() {
        let cli = Cli {
            asn: "1".to_string(),
            neighbors: vec![],
        };
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::NoNeighbors)));
    }

    #[test]
    fn config_builds_relation_table() {
        let cli = Cli {
            asn: "65000".to_string(),
            neighbors: vec!["10.0.0.1-cust".to_string(), "10.0.0.2-peer".to_string()],
        };
        let config = Config::from_cli(cli).unwrap();
        assert_eq!(config.asn, 65000);
        let relations = config.relations();
        assert_eq!(relations.get("10.0.0.1"), Some(&Relation::Cust));
        assert_eq!(relations.get("10.0.0.2"), Some(&Relation::Peer));
    }
}
