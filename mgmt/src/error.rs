// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error-kind families from which [`SetupError`] is composed, one per
//! stage of the setup pipeline.

use crate::worker::WorkerError;
use net::ipv4::Ipv4Error;

/// Errors found while validating and defaulting the edge-node table (phase 1).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one edge node is required")]
    NoEdgeNodes,
    #[error("edge node {ip} has no interface and no default interface is configured")]
    MissingInterface { ip: std::net::Ipv4Addr },
    #[error("could not resolve remote MAC for edge node {ip} on interface {interface:?}")]
    UnresolvableRemoteMac {
        ip: std::net::Ipv4Addr,
        interface: String,
        #[source]
        source: WorkerError,
    },
    #[error("could not resolve local MAC on interface {interface:?}")]
    UnresolvableLocalMac {
        interface: String,
        #[source]
        source: WorkerError,
    },
    #[error("could not partition the default client subnet across edge nodes")]
    SubnetTooSmall(#[from] Ipv4Error),
    #[error("{0} edge node(s) omit a virtual subnet but no edge_node_defaults.global_virtual_subnet is configured")]
    NoGlobalSubnetConfigured(u32),
    #[error("malformed configuration file: {0}")]
    Malformed(String),
    #[error("could not read topology source {path:?}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors found while driving the GraphML ingest and building the topology (phase 2).
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("topology has {clients} client(s) but {edges} edge node(s); need at least as many clients as edges")]
    NotEnoughClients { clients: u32, edges: u32 },
    #[error("topology contains no links")]
    NoLinks,
    #[error("link {source:?} -> {target:?} has negative weight {weight}")]
    NegativeLinkWeight { source: String, target: String, weight: f64 },
    #[error("edge references unknown node id {0:?}")]
    UnknownNodeId(String),
}

/// Errors arising from finite resources running out. An unreachable client
/// pair is reported but does not abort the run (see
/// `orchestrator::emit_client_forwarding`'s single `warn!` per run), so it
/// is not a variant here.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("IPv4 address space exhausted")]
    AddressSpaceExhausted(#[from] Ipv4Error),
    #[error("MAC address space exhausted")]
    MacSpaceExhausted,
}

/// The single error type returned by [`crate::run_setup`], composing every
/// stage's error-kind family so the CLI has exactly one `Result` to map to
/// an exit code.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] graphml::GraphmlError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
}
