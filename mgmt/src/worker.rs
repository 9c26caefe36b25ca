// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The host-abstraction contract the orchestrator drives. Implementations
//! are responsible for actually instantiating namespaces, veths, and routes;
//! the orchestrator only calls through this trait.

use net::eth::mac::Mac;
use net::ipv4::Ipv4Subnet;
use routing::NodeId;
use std::net::Ipv4Addr;

/// Each virtual host gets a veth pair; one MAC is needed per end.
pub const NEEDED_MACS_CLIENT: usize = 2;
/// Each link between non-client nodes is a veth pair as well.
pub const NEEDED_MACS_LINK: usize = 2;

/// Identifies a port registered with the worker for an edge interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(pub u32);

/// The metadata a GraphML `<node>` carries, forwarded to the worker verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMeta {
    pub packetloss: Option<f64>,
    pub bandwidth_up: Option<f64>,
    pub bandwidth_down: Option<f64>,
}

/// The metadata a GraphML `<edge>` carries, forwarded to the worker verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMeta {
    pub latency: Option<f64>,
    pub packetloss: Option<f64>,
    pub jitter: Option<f64>,
    pub queue_len: Option<i64>,
}

/// Errors surfaced by a [`Worker`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerError {
    #[error("worker initialization failed: {0}")]
    InitFailed(String),
    #[error("could not resolve remote MAC for interface {interface:?} peer {ip}")]
    RemoteMacUnresolved { interface: String, ip: Ipv4Addr },
    #[error("could not resolve local MAC for interface {0:?}")]
    LocalMacUnresolved(String),
}

/// The host-abstraction API the orchestrator drives to instantiate the
/// virtual topology. Every method is side-effecting but idempotent per
/// `(id, kind)`, so a mock implementation can validate call sequences
/// without a real network namespace backing it.
pub trait Worker {
    /// One-time setup: namespace naming prefix, OVS database directory and
    /// schema, and a soft cap on memory the worker may reserve.
    fn init(&mut self, ns_prefix: &str, ovs_dir: &str, ovs_schema: &str, soft_mem_cap: u64) -> Result<(), WorkerError>;

    /// Tear down every host created by this worker instance, returning how many there were.
    fn destroy_hosts(&mut self) -> usize;

    /// Discover the MAC address of the physical peer at `ip` reachable via `interface`.
    fn get_edge_remote_mac(&mut self, interface: &str, ip: Ipv4Addr) -> Result<Mac, WorkerError>;

    /// The local MAC address bound to `interface`.
    fn get_edge_local_mac(&mut self, interface: &str) -> Result<Mac, WorkerError>;

    /// Create the root namespace's veth pair with addresses `a` and `b`.
    fn add_root(&mut self, a: Ipv4Addr, b: Ipv4Addr);

    /// Register an outbound physical interface, returning a port shared by
    /// every edge that uses the same interface name.
    fn add_edge_interface(&mut self, interface: &str) -> Port;

    /// Install forwarding for `subnet` out of `port` using the given local/remote MAC pair.
    fn add_edge_routes(&mut self, subnet: Ipv4Subnet, port: Port, local_mac: Mac, remote_mac: Mac);

    /// Instantiate a virtual host with the given dense id, interface address, and MAC block.
    fn add_host(&mut self, id: NodeId, ip: Ipv4Addr, macs: &[Mac], meta: &NodeMeta);

    /// Instantiate a link between two non-client nodes.
    fn add_link(&mut self, u: NodeId, v: NodeId, ip_u: Ipv4Addr, ip_v: Ipv4Addr, macs: &[Mac], meta: &LinkMeta);

    /// Register a self-link (an edge whose source and target are the same client node).
    fn set_self_link(&mut self, id: NodeId, meta: &LinkMeta);

    /// Install the client's assigned subnet and MAC block behind `port`.
    fn add_client_routes(&mut self, id: NodeId, macs: &[Mac], subnet: Ipv4Subnet, port: Port);

    /// Install one hop of a client-to-client shortest path.
    fn add_internal_routes(
        &mut self,
        u: NodeId,
        v: NodeId,
        ip_u: Ipv4Addr,
        ip_v: Ipv4Addr,
        src_subnet: Ipv4Subnet,
        dst_subnet: Ipv4Subnet,
    );

    /// Hint the worker about expected scale before links start arriving, so
    /// it can size internal tables once instead of growing them repeatedly.
    fn ensure_system_scaling(&mut self, max_links: u64, nodes: u32, clients: u32);

    /// Release any resources the worker is holding, regardless of how setup ended.
    fn cleanup(&mut self);
}
