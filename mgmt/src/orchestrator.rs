// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The two-phase setup pipeline: validate and default the edge-node table,
//! then drive GraphML ingest to instantiate hosts, links, and routes through
//! the [`Worker`] host-abstraction trait.

use crate::config::{EdgeNodeDefaults, EdgeNodeInput, GraphMlOptions, SetupConfig};
use crate::error::{ConfigError, ResourceError, SetupError, TopologyError};
use crate::worker::{LinkMeta, NodeMeta, Port, Worker, NEEDED_MACS_CLIENT, NEEDED_MACS_LINK};
use graphml::{EdgeAttrs, GraphSink, GraphmlDriver, GraphmlError, NodeAttrs, PassFilter};
use net::eth::{Mac, MacGenerator};
use net::ipv4::{Ipv4AddrIter, Ipv4Error, Ipv4Subnet};
use routing::{NodeId, RoutePlanner};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::Ipv4Addr;
use tracing::{debug, info, instrument, warn};

/// One edge node after phase 1 validation: every field is resolved, no
/// further defaulting happens downstream.
#[derive(Debug, Clone)]
pub struct EdgeNode {
    pub ip: Ipv4Addr,
    pub interface: String,
    pub mac: Mac,
    pub virtual_subnet: Ipv4Subnet,
}

/// Run the full setup pipeline against `config`, driving `worker` to
/// instantiate the resulting topology.
///
/// # Errors
///
/// Returns the first fatal [`SetupError`] encountered in either phase.
#[instrument(skip(config, worker))]
pub fn run_setup(config: &SetupConfig, worker: &mut impl Worker) -> Result<(), SetupError> {
    worker
        .init(&config.ns_prefix, &config.ovs_dir, &config.ovs_schema, config.soft_mem_cap)
        .map_err(SetupError::Worker)?;

    let edges = validate_edges(&config.edge_nodes, &config.edge_node_defaults, worker)?;
    instantiate_topology(config, &edges, worker)?;
    Ok(())
}

/// Phase 1: require at least one edge, default missing interfaces/MACs/
/// subnets, and log the resulting table.
fn validate_edges(
    inputs: &[EdgeNodeInput],
    defaults: &EdgeNodeDefaults,
    worker: &mut impl Worker,
) -> Result<Vec<EdgeNode>, ConfigError> {
    if inputs.is_empty() {
        return Err(ConfigError::NoEdgeNodes);
    }

    let mut interfaces = Vec::with_capacity(inputs.len());
    let mut macs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let interface = match &input.interface {
            Some(intf) => intf.clone(),
            None => defaults
                .interface
                .clone()
                .ok_or(ConfigError::MissingInterface { ip: input.ip })?,
        };
        let mac = match input.mac {
            Some(mac) => mac,
            None => worker
                .get_edge_remote_mac(&interface, input.ip)
                .map_err(|source| ConfigError::UnresolvableRemoteMac {
                    ip: input.ip,
                    interface: interface.clone(),
                    source,
                })?,
        };
        interfaces.push(interface);
        macs.push(mac);
    }

    #[allow(clippy::cast_possible_truncation)] // edge_nodes.len() realistically fits u32
    let unspecified = inputs.iter().filter(|e| e.virtual_subnet.is_none()).count() as u32;
    let mut fragments = if unspecified > 0 {
        let global = defaults.global_virtual_subnet.ok_or(ConfigError::NoGlobalSubnetConfigured(unspecified))?;
        Some(global.fragment(unspecified)?)
    } else {
        None
    };

    let mut edges = Vec::with_capacity(inputs.len());
    for ((input, interface), mac) in inputs.iter().zip(interfaces).zip(macs) {
        let virtual_subnet = match input.virtual_subnet {
            Some(subnet) => subnet,
            None => {
                let frags = fragments.as_mut().ok_or(ConfigError::NoGlobalSubnetConfigured(unspecified))?;
                frags.next().ok_or(ConfigError::Malformed(
                    "global subnet fragment iterator exhausted before every edge was assigned a subnet".to_string(),
                ))?
            }
        };
        edges.push(EdgeNode { ip: input.ip, interface, mac, virtual_subnet });
    }

    for edge in &edges {
        info!(ip = %edge.ip, interface = %edge.interface, mac = %edge.mac, subnet = %edge.virtual_subnet, "edge node validated");
    }

    Ok(edges)
}

/// The three ranges never handed out as host interface addresses, plus
/// every edge's virtual client subnet.
fn restricted_ranges(edges: &[EdgeNode]) -> Vec<Ipv4Subnet> {
    let literal = |s: &str| -> Ipv4Subnet { s.parse().unwrap_or_else(|_| unreachable!("{s} is a valid literal subnet")) };
    let mut ranges = vec![literal("0.0.0.0/8"), literal("127.0.0.0/8"), literal("255.255.255.255/32")];
    ranges.extend(edges.iter().map(|e| e.virtual_subnet));
    ranges
}

fn open_source(config: &SetupConfig) -> Result<Box<dyn BufRead>, ConfigError> {
    if config.reads_from_stdin() {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = File::open(&config.src_file).map_err(|source| ConfigError::SourceUnreadable {
            path: config.src_file.clone(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Phase 2: install the root namespace and edge interfaces, drive GraphML
/// ingest, plan routes, assign clients to edges, and emit per-pair
/// forwarding entries.
fn instantiate_topology(config: &SetupConfig, edges: &[EdgeNode], worker: &mut impl Worker) -> Result<(), SetupError> {
    let avoid = restricted_ranges(edges);
    let mut addrs = Ipv4AddrIter::new(Ipv4Subnet::root(), avoid);
    let a = addrs.next().ok_or(ResourceError::AddressSpaceExhausted(Ipv4Error::AddressSpaceExhausted(
        Ipv4Addr::BROADCAST,
    )))?;
    let b = addrs.next().ok_or(ResourceError::AddressSpaceExhausted(Ipv4Error::AddressSpaceExhausted(
        Ipv4Addr::BROADCAST,
    )))?;
    worker.add_root(a, b);

    let mut ports: HashMap<String, Port> = HashMap::new();
    for edge in edges {
        let port = *ports
            .entry(edge.interface.clone())
            .or_insert_with(|| worker.add_edge_interface(&edge.interface));
        let local_mac = worker
            .get_edge_local_mac(&edge.interface)
            .map_err(|source| ConfigError::UnresolvableLocalMac {
                interface: edge.interface.clone(),
                source,
            })?;
        worker.add_edge_routes(edge.virtual_subnet, port, local_mac, edge.mac);
    }

    #[allow(clippy::cast_possible_truncation)] // edge_nodes.len() realistically fits u32
    let edge_count = edges.len() as u32;
    let mut sink = TopologySink::new(&mut *worker, addrs, config.graphml.client_type.clone(), &config.graphml, edge_count);

    run_graphml(config, &mut sink)?;

    let TopologySink { mut states, client_count, mut planner, seen_links, error, .. } = sink;
    if let Some(err) = error {
        return Err(err);
    }
    if !seen_links {
        return Err(TopologyError::NoLinks.into());
    }
    planner.plan();

    assign_clients_to_edges(&mut states, edges, client_count, edge_count, &ports, worker)?;
    emit_client_forwarding(&states, &planner, worker);

    worker.cleanup();
    Ok(())
}

fn run_graphml(config: &SetupConfig, sink: &mut TopologySink<'_, impl Worker>) -> Result<(), SetupError> {
    let mut driver = GraphmlDriver::new();
    if config.graphml.two_pass {
        if config.reads_from_stdin() {
            return Err(GraphmlError::TwoPassRequiresSeek.into());
        }
        let first = open_source(config)?;
        driver.run(first, PassFilter::NodesOnly, sink)?;
        let second = open_source(config)?;
        driver.run(second, PassFilter::EdgesOnly, sink)?;
    } else {
        let src = open_source(config)?;
        driver.run(src, PassFilter::Both, sink)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct NodeState {
    id: NodeId,
    ip: Ipv4Addr,
    is_client: bool,
    subnet: Option<Ipv4Subnet>,
    macs: Vec<Mac>,
}

/// The [`GraphSink`] implementation that drives components A, B, D, E, and H
/// from node/edge callbacks fired by the GraphML driver in document order.
///
/// The sink latches a `dead`-equivalent `error` field the same way the
/// driver itself does: once set, later callbacks are no-ops, since
/// [`GraphSink`]'s methods cannot themselves return a `Result`.
struct TopologySink<'a, W: Worker> {
    worker: &'a mut W,
    addr_iter: Ipv4AddrIter,
    mac_gen: MacGenerator,
    client_type: Option<String>,
    weight_key: String,
    edge_count: u32,
    ids: HashMap<String, usize>,
    states: Vec<NodeState>,
    client_count: u32,
    planner: RoutePlanner,
    clients_per_edge: f64,
    accepting_links: bool,
    seen_links: bool,
    error: Option<SetupError>,
}

impl<'a, W: Worker> TopologySink<'a, W> {
    fn new(worker: &'a mut W, addr_iter: Ipv4AddrIter, client_type: Option<String>, opts: &GraphMlOptions, edge_count: u32) -> Self {
        TopologySink {
            worker,
            addr_iter,
            mac_gen: MacGenerator::new(),
            client_type,
            weight_key: opts.weight_key.clone(),
            edge_count,
            ids: HashMap::new(),
            states: Vec::new(),
            client_count: 0,
            planner: RoutePlanner::new(),
            clients_per_edge: 0.0,
            accepting_links: false,
            seen_links: false,
            error: None,
        }
    }

    fn weight_of(&self, attrs: &EdgeAttrs) -> f64 {
        match self.weight_key.as_str() {
            "packetloss" => attrs.packetloss,
            "jitter" => attrs.jitter,
            #[allow(clippy::cast_precision_loss)] // queue lengths are small counts
            "queue_len" => attrs.queue_len.map(|q| q as f64),
            _ => attrs.latency,
        }
        .unwrap_or(0.0)
    }
}

impl<W: Worker> GraphSink for TopologySink<'_, W> {
    fn node(&mut self, id: &str, attrs: NodeAttrs) {
        if self.error.is_some() {
            return;
        }
        if self.ids.contains_key(id) {
            return;
        }
        #[allow(clippy::cast_possible_truncation)] // node counts realistically fit u32
        let node_id = NodeId(self.states.len() as u32);
        let ip = match self.addr_iter.next() {
            Some(ip) => ip,
            None => {
                self.error = Some(ResourceError::AddressSpaceExhausted(Ipv4Error::AddressSpaceExhausted(Ipv4Addr::BROADCAST)).into());
                return;
            }
        };
        let is_client = match &self.client_type {
            None => true,
            Some(discriminator) => attrs.kind.as_deref() == Some(discriminator.as_str()),
        };
        let macs = if is_client {
            match self.mac_gen.next_many(NEEDED_MACS_CLIENT) {
                Ok(macs) => macs,
                Err(_overflow) => {
                    self.error = Some(ResourceError::MacSpaceExhausted.into());
                    return;
                }
            }
        } else {
            Vec::new()
        };
        if is_client {
            self.client_count += 1;
        }
        let meta = NodeMeta {
            packetloss: attrs.packetloss,
            bandwidth_up: attrs.bandwidth_up,
            bandwidth_down: attrs.bandwidth_down,
        };
        self.worker.add_host(node_id, ip, &macs, &meta);
        self.ids.insert(id.to_string(), node_id.0 as usize);
        self.states.push(NodeState { id: node_id, ip, is_client, subnet: None, macs });
        debug!(%id, ?node_id, %ip, is_client, "node ingested");
    }

    fn edge(&mut self, source: &str, target: &str, attrs: EdgeAttrs) {
        if self.error.is_some() {
            return;
        }
        if !self.accepting_links {
            self.accepting_links = true;
            if self.client_count < self.edge_count {
                self.error = Some(
                    TopologyError::NotEnoughClients { clients: self.client_count, edges: self.edge_count }.into(),
                );
                return;
            }
            #[allow(clippy::cast_possible_truncation)] // node counts realistically fit u32
            let nodes = self.states.len() as u32;
            self.worker.ensure_system_scaling(u64::from(nodes) * u64::from(nodes), nodes, self.client_count);
            for state in &self.states {
                self.planner.add_node(state.id);
            }
            self.clients_per_edge = f64::from(self.client_count) / f64::from(self.edge_count);
        }
        self.seen_links = true;

        let Some(&src_idx) = self.ids.get(source) else {
            self.error = Some(TopologyError::UnknownNodeId(source.to_string()).into());
            return;
        };
        let Some(&dst_idx) = self.ids.get(target) else {
            self.error = Some(TopologyError::UnknownNodeId(target.to_string()).into());
            return;
        };

        let weight = self.weight_of(&attrs);
        let meta = LinkMeta {
            latency: attrs.latency,
            packetloss: attrs.packetloss,
            jitter: attrs.jitter,
            queue_len: attrs.queue_len,
        };

        if src_idx == dst_idx && self.states[src_idx].is_client {
            self.worker.set_self_link(self.states[src_idx].id, &meta);
            return;
        }

        if weight < 0.0 {
            self.error = Some(
                TopologyError::NegativeLinkWeight { source: source.to_string(), target: target.to_string(), weight }.into(),
            );
            return;
        }

        let macs = match self.mac_gen.next_many(NEEDED_MACS_LINK) {
            Ok(macs) => macs,
            Err(_overflow) => {
                self.error = Some(ResourceError::MacSpaceExhausted.into());
                return;
            }
        };
        let (u, v) = (self.states[src_idx].id, self.states[dst_idx].id);
        let (ip_u, ip_v) = (self.states[src_idx].ip, self.states[dst_idx].ip);
        self.worker.add_link(u, v, ip_u, ip_v, &macs, &meta);
        if let Err(err) = self.planner.set_weight(u, v, weight) {
            warn!(%err, "route planner rejected forward edge weight");
        }
        if let Err(err) = self.planner.set_weight(v, u, weight) {
            warn!(%err, "route planner rejected reverse edge weight");
        }
    }
}

/// Numerically-stable round-robin client-to-edge assignment: for edge `e`,
/// capacity is `round(cpe*(e+1)) - round(cpe*e)` with round-to-nearest-even,
/// so the per-edge capacities always sum to exactly `client_count`.
fn assign_clients_to_edges(
    states: &mut [NodeState],
    edges: &[EdgeNode],
    client_count: u32,
    edge_count: u32,
    ports: &HashMap<String, Port>,
    worker: &mut impl Worker,
) -> Result<(), SetupError> {
    let cpe = f64::from(client_count) / f64::from(edge_count);
    let client_indices: Vec<usize> = states.iter().enumerate().filter(|(_, s)| s.is_client).map(|(i, _)| i).collect();
    let mut cursor = 0usize;

    for (e, edge) in edges.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)] // edge counts realistically fit f64 exactly
        let (lo, hi) = (cpe * e as f64, cpe * (e as f64 + 1.0));
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)] // capacities are non-negative and bounded by client_count
        let capacity = (hi.round_ties_even() - lo.round_ties_even()) as u32;
        if capacity == 0 {
            continue;
        }
        let port = *ports.get(&edge.interface).unwrap_or(&Port(0));
        let fragments = edge.virtual_subnet.fragment(capacity).map_err(ConfigError::SubnetTooSmall)?;
        for subnet in fragments {
            let Some(&idx) = client_indices.get(cursor) else {
                warn!(edge = e, "fragment iterator produced a subnet with no client left to assign it to");
                break;
            };
            cursor += 1;
            states[idx].subnet = Some(subnet);
            worker.add_client_routes(states[idx].id, &states[idx].macs.clone(), subnet, port);
        }
    }
    Ok(())
}

/// Walk every unordered client pair in ascending id order and emit one
/// `add_internal_routes` call per hop of the shortest path between them.
fn emit_client_forwarding(states: &[NodeState], planner: &RoutePlanner, worker: &mut impl Worker) {
    let client_indices: Vec<usize> = states.iter().enumerate().filter(|(_, s)| s.is_client).map(|(i, _)| i).collect();
    let mut warned_unreachable = false;

    for (i, &s_idx) in client_indices.iter().enumerate() {
        for &t_idx in &client_indices[i + 1..] {
            let s = &states[s_idx];
            let t = &states[t_idx];
            match planner.route(s.id, t.id) {
                Ok(path) => {
                    if path.nodes.len() < 2 {
                        tracing::error!(?s.id, ?t.id, "shortest path of length < 2 between distinct clients");
                        continue;
                    }
                    let (Some(src_subnet), Some(dst_subnet)) = (s.subnet, t.subnet) else {
                        tracing::error!(?s.id, ?t.id, "client missing its assigned subnet at forwarding time");
                        continue;
                    };
                    for hop in path.nodes.windows(2) {
                        let (u, v) = (hop[0], hop[1]);
                        #[allow(clippy::indexing_slicing)] // node ids are dense indices into states
                        let (ip_u, ip_v) = (states[u.0 as usize].ip, states[v.0 as usize].ip);
                        worker.add_internal_routes(u, v, ip_u, ip_v, src_subnet, dst_subnet);
                    }
                }
                Err(_unreachable) => {
                    if !warned_unreachable {
                        warn!(?s.id, ?t.id, "no path between client pair; this is the first such warning this run");
                        warned_unreachable = true;
                    }
                }
            }
        }
    }
}
