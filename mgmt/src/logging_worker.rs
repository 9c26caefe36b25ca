// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A [`Worker`] that never touches a real namespace, veth, or OVS database:
//! every call is logged at an appropriate level and otherwise a no-op. This
//! is the worker wired into the `netsetup` binary; a production worker that
//! actually instantiates namespaces and kernel routes is a separate
//! collaborator behind the same trait.

use crate::worker::{LinkMeta, NodeMeta, Port, Worker, WorkerError};
use net::eth::{Mac, MacGenerator};
use net::ipv4::Ipv4Subnet;
use routing::NodeId;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// A no-op [`Worker`] that logs every call it receives. MAC addresses that
/// would normally come from hardware discovery are instead drawn from an
/// internal counter, since there is no real interface to query.
#[derive(Debug, Default)]
pub struct LoggingWorker {
    host_count: usize,
    ports: HashMap<String, Port>,
    mac_gen: MacGenerator,
}

impl LoggingWorker {
    #[must_use]
    pub fn new() -> Self {
        LoggingWorker::default()
    }
}

impl Worker for LoggingWorker {
    fn init(&mut self, ns_prefix: &str, ovs_dir: &str, ovs_schema: &str, soft_mem_cap: u64) -> Result<(), WorkerError> {
        info!(ns_prefix, ovs_dir, ovs_schema, soft_mem_cap, "worker initialized");
        Ok(())
    }

    fn destroy_hosts(&mut self) -> usize {
        let n = self.host_count;
        self.host_count = 0;
        info!(n, "destroyed hosts");
        n
    }

    fn get_edge_remote_mac(&mut self, interface: &str, ip: Ipv4Addr) -> Result<Mac, WorkerError> {
        warn!(interface, %ip, "no hardware discovery available; synthesizing remote MAC");
        self.mac_gen
            .next_one()
            .map_err(|()| WorkerError::RemoteMacUnresolved { interface: interface.to_string(), ip })
    }

    fn get_edge_local_mac(&mut self, interface: &str) -> Result<Mac, WorkerError> {
        self.mac_gen
            .next_one()
            .map_err(|()| WorkerError::LocalMacUnresolved(interface.to_string()))
    }

    fn add_root(&mut self, a: Ipv4Addr, b: Ipv4Addr) {
        info!(%a, %b, "root namespace installed");
    }

    fn add_edge_interface(&mut self, interface: &str) -> Port {
        let next = self.ports.len();
        #[allow(clippy::cast_possible_truncation)] // interface counts realistically fit u32
        let port = *self.ports.entry(interface.to_string()).or_insert(Port(next as u32));
        debug!(interface, ?port, "edge interface registered");
        port
    }

    fn add_edge_routes(&mut self, subnet: Ipv4Subnet, port: Port, local_mac: Mac, remote_mac: Mac) {
        debug!(%subnet, ?port, %local_mac, %remote_mac, "edge routes installed");
    }

    fn add_host(&mut self, id: NodeId, ip: Ipv4Addr, macs: &[Mac], meta: &NodeMeta) {
        self.host_count += 1;
        debug!(?id, %ip, n_macs = macs.len(), ?meta, "host instantiated");
    }

    fn add_link(&mut self, u: NodeId, v: NodeId, ip_u: Ipv4Addr, ip_v: Ipv4Addr, macs: &[Mac], meta: &LinkMeta) {
        debug!(?u, ?v, %ip_u, %ip_v, n_macs = macs.len(), ?meta, "link instantiated");
    }

    fn set_self_link(&mut self, id: NodeId, meta: &LinkMeta) {
        debug!(?id, ?meta, "self link registered");
    }

    fn add_client_routes(&mut self, id: NodeId, macs: &[Mac], subnet: Ipv4Subnet, port: Port) {
        debug!(?id, n_macs = macs.len(), %subnet, ?port, "client routes installed");
    }

    fn add_internal_routes(&mut self, u: NodeId, v: NodeId, ip_u: Ipv4Addr, ip_v: Ipv4Addr, src_subnet: Ipv4Subnet, dst_subnet: Ipv4Subnet) {
        debug!(?u, ?v, %ip_u, %ip_v, %src_subnet, %dst_subnet, "internal route hop installed");
    }

    fn ensure_system_scaling(&mut self, max_links: u64, nodes: u32, clients: u32) {
        info!(max_links, nodes, clients, "system scaling hint received");
    }

    fn cleanup(&mut self) {
        info!("worker cleanup complete");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_count_round_trips_through_destroy() {
        let mut worker = LoggingWorker::new();
        worker.add_host(NodeId(0), Ipv4Addr::new(10, 0, 0, 1), &[], &NodeMeta::default());
        worker.add_host(NodeId(1), Ipv4Addr::new(10, 0, 0, 2), &[], &NodeMeta::default());
        assert_eq!(worker.destroy_hosts(), 2);
        assert_eq!(worker.destroy_hosts(), 0);
    }

    #[test]
    fn same_interface_reuses_the_same_port() {
        let mut worker = LoggingWorker::new();
        let a = worker.add_edge_interface("eth0");
        let b = worker.add_edge_interface("eth1");
        let c = worker.add_edge_interface("eth0");
        assert_eq!(a, c);
        assert_ne!(a, b);
    }

    #[test]
    fn synthesized_macs_are_distinct() {
        let mut worker = LoggingWorker::new();
        let a = worker.get_edge_local_mac("eth0").unwrap();
        let b = worker.get_edge_remote_mac("eth0", Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_ne!(a, b);
    }
}
