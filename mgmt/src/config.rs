// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The deserialized shape of the setup configuration file.

use net::ipv4::Ipv4Subnet;
use std::net::Ipv4Addr;

/// The fully-deserialized configuration file, loaded via `serde_yaml_ng`
/// before the orchestrator ever runs. [`crate::orchestrator::OrchestratorConfig`]
/// and [`crate::orchestrator::EdgeNode`] are derived from this after phase 1
/// validation.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SetupConfig {
    pub ns_prefix: String,
    pub ovs_dir: String,
    pub ovs_schema: String,
    pub soft_mem_cap: u64,
    pub edge_nodes: Vec<EdgeNodeInput>,
    #[serde(default)]
    pub edge_node_defaults: EdgeNodeDefaults,
    /// A filesystem path, or the literal `"-"` to read the topology from stdin.
    pub src_file: String,
    pub graphml: GraphMlOptions,
}

impl SetupConfig {
    /// True if `src_file` names stdin rather than a real path.
    #[must_use]
    pub fn reads_from_stdin(&self) -> bool {
        self.src_file == "-"
    }
}

/// One `edge_nodes[]` entry, before interface/subnet defaulting.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EdgeNodeInput {
    pub ip: Ipv4Addr,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub mac: Option<net::eth::mac::Mac>,
    #[serde(default)]
    pub virtual_subnet: Option<Ipv4Subnet>,
}

/// Defaults applied to edge nodes that omit a field.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct EdgeNodeDefaults {
    pub interface: Option<String>,
    pub global_virtual_subnet: Option<Ipv4Subnet>,
}

/// GraphML ingest options from component 4.I.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GraphMlOptions {
    #[serde(default)]
    pub two_pass: bool,
    #[serde(default)]
    pub client_type: Option<String>,
    #[serde(default = "default_weight_key")]
    pub weight_key: String,
}

fn default_weight_key() -> String {
    "latency".to_string()
}
