// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The callback interface a [`GraphmlDriver`](crate::driver::GraphmlDriver)
//! emits parsed nodes and edges to.

/// The recognized `<data>` attributes of a `<node>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttrs {
    pub kind: Option<String>,
    pub packetloss: Option<f64>,
    pub bandwidth_up: Option<f64>,
    pub bandwidth_down: Option<f64>,
}

/// The recognized `<data>` attributes of an `<edge>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAttrs {
    pub latency: Option<f64>,
    pub packetloss: Option<f64>,
    pub jitter: Option<f64>,
    pub queue_len: Option<i64>,
}

/// Receives nodes and edges as a [`GraphmlDriver`](crate::driver::GraphmlDriver)
/// discovers them, in document order.
pub trait GraphSink {
    /// Called once a `<node>` element and its `<data>` children are fully parsed.
    fn node(&mut self, id: &str, attrs: NodeAttrs);
    /// Called once an `<edge>` element and its `<data>` children are fully parsed.
    fn edge(&mut self, source: &str, target: &str, attrs: EdgeAttrs);
}
