// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use crate::planner::NodeId;

/// Errors reported while building a [`RoutePlanner`](crate::planner::RoutePlanner).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// `set_weight` was called after `plan()` finalized the graph.
    #[error("cannot set edge weight ({0:?}, {1:?}): planner is already finalized")]
    AlreadyPlanned(NodeId, NodeId),
    /// A negative edge weight was supplied.
    #[error("edge weight must be non-negative, got {0}")]
    NegativeWeight(f64),
}

/// No path exists between the requested pair of nodes.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("no path from {from:?} to {to:?}")]
pub struct Unreachable {
    /// The requested source node.
    pub from: NodeId,
    /// The requested destination node.
    pub to: NodeId,
}
