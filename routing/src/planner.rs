// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-source Dijkstra over a small weighted graph, precomputed once and
//! queried repeatedly for all-pairs shortest routes.

use crate::error::{PlanError, Unreachable};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

/// Identifies a node in the graph given to a [`RoutePlanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// A shortest path between two nodes: the node sequence (including both
/// endpoints, length ≥ 2 for any path returned by `route`) and its summed
/// edge weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// The nodes visited, in order from source to destination.
    pub nodes: Vec<NodeId>,
    /// The sum of edge weights along `nodes`.
    pub weight: f64,
}

/// An `f64` known to be finite and non-negative, so it can implement `Ord`
/// for use as a priority-queue key.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default, Clone)]
struct ShortestPathTree {
    dist: HashMap<NodeId, f64>,
    parent: HashMap<NodeId, NodeId>,
}

/// Builds a weighted graph incrementally, then precomputes all-pairs
/// shortest paths via per-source Dijkstra.
///
/// Edge weights may only be set before [`plan`](RoutePlanner::plan) is
/// called; afterwards the graph is frozen and [`route`](RoutePlanner::route)
/// answers queries against the precomputed trees.
#[derive(Debug, Default)]
pub struct RoutePlanner {
    nodes: HashSet<NodeId>,
    edges: HashMap<NodeId, Vec<(NodeId, f64)>>,
    planned: bool,
    trees: HashMap<NodeId, ShortestPathTree>,
}

impl RoutePlanner {
    /// A planner over an empty graph.
    #[must_use]
    pub fn new() -> Self {
        RoutePlanner::default()
    }

    /// Register a node with no edges yet, so it participates in planning
    /// even if it never appears in a `set_weight` call.
    pub fn add_node(&mut self, node: NodeId) {
        self.nodes.insert(node);
    }

    /// Set (or overwrite) the weight of the directed edge `u -> v`. Callers
    /// representing an undirected edge must call this twice, once for each
    /// direction.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::AlreadyPlanned`] if called after `plan()`, or
    /// [`PlanError::NegativeWeight`] if `w` is negative or not finite.
    pub fn set_weight(&mut self, u: NodeId, v: NodeId, w: f64) -> Result<(), PlanError> {
        if self.planned {
            return Err(PlanError::AlreadyPlanned(u, v));
        }
        if !(w.is_finite() && w >= 0.0) {
            return Err(PlanError::NegativeWeight(w));
        }
        self.nodes.insert(u);
        self.nodes.insert(v);
        let out = self.edges.entry(u).or_default();
        if let Some(existing) = out.iter_mut().find(|(to, _)| *to == v) {
            existing.1 = w;
        } else {
            out.push((v, w));
        }
        Ok(())
    }

    /// Finalize the graph and precompute all-pairs shortest paths.
    ///
    /// After this call, `set_weight` fails and `route` may be queried freely.
    #[instrument(skip(self))]
    pub fn plan(&mut self) {
        if self.planned {
            return;
        }
        for &source in &self.nodes {
            let tree = self.dijkstra_from(source);
            self.trees.insert(source, tree);
        }
        self.planned = true;
        debug!(nodes = self.nodes.len(), "route planning complete");
    }

    fn dijkstra_from(&self, source: NodeId) -> ShortestPathTree {
        let mut tree = ShortestPathTree::default();
        tree.dist.insert(source, 0.0);

        // Reverse + (Cost, NodeId) turns the max-heap `PriorityQueue` into a
        // min-heap on distance, with ties broken toward the lower node id.
        let mut queue: PriorityQueue<NodeId, Reverse<(Cost, NodeId)>> = PriorityQueue::new();
        queue.push(source, Reverse((Cost(0.0), source)));

        while let Some((u, Reverse((Cost(du), _)))) = queue.pop() {
            if du > *tree.dist.get(&u).unwrap_or(&f64::INFINITY) {
                continue;
            }
            let Some(neighbors) = self.edges.get(&u) else {
                continue;
            };
            for &(v, w) in neighbors {
                let candidate = du + w;
                let better = tree.dist.get(&v).is_none_or(|&best| candidate < best);
                if better {
                    tree.dist.insert(v, candidate);
                    tree.parent.insert(v, u);
                    queue.push(v, Reverse((Cost(candidate), v)));
                }
            }
        }
        tree
    }

    /// Look up the shortest path from `from` to `to`, precomputed by `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`Unreachable`] if no path exists (including when either node
    /// was never registered).
    ///
    /// # Panics
    ///
    /// Panics if `plan()` has not been called; doing so is a caller bug, not
    /// a recoverable condition.
    pub fn route(&self, from: NodeId, to: NodeId) -> Result<Path, Unreachable> {
        assert!(self.planned, "route() called before plan()");
        let unreachable = Unreachable { from, to };
        let tree = self.trees.get(&from).ok_or(unreachable)?;
        let weight = *tree.dist.get(&to).ok_or(unreachable)?;

        if from == to {
            return Ok(Path {
                nodes: vec![from, to],
                weight,
            });
        }

        let mut nodes = vec![to];
        let mut cursor = to;
        while cursor != from {
            let Some(&prev) = tree.parent.get(&cursor) else {
                warn!(?from, ?to, "shortest-path tree missing parent pointer for reachable node");
                return Err(unreachable);
            };
            nodes.push(prev);
            cursor = prev;
        }
        nodes.reverse();
        assert!(nodes.len() >= 2, "a distinct reachable pair must produce a path of length >= 2");
        Ok(Path { nodes, weight })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId(id)
    }

    #[test]
    fn shortest_path_matches_all_pairs_distance() {
        let mut planner = RoutePlanner::new();
        // A small graph where the direct edge is not the shortest path.
        planner.set_weight(n(1), n(2), 10.0).unwrap();
        planner.set_weight(n(2), n(1), 10.0).unwrap();
        planner.set_weight(n(1), n(3), 2.0).unwrap();
        planner.set_weight(n(3), n(1), 2.0).unwrap();
        planner.set_weight(n(3), n(2), 2.0).unwrap();
        planner.set_weight(n(2), n(3), 2.0).unwrap();
        planner.plan();

        let path = planner.route(n(1), n(2)).unwrap();
        assert_eq!(path.weight, 4.0);
        assert_eq!(path.nodes, vec![n(1), n(3), n(2)]);
    }

    #[test]
    fn scenario_f_disconnected_pair_is_unreachable() {
        let mut planner = RoutePlanner::new();
        planner.set_weight(n(1), n(2), 1.0).unwrap();
        planner.set_weight(n(2), n(1), 1.0).unwrap();
        planner.add_node(n(3));
        planner.plan();

        assert!(planner.route(n(1), n(2)).is_ok());
        assert!(planner.route(n(1), n(3)).is_err());
        assert!(planner.route(n(2), n(3)).is_err());
    }

    #[test]
    fn ties_are_broken_by_lower_node_id() {
        let mut planner = RoutePlanner::new();
        // Both 2 and 3 are one hop from 1 at equal cost; the tie-break rule
        // only affects pop order, not which distances are recorded, but this
        // exercises the tied-priority code path without panicking or looping.
        planner.set_weight(n(1), n(2), 1.0).unwrap();
        planner.set_weight(n(1), n(3), 1.0).unwrap();
        planner.set_weight(n(2), n(4), 1.0).unwrap();
        planner.set_weight(n(3), n(4), 1.0).unwrap();
        planner.plan();

        let path = planner.route(n(1), n(4)).unwrap();
        assert_eq!(path.weight, 2.0);
        assert_eq!(path.nodes.first(), Some(&n(1)));
        assert_eq!(path.nodes.last(), Some(&n(4)));
    }

    #[test]
    fn route_to_self_is_trivially_reachable() {
        let mut planner = RoutePlanner::new();
        planner.add_node(n(1));
        planner.plan();
        let path = planner.route(n(1), n(1)).unwrap();
        assert_eq!(path.weight, 0.0);
        assert_eq!(path.nodes, vec![n(1), n(1)]);
    }

    #[test]
    fn set_weight_after_plan_is_rejected() {
        let mut planner = RoutePlanner::new();
        planner.set_weight(n(1), n(2), 1.0).unwrap();
        planner.plan();
        assert!(matches!(planner.set_weight(n(2), n(3), 1.0), Err(PlanError::AlreadyPlanned(_, _))));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut planner = RoutePlanner::new();
        assert!(matches!(planner.set_weight(n(1), n(2), -1.0), Err(PlanError::NegativeWeight(_))));
    }
}
