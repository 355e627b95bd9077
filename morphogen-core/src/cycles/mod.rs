//! Cycle Detection
//!
//! Finds every elementary cycle of a directed graph given as a node list and
//! a successor function. Used after each structural edit to check that every
//! feedback loop holds at least one predge.
//!
//! The search works on dense vertex numbers: the position of each id in the
//! `nodes` slice. Cycles are rooted at their lowest-positioned node, so a
//! caller passing ids in ascending order gets cycles starting at their
//! smallest id.

mod johnson;
mod tarjan;

use std::collections::HashMap;

use crate::graph::NodeId;

/// An elementary cycle: `nodes[i] -> nodes[i + 1]`, closing with
/// `nodes[k - 1] -> nodes[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    nodes: Vec<NodeId>,
}

impl Cycle {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// The cycle's edges in discovered order, ending with the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let k = self.nodes.len();
        (0..k).map(move |i| (self.nodes[i], self.nodes[(i + 1) % k]))
    }

    pub fn contains_edge(&self, src: NodeId, dst: NodeId) -> bool {
        self.edges().any(|edge| edge == (src, dst))
    }

    /// The closing edge `v(k-1) -> v0`.
    pub fn last_edge(&self) -> Option<(NodeId, NodeId)> {
        match (self.nodes.last(), self.nodes.first()) {
            (Some(last), Some(first)) => Some((*last, *first)),
            _ => None,
        }
    }
}

/// Every elementary cycle among `nodes`, following `successors`.
///
/// Successors not listed in `nodes` are ignored. Returns an empty list for
/// an empty or acyclic graph.
pub fn find_elementary_cycles<F, I>(nodes: &[NodeId], successors: F) -> Vec<Cycle>
where
    F: Fn(NodeId) -> I,
    I: IntoIterator<Item = NodeId>,
{
    let index: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let adjacency: Vec<Vec<usize>> = nodes
        .iter()
        .map(|id| {
            successors(*id)
                .into_iter()
                .filter_map(|w| index.get(&w).copied())
                .collect()
        })
        .collect();

    johnson::elementary_circuits(&adjacency)
        .into_iter()
        .map(|circuit| Cycle::new(circuit.into_iter().map(|v| nodes[v]).collect()))
        .collect()
}
