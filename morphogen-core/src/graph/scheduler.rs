//! Operation Scheduler
//!
//! The scheduler determines the order in which operations are applied each
//! tick. It ensures that every Normal input is computed earlier in the same
//! tick than the operation reading it.
//!
//! # Algorithm
//!
//! 1. Start with nothing computed.
//! 2. Seed the order with operations that need nothing from this tick:
//!    pure sources (no inputs, some outputs) and operations whose inputs
//!    are all predges or seeds. Inert operations (no inputs, no outputs)
//!    are dropped.
//! 3. Repeatedly scan the pending operations in id order, appending any
//!    whose Normal sources are all computed. Stop after a scan that adds
//!    nothing.
//!
//! Ties are broken by ascending node id. Whatever is still pending at the
//! end sits on a cycle without a predge; it is reported as stranded and left
//! out of the order.
//!
//! The computed set is local to each call, so sorting is a pure function of
//! the graph.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::model::DataflowGraph;
use super::node::NodeId;

/// Result of one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<NodeId>,
    stranded: Vec<NodeId>,
}

impl Schedule {
    /// Operations in evaluation order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Operations that could not be placed.
    pub fn stranded(&self) -> &[NodeId] {
        &self.stranded
    }

    pub fn is_complete(&self) -> bool {
        self.stranded.is_empty()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Order paired with display names, for the sorted operations list.
    pub fn labelled(&self, graph: &DataflowGraph) -> Vec<(NodeId, String)> {
        self.order
            .iter()
            .filter_map(|id| {
                graph
                    .node(*id)
                    .ok()
                    .map(|node| (*id, node.name().to_string()))
            })
            .collect()
    }
}

/// Compute the evaluation order of every operation in `graph`.
pub fn sort_operations(graph: &DataflowGraph) -> Schedule {
    let mut computed: HashSet<NodeId> = HashSet::new();
    let mut order = Vec::new();
    let mut pending = Vec::new();

    for id in graph.operation_ids() {
        let Ok(node) = graph.node(id) else {
            continue;
        };
        if node.is_isolated() {
            continue;
        }

        let blocked = graph.incoming_edges(id).any(|edge| edge.kind.is_blocking());
        if blocked {
            pending.push(id);
        } else {
            order.push(id);
            computed.insert(id);
        }
    }

    loop {
        let before = pending.len();
        pending.retain(|id| {
            let ready = graph
                .incoming_edges(*id)
                .filter(|edge| edge.kind.is_blocking())
                .all(|edge| computed.contains(&edge.src));
            if ready {
                order.push(*id);
                computed.insert(*id);
            }
            !ready
        });

        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    if !pending.is_empty() {
        warn!(stranded = ?pending, "operations on a cycle without predge left out of the order");
    }
    debug!(?order, "operations sorted");

    Schedule {
        order,
        stranded: pending,
    }
}
