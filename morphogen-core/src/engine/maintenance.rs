//! Predge maintenance.
//!
//! Every elementary cycle must hold at least one predge. After each
//! structural edit the engine re-runs cycle search and calls
//! [`repair_predges`]; demoting a predge back to Normal goes through
//! [`can_demote`].

use tracing::info;

use crate::cycles::Cycle;
use crate::error::Result;
use crate::graph::{DataflowGraph, EdgeKind, NodeId};

fn predge_count(graph: &DataflowGraph, cycle: &Cycle) -> usize {
    cycle
        .edges()
        .filter(|(src, dst)| {
            graph
                .edge(*src, *dst)
                .map(|edge| edge.kind == EdgeKind::Predge)
                .unwrap_or(false)
        })
        .count()
}

/// Give every predge-less cycle a predge on its closing edge.
///
/// Cycles are handled in order against the live graph, so a predge inserted
/// for one cycle also covers later cycles sharing that edge. Returns the
/// promoted edges.
pub(crate) fn repair_predges(
    graph: &mut DataflowGraph,
    cycles: &[Cycle],
) -> Result<Vec<(NodeId, NodeId)>> {
    let mut inserted = Vec::new();
    for cycle in cycles {
        if predge_count(graph, cycle) > 0 {
            continue;
        }
        let Some((src, dst)) = cycle.last_edge() else {
            continue;
        };
        graph.set_edge_kind(src, dst, EdgeKind::Predge)?;
        info!(%src, %dst, cycle = ?cycle.nodes(), "predge inserted");
        inserted.push((src, dst));
    }
    Ok(inserted)
}

/// Whether `src -> dst` may go back to Normal: every cycle through it must
/// keep another predge.
pub(crate) fn can_demote(
    graph: &DataflowGraph,
    cycles: &[Cycle],
    src: NodeId,
    dst: NodeId,
) -> bool {
    cycles
        .iter()
        .filter(|cycle| cycle.contains_edge(src, dst))
        .all(|cycle| predge_count(graph, cycle) >= 2)
}

/// Cycles with no predge at all.
pub(crate) fn unprotected<'a>(graph: &DataflowGraph, cycles: &'a [Cycle]) -> Vec<&'a Cycle> {
    cycles
        .iter()
        .filter(|cycle| predge_count(graph, cycle) == 0)
        .collect()
}
