//! Dataflow Graph
//!
//! Owns the canonical node and edge sets. Nodes and edges live in arenas
//! keyed by id; cross references are ids, never pointers.
//!
//! Every mutation that touches an edge regenerates the destination's
//! input mirror (and pushes it to the operation) before returning, so the
//! mirror always matches the incoming edges 1:1. Re-running cycle search and
//! the scheduler is the caller's job; see [`crate::engine::Engine`].

use indexmap::IndexMap;
use tracing::{debug, info};

use super::edge::{valid_blend_factor, Edge, EdgeKind, InputData};
use super::node::{Node, NodeId, NodeKind, OperationData, SeedKind};
use crate::collab::{Operation, Seed};
use crate::cycles::{find_elementary_cycles, Cycle};
use crate::error::{GraphError, Result};

/// Largest id a caller may pick. Fresh ids are allocated above every
/// reserved one, so the upper half of the id space stays free for them.
const MAX_RESERVED_ID: u64 = u64::MAX >> 1;

/// Nodes, edges and the per-operation input mirrors.
#[derive(Debug, Default)]
pub struct DataflowGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<(NodeId, NodeId), Edge>,
    next_id: u64,
}

impl DataflowGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::from(self.next_id);
        self.next_id += 1;
        id
    }

    fn reserve_id(&mut self, id: NodeId) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let next = id
            .raw()
            .checked_add(1)
            .filter(|_| id.raw() <= MAX_RESERVED_ID)
            .ok_or(GraphError::NodeIdOutOfRange(id))?;
        self.next_id = self.next_id.max(next);
        Ok(())
    }

    /// Add an operation with no inputs and no outputs.
    pub fn add_operation(
        &mut self,
        name: impl Into<String>,
        operation: Box<dyn Operation>,
    ) -> NodeId {
        let id = self.allocate_id();
        self.insert_node(Node::operation(id, name.into(), operation));
        id
    }

    /// Add a seed.
    pub fn add_seed(
        &mut self,
        name: impl Into<String>,
        kind: SeedKind,
        seed: Box<dyn Seed>,
    ) -> NodeId {
        let id = self.allocate_id();
        self.insert_node(Node::seed(id, name.into(), kind, seed));
        id
    }

    /// Add an operation under a caller-chosen id (used when restoring).
    pub fn insert_operation(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        operation: Box<dyn Operation>,
    ) -> Result<()> {
        self.reserve_id(id)?;
        self.insert_node(Node::operation(id, name.into(), operation));
        Ok(())
    }

    /// Add a seed under a caller-chosen id (used when restoring).
    pub fn insert_seed(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        kind: SeedKind,
        seed: Box<dyn Seed>,
    ) -> Result<()> {
        self.reserve_id(id)?;
        self.insert_node(Node::seed(id, name.into(), kind, seed));
        Ok(())
    }

    fn insert_node(&mut self, node: Node) {
        info!(id = %node.id(), name = node.name(), kind = ?node.kind(), "node added");
        self.nodes.insert(node.id(), node);
    }

    /// Get a reference to a node.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn operation_data_mut(&mut self, id: NodeId) -> Result<&mut OperationData> {
        self.node_mut(id)?
            .as_operation_mut()
            .ok_or(GraphError::NotAnOperation(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// All node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Operation node ids, ascending.
    pub fn operation_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_operation())
            .map(Node::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges, in connection order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge(&self, src: NodeId, dst: NodeId) -> Result<&Edge> {
        self.edges
            .get(&(src, dst))
            .ok_or(GraphError::EdgeNotFound { src, dst })
    }

    pub fn has_edge(&self, src: NodeId, dst: NodeId) -> bool {
        self.edges.contains_key(&(src, dst))
    }

    /// Edges entering `dst`, in the order their sources were connected.
    pub fn incoming_edges(&self, dst: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes
            .get(&dst)
            .map(Node::dependencies)
            .unwrap_or_default()
            .iter()
            .filter_map(move |src| self.edges.get(&(*src, dst)))
    }

    /// Edges leaving `src`.
    pub fn outgoing_edges(&self, src: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes
            .get(&src)
            .map(Node::dependents)
            .unwrap_or_default()
            .iter()
            .filter_map(move |dst| self.edges.get(&(src, *dst)))
    }

    /// Connect `src` to the operation `dst`.
    ///
    /// The edge is Normal, or Seed when `src` is a seed. Returns the kind.
    pub fn connect(&mut self, src: NodeId, dst: NodeId, blend_factor: f32) -> Result<EdgeKind> {
        if !valid_blend_factor(blend_factor) {
            return Err(GraphError::BlendFactorOutOfRange(blend_factor));
        }
        let kind = match self.node(src)?.kind() {
            NodeKind::Seed => EdgeKind::Seed,
            NodeKind::Operation => EdgeKind::Normal,
        };
        if self.node(dst)?.kind() == NodeKind::Seed {
            debug!(%src, %dst, "rejected connect: seed destination");
            return Err(GraphError::SeedDestination(dst));
        }
        if self.has_edge(src, dst) {
            debug!(%src, %dst, "rejected connect: edge exists");
            return Err(GraphError::EdgeExists { src, dst });
        }

        self.edges.insert(
            (src, dst),
            Edge {
                src,
                dst,
                kind,
                blend_factor,
            },
        );
        self.node_mut(src)?.add_dependent(dst);
        self.node_mut(dst)?.add_dependency(src);
        self.sync_inputs(dst);

        info!(%src, %dst, ?kind, "edge connected");
        Ok(kind)
    }

    /// Remove the edge `src -> dst` and its input mirror entry.
    pub fn disconnect(&mut self, src: NodeId, dst: NodeId) -> Result<Edge> {
        let edge = self
            .edges
            .shift_remove(&(src, dst))
            .ok_or(GraphError::EdgeNotFound { src, dst })?;

        if let Some(node) = self.nodes.get_mut(&src) {
            node.remove_dependent(dst);
        }
        if let Some(node) = self.nodes.get_mut(&dst) {
            node.remove_dependency(src);
        }
        self.sync_inputs(dst);
        if edge.kind == EdgeKind::Predge {
            self.sync_blit(src);
        }

        info!(%src, %dst, "edge disconnected");
        Ok(edge)
    }

    /// Switch an edge between Normal and Predge.
    ///
    /// Seed edges keep their kind. Returns whether anything changed.
    pub fn set_edge_kind(&mut self, src: NodeId, dst: NodeId, kind: EdgeKind) -> Result<bool> {
        let edge = self
            .edges
            .get_mut(&(src, dst))
            .ok_or(GraphError::EdgeNotFound { src, dst })?;

        if edge.kind == kind {
            return Ok(false);
        }
        if edge.kind == EdgeKind::Seed || kind == EdgeKind::Seed {
            return Err(GraphError::InvalidEdgeKind { src, dst, kind });
        }

        edge.kind = kind;
        self.sync_inputs(dst);
        self.sync_blit(src);

        debug!(%src, %dst, ?kind, "edge kind changed");
        Ok(true)
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let node = self.node(id)?;
        let incoming: Vec<NodeId> = node.dependencies().to_vec();
        let outgoing: Vec<NodeId> = node
            .dependents()
            .iter()
            .copied()
            .filter(|dst| *dst != id)
            .collect();

        for src in incoming {
            self.disconnect(src, id)?;
        }
        for dst in outgoing {
            self.disconnect(id, dst)?;
        }

        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        info!(%id, name = node.name(), "node removed");
        Ok(node)
    }

    pub fn set_blend_factor(&mut self, src: NodeId, dst: NodeId, value: f32) -> Result<()> {
        if !valid_blend_factor(value) {
            return Err(GraphError::BlendFactorOutOfRange(value));
        }
        let edge = self
            .edges
            .get_mut(&(src, dst))
            .ok_or(GraphError::EdgeNotFound { src, dst })?;
        edge.blend_factor = value;
        self.sync_inputs(dst);
        Ok(())
    }

    /// Set every incoming blend factor of `dst` to `1 / N`.
    ///
    /// Returns `N`; a destination without inputs is left untouched.
    pub fn equalize_blend_factors(&mut self, dst: NodeId) -> Result<usize> {
        let sources: Vec<NodeId> = self.node(dst)?.dependencies().to_vec();
        if sources.is_empty() {
            return Ok(0);
        }

        let factor = 1.0 / sources.len() as f32;
        for src in &sources {
            if let Some(edge) = self.edges.get_mut(&(*src, dst)) {
                edge.blend_factor = factor;
            }
        }
        self.sync_inputs(dst);
        Ok(sources.len())
    }

    /// Swap the collaborator of an operation node, keeping its edges.
    ///
    /// The new operation receives the current inputs and blit state, and
    /// every consumer is rebound to its buffers. Returns the old operation.
    pub fn replace_operation(
        &mut self,
        id: NodeId,
        operation: Box<dyn Operation>,
    ) -> Result<Box<dyn Operation>> {
        let data = self.operation_data_mut(id)?;
        let old = std::mem::replace(&mut data.operation, operation);

        let inputs: Vec<InputData> = data.inputs.values().copied().collect();
        let blit_enabled = data.blit_enabled;
        data.operation.enable_blit(blit_enabled);
        data.operation.set_input_data(&inputs);

        let consumers: Vec<NodeId> = self.node(id)?.dependents().to_vec();
        for dst in consumers {
            self.sync_inputs(dst);
        }

        info!(%id, "operation swapped");
        Ok(old)
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.operation_data_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn set_marked(&mut self, id: NodeId, marked: bool) -> Result<()> {
        self.node_mut(id)?.set_marked(marked);
        Ok(())
    }

    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.set_name(name.into());
        Ok(())
    }

    /// Regenerate the input mirror of `dst` from its incoming edges and the
    /// sources' current buffers.
    ///
    /// The operation is only notified when the mirror changed. Returns
    /// whether it did.
    pub(crate) fn sync_inputs(&mut self, dst: NodeId) -> bool {
        let inputs: IndexMap<NodeId, InputData> = self
            .incoming_edges(dst)
            .filter_map(|edge| {
                let source = self.nodes.get(&edge.src)?;
                let buffer = match edge.kind {
                    EdgeKind::Predge => source.blit_buffer(),
                    EdgeKind::Normal | EdgeKind::Seed => source.output_buffer(),
                };
                Some((
                    edge.src,
                    InputData {
                        source: edge.src,
                        kind: edge.kind,
                        buffer,
                        blend_factor: edge.blend_factor,
                    },
                ))
            })
            .collect();

        let Some(data) = self.nodes.get_mut(&dst).and_then(Node::as_operation_mut) else {
            return false;
        };
        if data.inputs == inputs {
            return false;
        }

        data.inputs = inputs;
        let list: Vec<InputData> = data.inputs.values().copied().collect();
        data.operation.set_input_data(&list);
        true
    }

    /// Keep `src`'s blit flag equal to "has an outgoing predge".
    pub(crate) fn sync_blit(&mut self, src: NodeId) {
        let wanted = self
            .outgoing_edges(src)
            .any(|edge| edge.kind == EdgeKind::Predge);

        let Some(data) = self.nodes.get_mut(&src).and_then(Node::as_operation_mut) else {
            return;
        };
        if data.blit_enabled == wanted {
            return;
        }
        data.blit_enabled = wanted;
        data.operation.enable_blit(wanted);

        let consumers: Vec<NodeId> = self
            .nodes
            .get(&src)
            .map(|node| node.dependents().to_vec())
            .unwrap_or_default();
        for dst in consumers {
            self.sync_inputs(dst);
        }
    }

    /// Every elementary cycle of the current edge set, rooted at its
    /// lowest node id.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        let ids = self.node_ids();
        find_elementary_cycles(&ids, |id| {
            self.nodes
                .get(&id)
                .map(|node| node.dependents().to_vec())
                .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::BufferRef;
    use crate::testing::{MockOperation, MockSeed};

    fn op(graph: &mut DataflowGraph, buffer: u32) -> NodeId {
        graph.add_operation(format!("op{buffer}"), MockOperation::boxed(buffer))
    }

    fn mirror(graph: &DataflowGraph, id: NodeId) -> impl Iterator<Item = InputData> + '_ {
        graph.node(id).unwrap().as_operation().unwrap().inputs().copied()
    }

    #[test]
    fn add_and_remove_nodes() {
        let mut graph = DataflowGraph::new();
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);

        assert_eq!(graph.node_count(), 2);
        assert!(a < b);

        graph.remove_node(a).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert!(matches!(graph.node(a), Err(GraphError::NodeNotFound(id)) if id == a));
        assert!(graph.node(b).is_ok());
    }

    #[test]
    fn connect_builds_input_mirror() {
        let mut graph = DataflowGraph::new();
        let seed = graph.add_seed("noise", SeedKind::RandomColor, MockSeed::boxed(5));
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);

        assert_eq!(graph.connect(seed, a, 1.0).unwrap(), EdgeKind::Seed);
        assert_eq!(graph.connect(a, b, 0.5).unwrap(), EdgeKind::Normal);

        let inputs: Vec<_> = mirror(&graph, b).collect();
        assert_eq!(
            inputs,
            vec![InputData {
                source: a,
                kind: EdgeKind::Normal,
                buffer: BufferRef(1),
                blend_factor: 0.5,
            }]
        );
        let seed_input = mirror(&graph, a).next().unwrap();
        assert_eq!(seed_input.kind, EdgeKind::Seed);
        assert_eq!(seed_input.buffer, BufferRef(5));
    }

    #[test]
    fn connect_rejects_invalid_requests() {
        let mut graph = DataflowGraph::new();
        let seed = graph.add_seed("img", SeedKind::Image, MockSeed::boxed(5));
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);
        graph.connect(a, b, 1.0).unwrap();

        assert!(matches!(graph.connect(a, b, 1.0), Err(GraphError::EdgeExists { .. })));
        assert!(matches!(
            graph.connect(a, seed, 1.0),
            Err(GraphError::SeedDestination(id)) if id == seed
        ));
        assert!(matches!(graph.connect(b, a, 1.5), Err(GraphError::BlendFactorOutOfRange(_))));
        assert!(matches!(
            graph.connect(NodeId::from(99), a, 1.0),
            Err(GraphError::NodeNotFound(_))
        ));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn predge_rebinds_to_blit_buffer_and_enables_blit() {
        let mut graph = DataflowGraph::new();
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);
        graph.connect(a, b, 1.0).unwrap();

        assert!(graph.set_edge_kind(a, b, EdgeKind::Predge).unwrap());
        let input = mirror(&graph, b).next().unwrap();
        assert_eq!(input.kind, EdgeKind::Predge);
        assert_eq!(input.buffer, MockOperation::blit_of(1));
        assert!(graph.node(a).unwrap().as_operation().unwrap().is_blit_enabled());

        assert!(graph.set_edge_kind(a, b, EdgeKind::Normal).unwrap());
        assert!(!graph.node(a).unwrap().as_operation().unwrap().is_blit_enabled());
        assert!(!graph.set_edge_kind(a, b, EdgeKind::Normal).unwrap());
    }

    #[test]
    fn seed_edges_keep_their_kind() {
        let mut graph = DataflowGraph::new();
        let seed = graph.add_seed("noise", SeedKind::RandomGrayscale, MockSeed::boxed(5));
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);
        graph.connect(seed, a, 1.0).unwrap();
        graph.connect(a, b, 1.0).unwrap();

        assert!(matches!(
            graph.set_edge_kind(seed, a, EdgeKind::Predge),
            Err(GraphError::InvalidEdgeKind { .. })
        ));
        assert!(matches!(
            graph.set_edge_kind(a, b, EdgeKind::Seed),
            Err(GraphError::InvalidEdgeKind { .. })
        ));
    }

    #[test]
    fn remove_node_drops_touching_edges() {
        let mut graph = DataflowGraph::new();
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);
        let c = op(&mut graph, 3);
        graph.connect(a, b, 1.0).unwrap();
        graph.connect(b, c, 1.0).unwrap();
        graph.connect(c, b, 1.0).unwrap();
        graph.connect(b, b, 1.0).unwrap();

        graph.remove_node(b).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node(a).unwrap().is_isolated());
        assert!(graph.node(c).unwrap().is_isolated());
        assert_eq!(graph.node(c).unwrap().as_operation().unwrap().inputs().count(), 0);
    }

    #[test]
    fn equalize_blend_factors_sums_to_one() {
        let mut graph = DataflowGraph::new();
        let sources: Vec<NodeId> = (1..=3).map(|i| op(&mut graph, i)).collect();
        let dst = op(&mut graph, 10);
        for src in &sources {
            graph.connect(*src, dst, 1.0).unwrap();
        }

        assert_eq!(graph.equalize_blend_factors(dst).unwrap(), 3);
        let sum: f32 = graph.incoming_edges(dst).map(|e| e.blend_factor).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for input in graph.node(dst).unwrap().as_operation().unwrap().inputs() {
            assert!((input.blend_factor - 1.0 / 3.0).abs() < 1e-6);
        }

        assert_eq!(graph.equalize_blend_factors(sources[0]).unwrap(), 0);
    }

    #[test]
    fn replace_operation_rebinds_consumers() {
        let mut graph = DataflowGraph::new();
        let a = op(&mut graph, 1);
        let b = op(&mut graph, 2);
        graph.connect(a, b, 1.0).unwrap();

        let old = graph.replace_operation(a, MockOperation::boxed(7)).unwrap();
        assert_eq!(old.output_buffer(), BufferRef(1));
        let input = mirror(&graph, b).next().unwrap();
        assert_eq!(input.buffer, BufferRef(7));
    }

    #[test]
    fn restored_ids_advance_allocation() {
        let mut graph = DataflowGraph::new();
        graph.insert_operation(NodeId::from(5), "x", MockOperation::boxed(1)).unwrap();
        assert!(matches!(
            graph.insert_operation(NodeId::from(5), "y", MockOperation::boxed(2)),
            Err(GraphError::DuplicateNode(_))
        ));
        let next = op(&mut graph, 3);
        assert_eq!(next, NodeId::from(6));
    }

    #[test]
    fn reserved_ids_leave_room_for_allocation() {
        let mut graph = DataflowGraph::new();
        assert!(matches!(
            graph.insert_operation(NodeId::from(u64::MAX), "x", MockOperation::boxed(1)),
            Err(GraphError::NodeIdOutOfRange(_))
        ));
        assert_eq!(graph.node_count(), 0);

        graph
            .insert_operation(NodeId::from(MAX_RESERVED_ID), "y", MockOperation::boxed(2))
            .unwrap();
        assert_eq!(op(&mut graph, 3), NodeId::from(MAX_RESERVED_ID + 1));
    }
}
