//! Engine
//!
//! The engine owns the dataflow graph and keeps its derived state current:
//! the cycle list and the evaluation order.
//!
//! # Maintenance Protocol
//!
//! | Edit                                   | Cycle search | Predge repair | Scheduler |
//! |----------------------------------------|--------------|---------------|-----------|
//! | connect, disconnect, remove, paste     | yes          | yes           | yes       |
//! | edge kind change, operation swap       | no           | no            | yes       |
//! | blend factor, enable, mark             | no           | no            | no        |
//!
//! Everything runs synchronously on the caller's thread, between ticks, so
//! the next [`Engine::iterate`] always sees a consistent order.

mod driver;
mod events;
mod maintenance;

pub use driver::{run, Edit, LoopState};
pub use events::{EngineEvent, Subscriber, SubscriberId};

use std::collections::HashMap;

use tracing::debug;

use self::events::Subscribers;
use crate::collab::{Operation, Seed};
use crate::config::EngineConfig;
use crate::cycles::Cycle;
use crate::error::{GraphError, Result};
use crate::graph::{
    sort_operations, DataflowGraph, Edge, EdgeKind, NodeId, Role, Schedule, SeedKind,
};
use crate::snapshot::{ClipPayload, ClipNode, Clipboard};

/// The operation graph together with its cycles and evaluation order.
pub struct Engine {
    graph: DataflowGraph,
    config: EngineConfig,
    schedule: Schedule,
    cycles: Vec<Cycle>,
    subscribers: Subscribers,
    ticks: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            graph: DataflowGraph::new(),
            config,
            schedule: Schedule::default(),
            cycles: Vec::new(),
            subscribers: Subscribers::default(),
            ticks: 0,
        }
    }

    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The latest scheduler result.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Operations in evaluation order.
    pub fn order(&self) -> &[NodeId] {
        self.schedule.order()
    }

    /// Cycles found by the latest cycle search.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Cycles passing through `id`, for highlighting.
    pub fn cycles_through(&self, id: NodeId) -> Vec<&Cycle> {
        self.cycles
            .iter()
            .filter(|cycle| cycle.contains_node(id))
            .collect()
    }

    /// Cycles currently without any predge. Empty unless auto repair is off.
    pub fn unprotected_cycles(&self) -> Vec<&Cycle> {
        maintenance::unprotected(&self.graph, &self.cycles)
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn subscribe<F>(&mut self, notify: F) -> SubscriberId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.subscribers.add(Subscriber::new(notify))
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Add an operation with no inputs or outputs. Inert until connected.
    pub fn add_operation_node(
        &mut self,
        name: impl Into<String>,
        operation: Box<dyn Operation>,
    ) -> NodeId {
        self.graph.add_operation(name, operation)
    }

    pub fn add_seed_node(
        &mut self,
        name: impl Into<String>,
        kind: SeedKind,
        seed: Box<dyn Seed>,
    ) -> NodeId {
        self.graph.add_seed(name, kind, seed)
    }

    /// Connect `src` to the operation `dst`.
    ///
    /// `blend_factor` defaults to the configured value. Returns the kind the
    /// edge ended up with, which is Predge if the edge closed a cycle and
    /// was picked by the repair.
    pub fn connect(
        &mut self,
        src: NodeId,
        dst: NodeId,
        blend_factor: Option<f32>,
    ) -> Result<EdgeKind> {
        let blend_factor = blend_factor.unwrap_or(self.config.default_blend_factor);
        self.graph.connect(src, dst, blend_factor)?;
        if self.config.equalize_on_connect {
            self.graph.equalize_blend_factors(dst)?;
        }
        self.after_topology_change()?;
        Ok(self.graph.edge(src, dst)?.kind)
    }

    pub fn disconnect(&mut self, src: NodeId, dst: NodeId) -> Result<Edge> {
        let edge = self.graph.disconnect(src, dst)?;
        self.after_topology_change()?;
        Ok(edge)
    }

    /// Switch an edge between Normal and Predge.
    ///
    /// Demoting a predge is refused while a cycle through it has no other
    /// predge.
    pub fn set_edge_kind(&mut self, src: NodeId, dst: NodeId, kind: EdgeKind) -> Result<()> {
        let current = self.graph.edge(src, dst)?.kind;
        if current == EdgeKind::Predge
            && kind == EdgeKind::Normal
            && !maintenance::can_demote(&self.graph, &self.cycles, src, dst)
        {
            debug!(%src, %dst, "rejected predge demotion");
            return Err(GraphError::PredgeRequired { src, dst });
        }

        if self.graph.set_edge_kind(src, dst, kind)? {
            self.sort_operations();
        }
        Ok(())
    }

    /// Whether the predge `src -> dst` could be turned back into Normal.
    pub fn can_demote_predge(&self, src: NodeId, dst: NodeId) -> Result<bool> {
        let edge = self.graph.edge(src, dst)?;
        Ok(edge.kind == EdgeKind::Predge
            && maintenance::can_demote(&self.graph, &self.cycles, src, dst))
    }

    /// Remove a node and all its edges, then re-derive cycles and order once.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.graph.remove_node(id)?;
        self.after_topology_change()
    }

    pub fn set_blend_factor(&mut self, src: NodeId, dst: NodeId, value: f32) -> Result<()> {
        self.graph.set_blend_factor(src, dst, value)
    }

    pub fn equalize_blend_factors(&mut self, dst: NodeId) -> Result<usize> {
        self.graph.equalize_blend_factors(dst)
    }

    /// Replace the operation behind `id`, keeping its edges.
    pub fn swap_operation(
        &mut self,
        id: NodeId,
        operation: Box<dyn Operation>,
    ) -> Result<Box<dyn Operation>> {
        let old = self.graph.replace_operation(id, operation)?;
        self.sort_operations();
        Ok(old)
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.graph.set_enabled(id, enabled)
    }

    pub fn set_marked(&mut self, id: NodeId, marked: bool) -> Result<()> {
        self.graph.set_marked(id, marked)
    }

    /// Rename a node. The sorted operations list is re-emitted.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.graph.rename(id, name)?;
        self.sort_operations();
        Ok(())
    }

    /// Deep-copy the given nodes and the edges between them.
    pub fn copy(&self, ids: &[NodeId]) -> Result<Clipboard> {
        let mut nodes: Vec<ClipNode> = Vec::new();
        for id in ids {
            if nodes.iter().any(|node| node.id == *id) {
                continue;
            }
            let node = self.graph.node(*id)?;
            let payload = match node.role() {
                Role::Operation(data) => ClipPayload::Operation {
                    operation: data.operation().clone_box(),
                    enabled: data.is_enabled(),
                },
                Role::Seed(data) => ClipPayload::Seed {
                    kind: data.kind(),
                    seed: data.seed().clone_box(),
                },
            };
            nodes.push(ClipNode {
                id: *id,
                name: node.name().to_string(),
                payload,
            });
        }

        let edges = self
            .graph
            .edges()
            .filter(|edge| {
                let copied = |id: NodeId| nodes.iter().any(|node| node.id == id);
                copied(edge.src) && copied(edge.dst)
            })
            .copied()
            .collect();

        Ok(Clipboard { nodes, edges })
    }

    /// Insert a copy of the clipboard with fresh ids.
    ///
    /// Returns the new ids in clipboard order. Cycle search, repair and
    /// scheduling run once for the whole paste.
    pub fn paste(&mut self, clipboard: &Clipboard) -> Result<Vec<NodeId>> {
        let mut mapping = HashMap::new();
        let mut created = Vec::with_capacity(clipboard.nodes.len());

        for node in &clipboard.nodes {
            let id = match &node.payload {
                ClipPayload::Operation { operation, enabled } => {
                    let id = self.graph.add_operation(node.name.clone(), operation.clone_box());
                    self.graph.set_enabled(id, *enabled)?;
                    id
                }
                ClipPayload::Seed { kind, seed } => {
                    self.graph.add_seed(node.name.clone(), *kind, seed.clone_box())
                }
            };
            mapping.insert(node.id, id);
            created.push(id);
        }

        for edge in &clipboard.edges {
            let (Some(src), Some(dst)) = (mapping.get(&edge.src), mapping.get(&edge.dst)) else {
                continue;
            };
            self.connect_loaded(*src, *dst, edge.kind, edge.blend_factor)?;
        }

        self.after_topology_change()?;
        Ok(created)
    }

    /// First loading phase: add an operation under its saved id.
    pub fn load_operation(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        operation: Box<dyn Operation>,
    ) -> Result<()> {
        self.graph.insert_operation(id, name, operation)
    }

    /// First loading phase: add a seed under its saved id.
    pub fn load_seed(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        kind: SeedKind,
        seed: Box<dyn Seed>,
    ) -> Result<()> {
        self.graph.insert_seed(id, name, kind, seed)
    }

    /// Second loading phase: restore an edge with its saved kind.
    ///
    /// Nothing is re-derived; call [`Engine::finish_loading`] once all
    /// edges are in.
    pub fn connect_loaded(
        &mut self,
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
        blend_factor: f32,
    ) -> Result<()> {
        let actual = self.graph.connect(src, dst, blend_factor)?;
        if kind == EdgeKind::Predge && actual == EdgeKind::Normal {
            self.graph.set_edge_kind(src, dst, EdgeKind::Predge)?;
        }
        Ok(())
    }

    /// Derive cycles and order after a two-phase load.
    pub fn finish_loading(&mut self) -> Result<()> {
        self.after_topology_change()
    }

    /// Re-run the scheduler and notify subscribers.
    pub fn sort_operations(&mut self) -> &Schedule {
        self.schedule = sort_operations(&self.graph);
        let labelled = self.schedule.labelled(&self.graph);
        self.subscribers.emit(EngineEvent::SortedOperationsChanged(labelled));
        if !self.schedule.is_complete() {
            self.subscribers
                .emit(EngineEvent::StrandedOperations(self.schedule.stranded().to_vec()));
        }
        &self.schedule
    }

    fn after_topology_change(&mut self) -> Result<()> {
        self.cycles = self.graph.find_cycles();
        self.subscribers.emit(EngineEvent::CyclesChanged(self.cycles.clone()));

        if self.config.auto_repair_predges {
            let inserted = maintenance::repair_predges(&mut self.graph, &self.cycles)?;
            for (src, dst) in inserted {
                self.subscribers.emit(EngineEvent::PredgeInserted { src, dst });
            }
        }

        self.sort_operations();
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
