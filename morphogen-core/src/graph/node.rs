//! Graph Nodes
//!
//! This module defines the node types that live in the dataflow graph.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::edge::InputData;
use crate::collab::{BufferRef, Operation, Seed};

/// Unique identifier for a node in the dataflow graph.
///
/// Ids are allocated by the owning graph in increasing order, which makes
/// them usable as a deterministic tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// An image transformation. May receive edges.
    Operation,

    /// An image source. Only has outgoing edges.
    Seed,
}

/// What a seed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedKind {
    RandomColor,
    RandomGrayscale,
    Image,
}

/// Payload of an operation node.
pub struct OperationData {
    pub(crate) operation: Box<dyn Operation>,

    /// Disabled operations keep their place in the order but are not applied.
    pub(crate) enabled: bool,

    /// True iff at least one outgoing edge is a predge.
    pub(crate) blit_enabled: bool,

    /// Mirror of the incoming edges, keyed by source node.
    pub(crate) inputs: IndexMap<NodeId, InputData>,
}

impl OperationData {
    /// Takes ownership of `operation` and switches its blit off, matching
    /// a node with no outgoing edges.
    pub(crate) fn new(mut operation: Box<dyn Operation>) -> Self {
        operation.enable_blit(false);
        Self {
            operation,
            enabled: true,
            blit_enabled: false,
            inputs: IndexMap::new(),
        }
    }

    pub fn operation(&self) -> &dyn Operation {
        self.operation.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_blit_enabled(&self) -> bool {
        self.blit_enabled
    }

    /// The current input mirror, in edge insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = &InputData> {
        self.inputs.values()
    }
}

impl fmt::Debug for OperationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationData")
            .field("kind", &self.operation.kind_name())
            .field("enabled", &self.enabled)
            .field("blit_enabled", &self.blit_enabled)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Payload of a seed node.
pub struct SeedData {
    pub(crate) seed: Box<dyn Seed>,
    pub(crate) kind: SeedKind,
}

impl SeedData {
    pub fn kind(&self) -> SeedKind {
        self.kind
    }

    pub fn seed(&self) -> &dyn Seed {
        self.seed.as_ref()
    }
}

impl fmt::Debug for SeedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedData")
            .field("kind", &self.kind)
            .field("fixed", &self.seed.is_fixed())
            .finish()
    }
}

/// Operation or seed payload.
#[derive(Debug)]
pub enum Role {
    Operation(OperationData),
    Seed(SeedData),
}

/// A node in the dataflow graph.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Display name shown in the sorted operations list.
    name: String,

    /// UI highlight flag.
    marked: bool,

    /// Nodes feeding this node (sources of incoming edges).
    dependencies: SmallVec<[NodeId; 4]>,

    /// Nodes this node feeds (destinations of outgoing edges).
    dependents: SmallVec<[NodeId; 4]>,

    role: Role,
}

impl Node {
    pub(crate) fn operation(id: NodeId, name: String, operation: Box<dyn Operation>) -> Self {
        Self::new(id, name, Role::Operation(OperationData::new(operation)))
    }

    pub(crate) fn seed(id: NodeId, name: String, kind: SeedKind, seed: Box<dyn Seed>) -> Self {
        Self::new(id, name, Role::Seed(SeedData { seed, kind }))
    }

    fn new(id: NodeId, name: String, role: Role) -> Self {
        Self {
            id,
            name,
            marked: false,
            dependencies: SmallVec::new(),
            dependents: SmallVec::new(),
            role,
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub(crate) fn set_marked(&mut self, marked: bool) {
        self.marked = marked;
    }

    /// Get the node's kind.
    pub fn kind(&self) -> NodeKind {
        match self.role {
            Role::Operation(_) => NodeKind::Operation,
            Role::Seed(_) => NodeKind::Seed,
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_operation(&self) -> bool {
        matches!(self.role, Role::Operation(_))
    }

    pub fn as_operation(&self) -> Option<&OperationData> {
        match &self.role {
            Role::Operation(data) => Some(data),
            Role::Seed(_) => None,
        }
    }

    pub(crate) fn as_operation_mut(&mut self) -> Option<&mut OperationData> {
        match &mut self.role {
            Role::Operation(data) => Some(data),
            Role::Seed(_) => None,
        }
    }

    pub fn as_seed(&self) -> Option<&SeedData> {
        match &self.role {
            Role::Seed(data) => Some(data),
            Role::Operation(_) => None,
        }
    }

    pub(crate) fn as_seed_mut(&mut self) -> Option<&mut SeedData> {
        match &mut self.role {
            Role::Seed(data) => Some(data),
            Role::Operation(_) => None,
        }
    }

    /// Buffer read by Normal and Seed consumers.
    pub fn output_buffer(&self) -> BufferRef {
        match &self.role {
            Role::Operation(data) => data.operation.output_buffer(),
            Role::Seed(data) => data.seed.output_buffer(),
        }
    }

    /// Buffer read by predge consumers. Seeds have no delay buffer.
    pub fn blit_buffer(&self) -> BufferRef {
        match &self.role {
            Role::Operation(data) => data.operation.blit_buffer(),
            Role::Seed(data) => data.seed.output_buffer(),
        }
    }

    /// Add a dependency (a node that feeds this node).
    pub(crate) fn add_dependency(&mut self, node_id: NodeId) {
        if !self.dependencies.contains(&node_id) {
            self.dependencies.push(node_id);
        }
    }

    /// Remove a dependency.
    pub(crate) fn remove_dependency(&mut self, node_id: NodeId) {
        self.dependencies.retain(|id| *id != node_id);
    }

    /// Get all dependencies.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Add a dependent (a node this node feeds).
    pub(crate) fn add_dependent(&mut self, node_id: NodeId) {
        if !self.dependents.contains(&node_id) {
            self.dependents.push(node_id);
        }
    }

    /// Remove a dependent.
    pub(crate) fn remove_dependent(&mut self, node_id: NodeId) {
        self.dependents.retain(|id| *id != node_id);
    }

    /// Get all dependents.
    pub fn dependents(&self) -> &[NodeId] {
        &self.dependents
    }

    /// Neither inputs nor outputs: nothing consumed, nothing produced.
    pub fn is_isolated(&self) -> bool {
        self.dependencies.is_empty() && self.dependents.is_empty()
    }
}
