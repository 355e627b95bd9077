//! Error types for graph editing and engine setup.

use thiserror::Error;

use crate::graph::{EdgeKind, NodeId};

/// Errors returned by graph mutations, snapshot restore and configuration.
///
/// A rejected mutation never leaves the graph partially modified.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The id does not name a node in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// There is no edge between the two nodes.
    #[error("edge not found: {src} -> {dst}")]
    EdgeNotFound { src: NodeId, dst: NodeId },

    /// A restored node reuses an id already present.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// A restored node carries an id too large to keep allocating above.
    #[error("node id out of range: {0}")]
    NodeIdOutOfRange(NodeId),

    /// The two nodes are already connected.
    #[error("edge already exists: {src} -> {dst}")]
    EdgeExists { src: NodeId, dst: NodeId },

    /// The node is a seed where an operation is required.
    #[error("node {0} is not an operation")]
    NotAnOperation(NodeId),

    /// Seeds only produce images, they cannot receive an edge.
    #[error("seed {0} cannot be an edge destination")]
    SeedDestination(NodeId),

    /// The requested kind does not fit the edge's source.
    #[error("edge {src} -> {dst} cannot be of kind {kind:?}")]
    InvalidEdgeKind {
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
    },

    /// Demoting this predge would leave a cycle without any predge.
    #[error("edge {src} -> {dst} is the only predge of a cycle")]
    PredgeRequired { src: NodeId, dst: NodeId },

    #[error("blend factor {0} is outside [0, 1]")]
    BlendFactorOutOfRange(f32),

    /// A snapshot names an operation kind the factory cannot build.
    #[error("unknown operation kind: {0}")]
    UnknownOperationKind(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),

    /// The snapshot was written by a newer, incompatible format.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedSnapshotVersion(u32),

    #[error("invalid config: {0}")]
    Config(#[source] serde_json::Error),

    /// Config parsed but holds a value the engine cannot run with.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
