//! Snapshots and the clipboard.
//!
//! A [`GraphSnapshot`] records the structure of a graph: node ids, names,
//! kind tags and edges with their kinds and blend factors. Restoring is a
//! two-phase load (all nodes, then all edges) followed by a single repair
//! and sort, the same sequence a saved-file loader drives through
//! [`Engine::load_operation`], [`Engine::connect_loaded`] and
//! [`Engine::finish_loading`].
//!
//! Operation parameters are not part of the snapshot; the caller's
//! [`NodeFactory`] builds collaborators from their kind tags.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collab::{Operation, Seed};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{GraphError, Result};
use crate::graph::{Edge, NodeId, Role, SeedKind};

const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

fn default_true() -> bool {
    true
}

/// Structural description of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub role: RoleRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoleRecord {
    Operation {
        kind: String,
        #[serde(default = "default_true")]
        enabled: bool,
    },
    Seed {
        kind: SeedKind,
    },
}

/// Builds collaborators while restoring a snapshot.
pub trait NodeFactory {
    /// `None` if the kind is unknown.
    fn operation(&mut self, kind: &str) -> Option<Box<dyn Operation>>;

    fn seed(&mut self, kind: SeedKind) -> Box<dyn Seed>;
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(GraphError::Snapshot)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(GraphError::Snapshot)
    }
}

impl Engine {
    /// Capture the graph's structure.
    pub fn snapshot(&self) -> GraphSnapshot {
        let graph = self.graph();
        let nodes = graph
            .node_ids()
            .into_iter()
            .filter_map(|id| graph.node(id).ok())
            .map(|node| NodeRecord {
                id: node.id(),
                name: node.name().to_string(),
                role: match node.role() {
                    Role::Operation(data) => RoleRecord::Operation {
                        kind: data.operation().kind_name().to_string(),
                        enabled: data.is_enabled(),
                    },
                    Role::Seed(data) => RoleRecord::Seed { kind: data.kind() },
                },
            })
            .collect();

        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            nodes,
            edges: graph.edges().copied().collect(),
        }
    }

    /// Rebuild an engine from a snapshot.
    pub fn restore(
        snapshot: &GraphSnapshot,
        factory: &mut dyn NodeFactory,
        config: EngineConfig,
    ) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GraphError::UnsupportedSnapshotVersion(snapshot.version));
        }
        let mut engine = Engine::new(config);

        for record in &snapshot.nodes {
            match &record.role {
                RoleRecord::Operation { kind, enabled } => {
                    let operation = factory
                        .operation(kind)
                        .ok_or_else(|| GraphError::UnknownOperationKind(kind.clone()))?;
                    engine.load_operation(record.id, record.name.clone(), operation)?;
                    engine.set_enabled(record.id, *enabled)?;
                }
                RoleRecord::Seed { kind } => {
                    engine.load_seed(record.id, record.name.clone(), *kind, factory.seed(*kind))?;
                }
            }
        }

        for edge in &snapshot.edges {
            engine.connect_loaded(edge.src, edge.dst, edge.kind, edge.blend_factor)?;
        }

        engine.finish_loading()?;
        info!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "graph restored"
        );
        Ok(engine)
    }
}

/// Copied collaborator of a clipboard node.
pub(crate) enum ClipPayload {
    Operation {
        operation: Box<dyn Operation>,
        enabled: bool,
    },
    Seed {
        kind: SeedKind,
        seed: Box<dyn Seed>,
    },
}

pub(crate) struct ClipNode {
    /// Id in the graph the node was copied from.
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) payload: ClipPayload,
}

/// Nodes and internal edges captured by [`Engine::copy`].
///
/// Pasting clones the collaborators again, so one clipboard can be pasted
/// any number of times.
pub struct Clipboard {
    pub(crate) nodes: Vec<ClipNode>,
    pub(crate) edges: Vec<Edge>,
}

impl Clipboard {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of the copied nodes in the source graph.
    pub fn source_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|node| node.id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
