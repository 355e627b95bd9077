//! Dataflow Graph
//!
//! This module implements the graph of image operations that is applied to
//! its own output every tick.
//!
//! # Overview
//!
//! The graph is a directed graph, cycles included, where:
//!
//! - Nodes are seeds (image sources) or operations (image transformations)
//! - Edges run from any node into an operation and carry a blend factor
//!
//! Feedback loops are the point of the engine. An operation cannot read its
//! own not-yet-computed output within one tick, so every cycle must contain
//! a predge: an edge whose consumer reads the source's output from the
//! previous tick. With predges discounted, the remaining Normal edges form a
//! DAG and the scheduler can order the operations.
//!
//! # Design Decisions
//!
//! 1. Nodes and edges are stored in id-keyed arenas. Cross references are
//!    ids, so there is no ownership cycle between nodes and edges.
//!
//! 2. Cycles are derived data. They are recomputed from scratch after each
//!    structural edit instead of being cached on edges.
//!
//! 3. Each node keeps both its dependencies and its dependents for cheap
//!    traversal in either direction.

mod edge;
mod model;
mod node;
mod scheduler;

pub use edge::{Edge, EdgeKind, InputData};
pub use model::DataflowGraph;
pub use node::{Node, NodeId, NodeKind, OperationData, Role, SeedData, SeedKind};
pub use scheduler::{sort_operations, Schedule};
