//! Edges and the per-input mirror.

use serde::{Deserialize, Serialize};

use super::node::NodeId;
use crate::collab::BufferRef;

/// How a destination reads its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Reads the source's output computed earlier in the same tick.
    Normal,

    /// Reads the source's output from the previous tick (delay edge).
    /// Every cycle needs at least one of these.
    Predge,

    /// Reads a seed. Imposes no ordering.
    Seed,
}

impl EdgeKind {
    /// Only Normal edges constrain the evaluation order.
    pub fn is_blocking(&self) -> bool {
        matches!(self, EdgeKind::Normal)
    }
}

/// A directed edge from any node into an operation node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
    pub blend_factor: f32,
}

/// What an operation needs to know about one of its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputData {
    pub source: NodeId,
    pub kind: EdgeKind,

    /// Live output for Normal and Seed inputs, delay buffer for predges.
    pub buffer: BufferRef,

    pub blend_factor: f32,
}

/// Reject NaN and anything outside `[0, 1]`.
pub(crate) fn valid_blend_factor(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}
