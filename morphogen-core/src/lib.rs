//! MorphogenGL Core
//!
//! This crate provides the operation graph scheduler behind the MorphogenGL
//! video feedback engine. A directed graph of image operations is applied
//! to its own output every tick; this crate decides in which order.
//!
//! It implements:
//!
//! - Elementary cycle search (Tarjan SCCs + Johnson circuits)
//! - The dataflow node/edge model with per-operation input mirrors
//! - The topological scheduler over Normal edges
//! - Automatic predge insertion so every cycle stays computable
//! - The per-tick iteration driver and a tokio tick loop
//!
//! Rendering, UI and persistence formats live elsewhere and plug in through
//! the [`collab::Operation`] and [`collab::Seed`] traits.
//!
//! # Architecture
//!
//! - `cycles`: elementary cycle enumeration
//! - `graph`: nodes, edges, input mirrors and the scheduler
//! - `engine`: maintenance protocol, notifications and the driver
//! - `snapshot`: structural snapshots, two-phase restore, clipboard
//!
//! # Example
//!
//! ```rust,ignore
//! use morphogen_core::engine::Engine;
//!
//! let mut engine = Engine::default();
//! let blur = engine.add_operation_node("blur", Box::new(Blur::new()));
//! let mix = engine.add_operation_node("mix", Box::new(Mix::new()));
//!
//! engine.connect(blur, mix, None)?;
//! engine.connect(mix, blur, None)?; // closes a loop, becomes a predge
//!
//! engine.iterate();
//! ```

pub mod collab;
pub mod config;
pub mod cycles;
pub mod engine;
pub mod error;
pub mod graph;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{GraphError, Result};
