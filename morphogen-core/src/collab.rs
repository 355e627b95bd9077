//! Collaborator Interfaces
//!
//! The core never talks to the GPU. Rendering lives behind two traits:
//! [`Operation`] for image transformations and [`Seed`] for image sources.
//! The core only tracks *which* buffer each input should read, as an opaque
//! [`BufferRef`], and tells collaborators when to apply, blit and redraw.

use serde::{Deserialize, Serialize};

use crate::graph::InputData;

/// Opaque handle to an image buffer owned by the rendering layer
/// (typically a texture id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BufferRef(pub u32);

impl BufferRef {
    /// Get the raw handle value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// An image transformation with any number of inputs and one output.
pub trait Operation {
    /// Stable tag naming the kind of operation, used by snapshots.
    fn kind_name(&self) -> &str;

    /// Consume the current input data and render a new output.
    fn apply_operation(&mut self);

    /// Copy the output just produced into the delay buffer read by predges.
    fn blit(&mut self);

    /// Buffer holding the output of the latest apply.
    fn output_buffer(&self) -> BufferRef;

    /// Buffer holding the previous tick's output.
    fn blit_buffer(&self) -> BufferRef;

    /// Whether the operation must keep a previous-frame copy.
    fn enable_blit(&mut self, enabled: bool);

    /// Replace the operation's inputs. Called whenever the mirror changes.
    fn set_input_data(&mut self, inputs: &[InputData]);

    /// Deep copy used by copy/paste.
    fn clone_box(&self) -> Box<dyn Operation>;
}

/// A source of image data with no inputs.
pub trait Seed {
    fn output_buffer(&self) -> BufferRef;

    /// Regenerate the seed's content.
    fn draw(&mut self);

    /// Fixed seeds are redrawn at the start of every tick.
    fn is_fixed(&self) -> bool;

    fn clone_box(&self) -> Box<dyn Seed>;
}
