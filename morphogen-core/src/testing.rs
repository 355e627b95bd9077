//! Mock collaborators for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::collab::{BufferRef, Operation, Seed};
use crate::graph::InputData;

/// Shared log of collaborator calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockOperation {
    label: u32,
    output: BufferRef,
    alternate: Option<BufferRef>,
    trace: Option<Trace>,
}

impl MockOperation {
    fn new(label: u32) -> Self {
        Self {
            label,
            output: BufferRef(label),
            alternate: None,
            trace: None,
        }
    }

    pub(crate) fn boxed(buffer: u32) -> Box<dyn Operation> {
        Box::new(Self::new(buffer))
    }

    pub(crate) fn traced(buffer: u32, trace: &Trace) -> Box<dyn Operation> {
        Box::new(Self {
            trace: Some(trace.clone()),
            ..Self::new(buffer)
        })
    }

    /// Swaps between two output buffers on every apply.
    pub(crate) fn ping_pong(first: u32, second: u32) -> Box<dyn Operation> {
        Box::new(Self {
            alternate: Some(BufferRef(second)),
            ..Self::new(first)
        })
    }

    pub(crate) fn blit_of(buffer: u32) -> BufferRef {
        BufferRef(buffer + 1000)
    }
}

impl Operation for MockOperation {
    fn kind_name(&self) -> &str {
        "mock"
    }

    fn apply_operation(&mut self) {
        if let Some(alternate) = self.alternate.as_mut() {
            std::mem::swap(&mut self.output, alternate);
        }
        if let Some(trace) = &self.trace {
            trace.push(format!("apply {}", self.label));
        }
    }

    fn blit(&mut self) {
        if let Some(trace) = &self.trace {
            trace.push(format!("blit {}", self.label));
        }
    }

    fn output_buffer(&self) -> BufferRef {
        self.output
    }

    fn blit_buffer(&self) -> BufferRef {
        Self::blit_of(self.label)
    }

    fn enable_blit(&mut self, _enabled: bool) {}

    fn set_input_data(&mut self, _inputs: &[InputData]) {}

    fn clone_box(&self) -> Box<dyn Operation> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockSeed {
    buffer: BufferRef,
    fixed: bool,
    trace: Option<Trace>,
}

impl MockSeed {
    pub(crate) fn boxed(buffer: u32) -> Box<dyn Seed> {
        Box::new(Self {
            buffer: BufferRef(buffer),
            fixed: false,
            trace: None,
        })
    }

    pub(crate) fn traced(buffer: u32, fixed: bool, trace: &Trace) -> Box<dyn Seed> {
        Box::new(Self {
            buffer: BufferRef(buffer),
            fixed,
            trace: Some(trace.clone()),
        })
    }
}

impl Seed for MockSeed {
    fn output_buffer(&self) -> BufferRef {
        self.buffer
    }

    fn draw(&mut self) {
        if let Some(trace) = &self.trace {
            trace.push(format!("draw {}", self.buffer.raw()));
        }
    }

    fn is_fixed(&self) -> bool {
        self.fixed
    }

    fn clone_box(&self) -> Box<dyn Seed> {
        Box::new(self.clone())
    }
}
