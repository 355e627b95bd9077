//! Shared test collaborators.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use morphogen_core::collab::{BufferRef, Operation, Seed};
use morphogen_core::graph::{InputData, SeedKind};
use morphogen_core::snapshot::NodeFactory;

/// Records what the engine asked of each collaborator.
#[derive(Debug, Clone, Default)]
pub struct Calls(Rc<RefCell<Vec<String>>>);

impl Calls {
    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|entry| entry.starts_with(prefix)).count()
    }
}

/// Operation whose output buffer is its label and blit buffer is label + 1000.
#[derive(Debug, Clone)]
pub struct FakeOperation {
    kind: String,
    label: u32,
    inputs: Rc<RefCell<Vec<InputData>>>,
    blit: Rc<RefCell<bool>>,
    calls: Calls,
}

impl FakeOperation {
    pub fn new(kind: &str, label: u32, calls: &Calls) -> Self {
        Self {
            kind: kind.to_string(),
            label,
            inputs: Rc::default(),
            blit: Rc::default(),
            calls: calls.clone(),
        }
    }

    pub fn boxed(label: u32) -> Box<dyn Operation> {
        Box::new(Self::new("fake", label, &Calls::default()))
    }

    /// Handle to the last inputs pushed by the engine.
    pub fn inputs_handle(&self) -> Rc<RefCell<Vec<InputData>>> {
        self.inputs.clone()
    }

    pub fn blit_handle(&self) -> Rc<RefCell<bool>> {
        self.blit.clone()
    }
}

impl Operation for FakeOperation {
    fn kind_name(&self) -> &str {
        &self.kind
    }

    fn apply_operation(&mut self) {
        self.calls.push(format!("apply {}", self.label));
    }

    fn blit(&mut self) {
        self.calls.push(format!("blit {}", self.label));
    }

    fn output_buffer(&self) -> BufferRef {
        BufferRef(self.label)
    }

    fn blit_buffer(&self) -> BufferRef {
        BufferRef(self.label + 1000)
    }

    fn enable_blit(&mut self, enabled: bool) {
        *self.blit.borrow_mut() = enabled;
    }

    fn set_input_data(&mut self, inputs: &[InputData]) {
        *self.inputs.borrow_mut() = inputs.to_vec();
    }

    fn clone_box(&self) -> Box<dyn Operation> {
        Box::new(Self {
            inputs: Rc::default(),
            blit: Rc::default(),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct FakeSeed {
    buffer: u32,
    fixed: bool,
    calls: Calls,
}

impl FakeSeed {
    pub fn boxed(buffer: u32) -> Box<dyn Seed> {
        Box::new(Self {
            buffer,
            fixed: false,
            calls: Calls::default(),
        })
    }
}

impl Seed for FakeSeed {
    fn output_buffer(&self) -> BufferRef {
        BufferRef(self.buffer)
    }

    fn draw(&mut self) {
        self.calls.push(format!("draw {}", self.buffer));
    }

    fn is_fixed(&self) -> bool {
        self.fixed
    }

    fn clone_box(&self) -> Box<dyn Seed> {
        Box::new(self.clone())
    }
}

/// Builds fakes for the kinds "blur" and "mix".
#[derive(Default)]
pub struct FakeFactory {
    next: u32,
    pub calls: Calls,
}

impl NodeFactory for FakeFactory {
    fn operation(&mut self, kind: &str) -> Option<Box<dyn Operation>> {
        match kind {
            "blur" | "mix" => {
                self.next += 1;
                Some(Box::new(FakeOperation::new(kind, self.next, &self.calls)))
            }
            _ => None,
        }
    }

    fn seed(&mut self, _kind: SeedKind) -> Box<dyn Seed> {
        self.next += 1;
        FakeSeed::boxed(500 + self.next)
    }
}
