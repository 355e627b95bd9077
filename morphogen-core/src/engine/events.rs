//! Engine notifications.
//!
//! A Subscriber is any UI component that wants to follow the engine: the
//! sorted operations list, the cycle highlighter, a log panel.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cycles::Cycle;
use crate::graph::NodeId;

/// Something observable happened in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The scheduler ran. Carries the order with display names.
    SortedOperationsChanged(Vec<(NodeId, String)>),

    /// Cycle search ran over the current edge set.
    CyclesChanged(Vec<Cycle>),

    /// An edge was turned into a predge to break a cycle.
    PredgeInserted { src: NodeId, dst: NodeId },

    /// The scheduler could not place these operations.
    StrandedOperations(Vec<NodeId>),
}

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber to engine events.
pub struct Subscriber {
    id: SubscriberId,

    /// The callback to invoke for each event.
    notify: Box<dyn FnMut(&EngineEvent)>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn notify(&mut self, event: &EngineEvent) {
        (self.notify)(event);
    }
}

/// The set of subscribers attached to an engine.
#[derive(Default)]
pub(crate) struct Subscribers {
    subscribers: Vec<Subscriber>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, subscriber: Subscriber) -> SubscriberId {
        let id = subscriber.id();
        self.subscribers.push(subscriber);
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id() != id);
        self.subscribers.len() != before
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.notify(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
