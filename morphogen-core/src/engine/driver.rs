//! Iteration Driver
//!
//! One tick runs in three passes over the current order:
//!
//! 1. Redraw fixed seeds.
//! 2. Apply every enabled operation, refreshing its inputs first, so Normal
//!    consumers see outputs produced earlier in the same tick.
//! 3. Blit every operation that feeds a predge, so predge consumers read a
//!    consistent snapshot of the previous tick on the next one.
//!
//! No blit is visible to any apply within the same tick. [`run`] drives
//! ticks from a tokio interval and can be paused, resumed and stopped
//! through a watch channel without touching graph state. Graph edits reach
//! the running loop as closures over an mpsc channel.

use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace};

use super::Engine;

/// Requested state of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

impl Engine {
    /// Run one tick.
    ///
    /// Never fails: stranded operations are simply not in the order.
    pub fn iterate(&mut self) {
        for node in self.graph.nodes_mut() {
            if let Some(data) = node.as_seed_mut() {
                if data.seed.is_fixed() {
                    data.seed.draw();
                }
            }
        }

        let schedule = std::mem::take(&mut self.schedule);
        for id in schedule.order() {
            self.graph.sync_inputs(*id);
            if let Ok(data) = self.graph.operation_data_mut(*id) {
                if data.enabled {
                    data.operation.apply_operation();
                }
            }
        }
        for id in schedule.order() {
            if let Ok(data) = self.graph.operation_data_mut(*id) {
                if data.blit_enabled {
                    data.operation.blit();
                }
            }
        }
        self.schedule = schedule;

        self.ticks += 1;
        trace!(tick = self.ticks, operations = self.schedule.len(), "iterated");
    }

    /// Redraw every seed, fixed or not.
    pub fn draw_seeds(&mut self) {
        for node in self.graph.nodes_mut() {
            if let Some(data) = node.as_seed_mut() {
                data.seed.draw();
            }
        }
    }
}

/// A graph edit queued for the tick loop.
pub type Edit = Box<dyn FnOnce(&mut Engine)>;

/// Tick `engine` at its configured interval until told to stop or until
/// the control sender is dropped. Returns the number of ticks run.
///
/// Edits received on `edits` run between ticks, paused or not, so the next
/// tick uses the order they produced. Closing the edit channel leaves the
/// loop running.
pub async fn run(
    engine: &mut Engine,
    mut control: watch::Receiver<LoopState>,
    mut edits: mpsc::UnboundedReceiver<Edit>,
) -> u64 {
    let mut interval = time::interval(engine.config().tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0;
    let mut accepting_edits = true;

    info!(interval_ms = engine.config().tick_interval_ms, "tick loop started");
    loop {
        let state = *control.borrow_and_update();
        if state == LoopState::Stopped {
            break;
        }
        let running = state == LoopState::Running;

        tokio::select! {
            _ = interval.tick(), if running => {
                engine.iterate();
                ticks += 1;
            }
            edit = edits.recv(), if accepting_edits => match edit {
                Some(edit) => {
                    edit(&mut *engine);
                    debug!(tick = engine.ticks(), "edit applied");
                }
                None => accepting_edits = false,
            },
            changed = control.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(ticks, "tick loop stopped");
    ticks
}
