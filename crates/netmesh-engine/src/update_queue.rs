//! Append-only queue of deferred structural mutations.

use netmesh_core::UpdateEvent;

use crate::controller::TopController;

/// Buffers [`UpdateEvent`]s submitted through the scheduling bus and drains
/// them against a [`TopController`] in FIFO order.
///
/// Events submitted while draining are processed in the same pass: the loop
/// indexes by position rather than taking an iterator snapshot, so anything
/// pushed mid-drain (e.g. an `ADD` operator's `randomInit` submitting
/// `ADD_CONNECTION` events) is still seen before the queue is declared empty.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    events: Vec<UpdateEvent>,
}

impl UpdateQueue {
    /// Construct an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` for the next drain pass.
    pub fn submit(&mut self, event: UpdateEvent) {
        self.events.push(event);
    }

    /// Number of events currently buffered (mainly for status snapshots).
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain every buffered event, dispatching each to `controller` by
    /// `kind`. Non-existent targets are silently dropped by the controller's
    /// handlers, not by this loop.
    pub fn process_all(&mut self, controller: &mut TopController) {
        let mut i = 0;
        while i < self.events.len() {
            let event = self.events[i].clone();
            controller.dispatch_update(&event);
            i += 1;
        }
        self.events.clear();
    }
}
