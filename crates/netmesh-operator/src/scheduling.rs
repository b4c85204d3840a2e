//! The scheduling bus interface that `traverse`/`processData` use to
//! enqueue deliveries, new payloads, and structural mutations without
//! holding a reference back to the step executor.

use netmesh_core::{OperatorId, Payload, UpdateEvent};

/// Implemented by whatever owns the step executor and update queue.
///
/// Object-safe so operators can be stored as `Box<dyn Operator>` while the
/// engine passes a single `&mut dyn SchedulingBus` into each traversal or
/// process call. See [`SchedulingContext`] for the thin wrapper operators
/// actually hold.
pub trait SchedulingBus {
    /// Record a message delivery to `target`, realized later in the same
    /// step via the executor's `deliverAndFlag`.
    fn schedule_message(&mut self, target: OperatorId, message: i32);

    /// Append `payload` to the executor's next-step buffer.
    fn schedule_payload(&mut self, payload: Payload);

    /// Submit a structural mutation to the update queue.
    fn submit_update(&mut self, event: UpdateEvent);
}

/// A short-lived borrow of the scheduling bus, handed to `traverse` and
/// `processData` for the duration of one call.
///
/// This is the non-global replacement for a process-wide scheduler
/// singleton: operators never hold a reference to the executor, they only
/// borrow this context for as long as the call lasts.
pub struct SchedulingContext<'a> {
    bus: &'a mut dyn SchedulingBus,
}

impl<'a> SchedulingContext<'a> {
    /// Wrap `bus` for the duration of one traversal or process call.
    pub fn new(bus: &'a mut dyn SchedulingBus) -> Self {
        Self { bus }
    }

    /// Record a message delivery to `target`.
    pub fn schedule_message(&mut self, target: OperatorId, message: i32) {
        self.bus.schedule_message(target, message);
    }

    /// Schedule `payload` to begin traversing next step.
    pub fn schedule_payload(&mut self, payload: Payload) {
        self.bus.schedule_payload(payload);
    }

    /// Submit a structural mutation for the next queue drain.
    pub fn submit_update(&mut self, event: UpdateEvent) {
        self.bus.submit_update(event);
    }
}
