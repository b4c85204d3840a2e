//! The concrete [`SchedulingBus`] wired up during [`crate::executor::StepExecutor::step`].

use netmesh_core::{OperatorId, Payload, UpdateEvent};
use netmesh_operator::SchedulingBus;

use crate::update_queue::UpdateQueue;

/// Buffers message deliveries and forwards payload/update scheduling during
/// one traversal call.
///
/// Deliberately holds no reference to [`crate::controller::TopController`]:
/// `traverse` is called with a shared borrow of the controller (it reads
/// routing tables through it), while realizing a delivery needs a *mutable*
/// borrow to call `messageOp`. Holding both at once is not possible, so
/// deliveries are buffered here and drained by the executor after the
/// traversal loop's `&TopController` borrow has ended — see
/// [`crate::executor::StepExecutor::step`].
pub struct EngineBus<'a> {
    pending_messages: &'a mut Vec<(OperatorId, i32)>,
    next: &'a mut Vec<Payload>,
    queue: &'a mut UpdateQueue,
}

impl<'a> EngineBus<'a> {
    /// Wrap the three buffers a traversal or process call may touch.
    pub fn new(
        pending_messages: &'a mut Vec<(OperatorId, i32)>,
        next: &'a mut Vec<Payload>,
        queue: &'a mut UpdateQueue,
    ) -> Self {
        Self {
            pending_messages,
            next,
            queue,
        }
    }
}

impl SchedulingBus for EngineBus<'_> {
    fn schedule_message(&mut self, target: OperatorId, message: i32) {
        self.pending_messages.push((target, message));
    }

    fn schedule_payload(&mut self, payload: Payload) {
        self.next.push(payload);
    }

    fn submit_update(&mut self, event: UpdateEvent) {
        self.queue.submit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_operator::SchedulingContext;

    #[test]
    fn schedule_message_buffers_rather_than_delivering() {
        let mut pending = Vec::new();
        let mut next = Vec::new();
        let mut queue = UpdateQueue::new();
        let mut bus = EngineBus::new(&mut pending, &mut next, &mut queue);
        let mut ctx = SchedulingContext::new(&mut bus);
        ctx.schedule_message(OperatorId(1), 7);
        assert_eq!(pending, vec![(OperatorId(1), 7)]);
    }

    #[test]
    fn schedule_payload_appends_to_next() {
        let mut pending = Vec::new();
        let mut next = Vec::new();
        let mut queue = UpdateQueue::new();
        let mut bus = EngineBus::new(&mut pending, &mut next, &mut queue);
        let mut ctx = SchedulingContext::new(&mut bus);
        ctx.schedule_payload(Payload::new(1, OperatorId(2)));
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn submit_update_forwards_to_queue() {
        let mut pending = Vec::new();
        let mut next = Vec::new();
        let mut queue = UpdateQueue::new();
        let mut bus = EngineBus::new(&mut pending, &mut next, &mut queue);
        let mut ctx = SchedulingContext::new(&mut bus);
        ctx.submit_update(UpdateEvent::delete_operator(OperatorId(3)));
        assert_eq!(queue.len(), 1);
    }
}
