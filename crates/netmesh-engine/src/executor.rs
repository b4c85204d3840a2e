//! Owns the in-flight payload buffers and drives one discrete simulation
//! step: traversal, then delivery, then processing.

use indexmap::IndexSet;

use netmesh_core::{
    write_u32, write_u64, write_u8, Cursor, OperatorId, Payload, SerializeError, StepId,
};
use netmesh_operator::SchedulingContext;

use crate::bus::EngineBus;
use crate::controller::TopController;
use crate::update_queue::UpdateQueue;

/// The payload step machine: `current` payloads traverse this step,
/// `next` collects payloads that begin traversing next step, and
/// `to_process` names the operators whose `processData` must run this
/// step.
#[derive(Debug, Default)]
pub struct StepExecutor {
    current: Vec<Payload>,
    next: Vec<Payload>,
    to_process: IndexSet<OperatorId>,
    current_step: StepId,
}

impl StepExecutor {
    /// A fresh executor at step 0 with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The step counter, incremented by [`StepExecutor::advance`].
    pub fn current_step(&self) -> StepId {
        self.current_step
    }

    /// Payloads currently traversing (this step's input).
    pub fn current_payloads(&self) -> &[Payload] {
        &self.current
    }

    /// Payloads queued to begin traversing next step.
    pub fn next_payloads(&self) -> &[Payload] {
        &self.next
    }

    /// Whether there is any payload in flight or any operator pending a
    /// process call — used by the run loop to stop early.
    pub fn is_active(&self) -> bool {
        !self.current.is_empty() || !self.next.is_empty() || !self.to_process.is_empty()
    }

    /// Run one step: traverse every active `current` payload, deliver any
    /// messages those traversals scheduled, sweep dead payloads, then run
    /// `processData` for every operator a delivery reached.
    ///
    /// The traversal loop calls `controller.traverse_payload`, which only
    /// needs a shared borrow (it reads routing tables, it never mutates).
    /// Deliveries scheduled during traversal are buffered by the
    /// [`EngineBus`] rather than applied inline, because applying one
    /// (`controller.message_op`) needs a *mutable* borrow that would
    /// otherwise alias the traversal loop's shared one. They are realized
    /// after the loop ends, once the shared borrow is gone.
    pub fn step(&mut self, controller: &mut TopController, queue: &mut UpdateQueue) {
        let mut traversal_messages = Vec::new();
        for payload in self.current.iter_mut() {
            if !payload.active {
                continue;
            }
            let mut bus = EngineBus::new(&mut traversal_messages, &mut self.next, queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            controller.traverse_payload(payload, &mut ctx);
        }

        self.current.retain(|p| p.active);

        for (target, v) in traversal_messages {
            if controller.message_op(target, v) {
                self.to_process.insert(target);
            }
        }

        let to_process: Vec<OperatorId> = self.to_process.drain(..).collect();
        let mut process_messages = Vec::new();
        for id in to_process {
            let mut bus = EngineBus::new(&mut process_messages, &mut self.next, queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            controller.process_op_data(id, &mut ctx);
        }

        // processData is not expected to call scheduleMessage (only
        // scheduleMessage and submitUpdate are used by traverse and the
        // random-init paths respectively), but the bus exposes it
        // uniformly; anything delivered here joins next step's toProcess.
        for (target, v) in process_messages {
            if controller.message_op(target, v) {
                self.to_process.insert(target);
            }
        }
    }

    /// Append payloads scheduled outside of [`StepExecutor::step`] (e.g. a
    /// façade call that delivers a message directly) to `next`.
    pub fn extend_next(&mut self, payloads: impl IntoIterator<Item = Payload>) {
        self.next.extend(payloads);
    }

    /// Flag `id` as owing a `processData` call next step, mirroring what
    /// [`StepExecutor::step`] does for every delivery its own traversal
    /// phase produces.
    pub fn mark_for_processing(&mut self, id: OperatorId) {
        self.to_process.insert(id);
    }

    /// Move every payload in `next` into `current`, clear `next`, and
    /// increment the step counter.
    pub fn advance(&mut self) {
        self.current.append(&mut self.next);
        self.current_step = self.current_step.next();
    }

    /// Persist `current`, `next`, and `toProcess` (only active payloads are
    /// written; see §4.8's binary format).
    pub fn save_state(&self, buf: &mut Vec<u8>) {
        let active_current: Vec<&Payload> = self.current.iter().filter(|p| p.active).collect();
        let active_next: Vec<&Payload> = self.next.iter().filter(|p| p.active).collect();

        write_u64(buf, active_current.len() as u64);
        write_u64(buf, active_next.len() as u64);
        write_u64(buf, self.to_process.len() as u64);
        for p in &active_current {
            encode_payload_block(p, buf);
        }
        for p in &active_next {
            encode_payload_block(p, buf);
        }
        for id in &self.to_process {
            write_u32(buf, id.0);
        }
    }

    /// Load a buffer written by [`StepExecutor::save_state`]. Loaded
    /// payloads are marked active; `currentStep` resets to 0.
    pub fn load_state(cursor: &mut Cursor<'_>) -> Result<Self, SerializeError> {
        let current_count = cursor.read_u64()?;
        let next_count = cursor.read_u64()?;
        let to_process_count = cursor.read_u64()?;

        let mut current = Vec::with_capacity(current_count as usize);
        for _ in 0..current_count {
            current.push(decode_payload_block(cursor)?);
        }
        let mut next = Vec::with_capacity(next_count as usize);
        for _ in 0..next_count {
            next.push(decode_payload_block(cursor)?);
        }
        let mut to_process = IndexSet::new();
        for _ in 0..to_process_count {
            to_process.insert(OperatorId(cursor.read_u32()?));
        }

        Ok(Self {
            current,
            next,
            to_process,
            current_step: StepId(0),
        })
    }
}

fn encode_payload_block(p: &Payload, buf: &mut Vec<u8>) {
    let mut body = Vec::new();
    p.encode(&mut body);
    write_u8(buf, body.len() as u8);
    buf.extend_from_slice(&body);
}

fn decode_payload_block(cursor: &mut Cursor<'_>) -> Result<Payload, SerializeError> {
    let n = cursor.read_u8()? as usize;
    let body = cursor.read_bytes(n)?;
    let mut body_cursor = Cursor::new(body);
    let payload = Payload::decode(&mut body_cursor)?;
    body_cursor.expect_exhausted()?;
    Ok(payload)
}
