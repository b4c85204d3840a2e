//! Test utilities and mock types for netmesh development.
//!
//! Provides [`RecordingBus`], a [`SchedulingBus`] mock that records every
//! scheduled message, payload, and update for assertions in operator and
//! layer unit tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use netmesh_core::{OperatorId, Payload, UpdateEvent};
use netmesh_operator::{SchedulingBus, SchedulingContext};

/// Records every call made through a [`SchedulingContext`] instead of
/// acting on it, so tests can assert on exactly what an operator or layer
/// scheduled.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub messages: Vec<(OperatorId, i32)>,
    pub payloads: Vec<Payload>,
    pub updates: Vec<UpdateEvent>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a [`SchedulingContext`] over this bus for one call.
    pub fn context(&mut self) -> SchedulingContext<'_> {
        SchedulingContext::new(self)
    }
}

impl SchedulingBus for RecordingBus {
    fn schedule_message(&mut self, target: OperatorId, message: i32) {
        self.messages.push((target, message));
    }

    fn schedule_payload(&mut self, payload: Payload) {
        self.payloads.push(payload);
    }

    fn submit_update(&mut self, event: UpdateEvent) {
        self.updates.push(event);
    }
}
