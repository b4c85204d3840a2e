//! UpdateQueue, StepExecutor, and TopController: the stateful core of the
//! netmesh propagation engine.
//!
//! [`TopController`] owns the layer set and routes operator-level calls;
//! [`StepExecutor`] owns the in-flight payload buffers and drives one
//! discrete step; [`UpdateQueue`] buffers structural mutations for a single
//! drain pass. [`bus::EngineBus`] is the concrete [`netmesh_operator::SchedulingBus`]
//! these three are wired together through.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bus;
pub mod controller;
pub mod executor;
pub mod update_queue;

pub use bus::EngineBus;
pub use controller::TopController;
pub use executor::StepExecutor;
pub use update_queue::UpdateQueue;
