//! Netmesh: a discrete-time network propagation simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all netmesh sub-crates. For most users, adding `netmesh` as a single
//! dependency is sufficient — [`Simulator`] is the single entry point.
//!
//! # Quick start
//!
//! ```rust
//! use netmesh::Simulator;
//!
//! let sim = Simulator::new();
//! sim.create_new_network(4).unwrap();
//! sim.input_text("hi");
//! sim.run_to_completion().unwrap();
//! let _ = sim.get_output();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not re-exported
//! at the crate root:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `netmesh-core` | IDs, ranges, payloads, errors, binary primitives |
//! | [`random`] | `netmesh-random` | Seeded and OS-entropy random sources |
//! | [`operator`] | `netmesh-operator` | The `Operator` trait and ADD/IN/OUT variants |
//! | [`layer`] | `netmesh-layer` | The `Layer` trait and INPUT/OUTPUT/INTERNAL variants |
//! | [`engine`] | `netmesh-engine` | `TopController`, `StepExecutor`, `UpdateQueue` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod json;
mod simulator;

/// Core types, IDs, ranges, payloads, and error types (`netmesh-core`).
pub use netmesh_core as core;

/// Seeded and OS-entropy random sources (`netmesh-random`).
pub use netmesh_random as random;

/// The [`operator::Operator`] trait and the ADD/IN/OUT variants (`netmesh-operator`).
pub use netmesh_operator as operator;

/// The [`layer::Layer`] trait and the INPUT/OUTPUT/INTERNAL variants (`netmesh-layer`).
pub use netmesh_layer as layer;

/// [`engine::TopController`], [`engine::StepExecutor`], and [`engine::UpdateQueue`] (`netmesh-engine`).
pub use netmesh_engine as engine;

pub use simulator::{Simulator, SimulatorStatus, MAX_STEPS};

/// Common imports for typical netmesh usage.
///
/// ```rust
/// use netmesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Simulator, SimulatorStatus};
    pub use netmesh_core::{FacadeError, OperatorId, Payload, StepId};
}
