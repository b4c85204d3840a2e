//! Core types shared across the netmesh propagation engine.
//!
//! This is the leaf crate with zero internal netmesh dependencies. It
//! defines the identifiers, error types, wire primitives, and payload/event
//! records used throughout the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod payload;
pub mod range;
pub mod serializer;

pub use command::{Params, UpdateEvent, UpdateKind};
pub use error::{FacadeError, LayerError, RangeError, SerializeError, TopologyError};
pub use id::{Channel, LayerKind, OpType, OperatorId, StepId};
pub use payload::Payload;
pub use range::IdRange;
pub use serializer::{write_i32, write_u16, write_u32, write_u64, write_u8, Cursor};
