//! Operator trait and variants (ADD/IN/OUT) for the netmesh propagation
//! engine.
//!
//! Operators are stored by owning layers as `Box<dyn Operator>`; the
//! `traverse` and floating-point `message` behavior is shared in the
//! [`operator`] module, variant-specific behavior lives in [`add`],
//! [`in_op`], and [`out_op`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod add;
pub mod codec;
pub mod in_op;
pub mod operator;
pub mod out_op;
pub mod randomize;
pub mod routing;
pub mod scheduling;

pub use add::AddOperator;
pub use codec::decode_operator;
pub use in_op::InOperator;
pub use operator::Operator;
pub use out_op::{OutOperator, DEFAULT_TEXT_BATCH_SIZE};
pub use randomize::{ADD_MAX_CONNECTIONS, ADD_MAX_DISTANCE, IN_MAX_CONNECTIONS, IN_MAX_DISTANCE};
pub use routing::RoutingTable;
pub use scheduling::{SchedulingBus, SchedulingContext};
