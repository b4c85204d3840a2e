//! Layer trait and variants (INPUT/OUTPUT/INTERNAL) for the netmesh
//! propagation engine.
//!
//! Each variant embeds a [`core::LayerCore`] for shared bookkeeping (the
//! operator map, reserved range, and finality flag) and implements the
//! object-safe [`Layer`] trait largely by delegating to it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod core;
pub mod input;
pub mod internal;
pub mod layer;
pub mod output;

pub use codec::{decode_layer_block, encode_layer_block};
pub use core::LayerCore;
pub use input::InputLayer;
pub use internal::InternalLayer;
pub use layer::Layer;
pub use output::OutputLayer;
