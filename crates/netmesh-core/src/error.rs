//! Error types for the netmesh propagation engine.
//!
//! Organized by subsystem, mirroring the error-code table in the design
//! document: serialization, range, layer, topology, and façade errors.

use std::error::Error;
use std::fmt;

use crate::id::OperatorId;

/// Errors from reading or writing the binary wire formats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SerializeError {
    /// The input ended before a fixed-width primitive could be fully read.
    Truncated {
        /// What the reader was trying to decode when it ran out of bytes.
        context: String,
    },
    /// The input contained a tag or length that does not correspond to any
    /// known variant or is otherwise structurally invalid.
    Corrupt {
        /// Description of the malformed field.
        reason: String,
    },
    /// Trailing bytes remained after the expected sequence of blocks was
    /// fully consumed.
    TrailingData {
        /// Number of bytes left over.
        remaining: usize,
    },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { context } => write!(f, "truncated input while reading {context}"),
            Self::Corrupt { reason } => write!(f, "corrupt input: {reason}"),
            Self::TrailingData { remaining } => {
                write!(f, "{remaining} trailing byte(s) after expected data")
            }
        }
    }
}

impl Error for SerializeError {}

/// Errors from constructing or mutating an [`crate::range::IdRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// `min > max` at construction or after a mutation.
    InvalidRange {
        /// The rejected lower bound.
        min: u32,
        /// The rejected upper bound.
        max: u32,
    },
    /// Growing `max` would exceed `u32::MAX`.
    IdOverflow,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange { min, max } => {
                write!(f, "invalid range: min {min} exceeds max {max}")
            }
            Self::IdOverflow => write!(f, "id range exhausted u32 id space"),
        }
    }
}

impl Error for RangeError {}

/// Errors from layer-level operator management.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerError {
    /// An operator ID lies outside the layer's reserved range.
    InvalidId {
        /// The rejected ID.
        id: OperatorId,
    },
    /// An operator with this ID already exists in the layer.
    Duplicate {
        /// The conflicting ID.
        id: OperatorId,
    },
    /// A `rangeFinal` layer has no further IDs to allocate.
    LayerFull,
    /// Allocating a new ID would exceed `u32::MAX`.
    IdOverflow,
    /// The underlying reserved range became invalid.
    Range(RangeError),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId { id } => write!(f, "operator id {id} outside layer's reserved range"),
            Self::Duplicate { id } => write!(f, "operator id {id} already present in layer"),
            Self::LayerFull => write!(f, "layer is full; cannot allocate another id"),
            Self::IdOverflow => write!(f, "layer exhausted u32 id space"),
            Self::Range(e) => write!(f, "{e}"),
        }
    }
}

impl Error for LayerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Range(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RangeError> for LayerError {
    fn from(e: RangeError) -> Self {
        Self::Range(e)
    }
}

/// Errors from system-wide topology validation in the top controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyError {
    /// Zero or more than one layer has `rangeFinal == false`.
    DynamicLayerCount {
        /// How many non-final layers were found.
        found: usize,
    },
    /// The dynamic layer is not the one with the greatest reserved range.
    DynamicLayerNotLast,
    /// Two layers' reserved ranges overlap.
    OverlappingRanges,
    /// A layer block failed to deserialize.
    Serialize(SerializeError),
    /// A layer's internal invariants were violated.
    Layer(LayerError),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DynamicLayerCount { found } => write!(
                f,
                "exactly one layer must have rangeFinal == false, found {found}"
            ),
            Self::DynamicLayerNotLast => {
                write!(f, "dynamic layer must sort last among reserved ranges")
            }
            Self::OverlappingRanges => write!(f, "two layers have overlapping reserved ranges"),
            Self::Serialize(e) => write!(f, "{e}"),
            Self::Layer(e) => write!(f, "{e}"),
        }
    }
}

impl Error for TopologyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(e) => Some(e),
            Self::Layer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerializeError> for TopologyError {
    fn from(e: SerializeError) -> Self {
        Self::Serialize(e)
    }
}

impl From<LayerError> for TopologyError {
    fn from(e: LayerError) -> Self {
        Self::Layer(e)
    }
}

/// Errors surfaced by the simulator façade's public command surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FacadeError {
    /// A numeric argument was out of the accepted range (e.g. a negative step count).
    InvalidArgument {
        /// Description of the rejected argument.
        reason: String,
    },
    /// The requested operation is not allowed in the simulator's current state
    /// (e.g. `run` invoked while a run is already in progress).
    InvalidState {
        /// Description of the conflicting state.
        reason: String,
    },
    /// Loading a configuration or state blob failed; the simulator was reset to empty.
    Topology(TopologyError),
    /// Loading or saving binary data failed at the serialization layer.
    Serialize(SerializeError),
    /// A caller-supplied `Read`/`Write` failed. `std::io::Error` is neither
    /// `Clone` nor `Eq`, so only its rendered message is kept.
    Io {
        /// `io::Error`'s `Display` output.
        reason: String,
    },
}

impl fmt::Display for FacadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::InvalidState { reason } => write!(f, "invalid state: {reason}"),
            Self::Topology(e) => write!(f, "{e}"),
            Self::Serialize(e) => write!(f, "{e}"),
            Self::Io { reason } => write!(f, "i/o error: {reason}"),
        }
    }
}

impl Error for FacadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Topology(e) => Some(e),
            Self::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TopologyError> for FacadeError {
    fn from(e: TopologyError) -> Self {
        Self::Topology(e)
    }
}

impl From<SerializeError> for FacadeError {
    fn from(e: SerializeError) -> Self {
        Self::Serialize(e)
    }
}
