//! Strongly-typed identifiers and the operator/layer kind enums.

use std::fmt;

/// Identifies an operator uniquely across the whole network.
///
/// Operator IDs are 32-bit and never reused by the engine itself;
/// layers allocate them monotonically via `Layer::generate_next_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(pub u32);

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for OperatorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing step counter.
///
/// Incremented each time the executor advances one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub i64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StepId {
    /// The step following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// The closed set of operator variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpType {
    /// Accumulator-add operator: sums incoming messages, fires on threshold.
    Add,
    /// Input-channel operator: buffers incoming bytes, fires every step.
    In,
    /// Output-sink operator: accumulates outgoing bytes, never fires.
    Out,
}

impl OpType {
    /// The wire tag for this variant (used by the operator binary format).
    pub fn wire_tag(self) -> u16 {
        match self {
            Self::Add => 0,
            Self::In => 1,
            Self::Out => 2,
        }
    }

    /// Decode a wire tag back into a variant.
    pub fn from_wire_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::Add),
            1 => Some(Self::In),
            2 => Some(Self::Out),
            _ => None,
        }
    }

    /// The name used in JSON rendering and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The closed set of layer variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Holds exactly three IN-variant channel operators (text, image, audio).
    Input,
    /// Holds exactly three OUT-variant channel operators (text, image, audio).
    Output,
    /// Dynamically sized, typically holds ADD operators.
    Internal,
}

impl LayerKind {
    /// The wire tag for this variant (used by the layer binary format).
    pub fn wire_tag(self) -> u8 {
        match self {
            Self::Input => 0,
            Self::Output => 1,
            Self::Internal => 3,
        }
    }

    /// Decode a wire tag back into a variant.
    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Input),
            1 => Some(Self::Output),
            3 => Some(Self::Internal),
            _ => None,
        }
    }

    /// The name used in JSON rendering and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Channel ordinal within an INPUT/OUTPUT layer (offset from `reserved_range.min`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Text/byte-stream channel, offset 0.
    Text,
    /// Image channel, offset 1.
    Image,
    /// Audio channel, offset 2.
    Audio,
}

impl Channel {
    /// The three channels in their fixed offset order.
    pub const ALL: [Channel; 3] = [Channel::Text, Channel::Image, Channel::Audio];

    /// Offset from the owning layer's `reserved_range.min`.
    pub fn offset(self) -> u32 {
        match self {
            Self::Text => 0,
            Self::Image => 1,
            Self::Audio => 2,
        }
    }
}
