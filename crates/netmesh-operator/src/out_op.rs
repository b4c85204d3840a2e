//! The output-sink operator ("OUT"): accumulates outgoing values and
//! exposes them as text via [`OutOperator::drain_as_text`].

use std::any::Any;

use netmesh_core::{write_i32, write_u16, Cursor, OpType, OperatorId, SerializeError};

use crate::operator::{encode_header, encode_routing, Operator};
use crate::routing::RoutingTable;
use crate::scheduling::SchedulingContext;

/// Default number of bytes [`OutOperator::drain_as_text`]'s caller is
/// expected to read per call; purely advisory bookkeeping, `drain_as_text`
/// itself always drains everything buffered.
pub const DEFAULT_TEXT_BATCH_SIZE: usize = 512;

/// Output-sink operator. Never emits payloads; `processData` is a no-op.
#[derive(Clone, Debug)]
pub struct OutOperator {
    id: OperatorId,
    routing: RoutingTable,
    data: Vec<i32>,
    text_batch_size: usize,
}

impl OutOperator {
    /// Construct a new OUT operator with an empty routing table and buffer.
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            routing: RoutingTable::new(),
            data: Vec::new(),
            text_batch_size: DEFAULT_TEXT_BATCH_SIZE,
        }
    }

    /// The buffered values, in arrival order.
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Whether any values are buffered.
    pub fn has_output(&self) -> bool {
        !self.data.is_empty()
    }

    /// Number of buffered values.
    pub fn text_count(&self) -> i32 {
        self.data.len() as i32
    }

    /// Set the caller-facing read batch size.
    pub fn set_text_batch_size(&mut self, n: usize) {
        self.text_batch_size = n;
    }

    /// The current read batch size.
    pub fn text_batch_size(&self) -> usize {
        self.text_batch_size
    }

    /// Drop every buffered value without reading it.
    pub fn clear_text_output(&mut self) {
        self.data.clear();
    }

    /// Map each buffered value to a byte (its top 8 value-bits, after
    /// clamping negative values to zero), clear the buffer, and return the
    /// resulting string. Non-UTF-8 byte sequences are replaced per
    /// [`String::from_utf8_lossy`].
    pub fn drain_as_text(&mut self) -> String {
        let bytes: Vec<u8> = self
            .data
            .iter()
            .map(|&v| ((v.max(0) as u32) >> 23) as u8)
            .collect();
        self.data.clear();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub(crate) fn decode(id: OperatorId, cursor: &mut Cursor<'_>) -> Result<Self, SerializeError> {
        let routing = crate::operator::decode_routing(cursor)?;
        let count = cursor.read_u16()?;
        let mut data = Vec::with_capacity(count as usize);
        for _ in 0..count {
            data.push(cursor.read_i32()?);
        }
        Ok(Self {
            id,
            routing,
            data,
            text_batch_size: DEFAULT_TEXT_BATCH_SIZE,
        })
    }
}

impl Operator for OutOperator {
    fn id(&self) -> OperatorId {
        self.id
    }

    fn op_type(&self) -> OpType {
        OpType::Out
    }

    fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    fn message_int(&mut self, v: i32) {
        self.data.push(v);
    }

    fn process_data(&mut self, _ctx: &mut SchedulingContext<'_>) {}

    fn change_params(&mut self, _params: &[i32]) {}

    fn encode(&self, buf: &mut Vec<u8>) {
        encode_header(self.op_type(), self.id, buf);
        encode_routing(&self.routing, buf);
        write_u16(buf, self.data.len() as u16);
        for &v in &self.data {
            write_i32(buf, v);
        }
    }

    fn equals(&self, other: &dyn Operator) -> bool {
        let Some(other) = (other as &dyn Any).downcast_ref::<Self>() else {
            return false;
        };
        self.id == other.id && self.routing == other.routing && self.data == other.data
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
