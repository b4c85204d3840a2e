//! The input-channel operator ("IN"): buffers incoming values and emits one
//! payload per buffered value every process phase.

use std::any::Any;

use netmesh_core::{Cursor, OpType, OperatorId, Payload, SerializeError};

use crate::operator::{encode_header, encode_routing, Operator};
use crate::routing::RoutingTable;
use crate::scheduling::SchedulingContext;

/// Input-channel operator. Has no persistent parameters; its only state is
/// a transient inbox that is never serialized.
#[derive(Clone, Debug)]
pub struct InOperator {
    id: OperatorId,
    routing: RoutingTable,
    inbox: Vec<i32>,
}

impl InOperator {
    /// Construct a new IN operator with an empty routing table and inbox.
    pub fn new(id: OperatorId) -> Self {
        Self {
            id,
            routing: RoutingTable::new(),
            inbox: Vec::new(),
        }
    }

    /// Current inbox contents (transient, not compared by `equals`).
    pub fn inbox(&self) -> &[i32] {
        &self.inbox
    }

    pub(crate) fn decode(id: OperatorId, cursor: &mut Cursor<'_>) -> Result<Self, SerializeError> {
        let routing = crate::operator::decode_routing(cursor)?;
        Ok(Self {
            id,
            routing,
            inbox: Vec::new(),
        })
    }
}

impl Operator for InOperator {
    fn id(&self) -> OperatorId {
        self.id
    }

    fn op_type(&self) -> OpType {
        OpType::In
    }

    fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    fn message_int(&mut self, v: i32) {
        self.inbox.push(v.max(0));
    }

    fn process_data(&mut self, ctx: &mut SchedulingContext<'_>) {
        if !self.routing.is_empty() {
            for &v in &self.inbox {
                ctx.schedule_payload(Payload::new(v, self.id));
            }
        }
        self.inbox.clear();
    }

    fn change_params(&mut self, _params: &[i32]) {}

    fn encode(&self, buf: &mut Vec<u8>) {
        encode_header(self.op_type(), self.id, buf);
        encode_routing(&self.routing, buf);
    }

    fn equals(&self, other: &dyn Operator) -> bool {
        let Some(other) = (other as &dyn Any).downcast_ref::<Self>() else {
            return false;
        };
        self.id == other.id && self.routing == other.routing
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_test_utils::RecordingBus;

    #[test]
    fn negative_values_are_coerced_to_zero() {
        let mut op = InOperator::new(OperatorId(1));
        op.message_int(-5);
        op.message_int(3);
        assert_eq!(op.inbox(), &[0, 3]);
    }

    #[test]
    fn process_data_emits_one_payload_per_inbox_value_when_routed() {
        let mut bus = RecordingBus::new();
        let mut op = InOperator::new(OperatorId(1));
        op.add_connection_internal(7, 0);
        op.message_int(1);
        op.message_int(2);
        op.message_int(3);
        let mut ctx = bus.context();
        op.process_data(&mut ctx);
        assert_eq!(bus.payloads.len(), 3);
        assert!(op.inbox().is_empty());
    }

    #[test]
    fn process_data_discards_values_with_no_routing() {
        let mut bus = RecordingBus::new();
        let mut op = InOperator::new(OperatorId(1));
        op.message_int(1);
        let mut ctx = bus.context();
        op.process_data(&mut ctx);
        assert_eq!(bus.payloads.len(), 0);
        assert!(op.inbox().is_empty());
    }

    #[test]
    fn equals_ignores_inbox() {
        let mut a = InOperator::new(OperatorId(1));
        let b = InOperator::new(OperatorId(1));
        a.message_int(42);
        assert!(a.equals(&b));
    }

    #[test]
    fn encode_decode_round_trip_preserves_routing() {
        let mut op = InOperator::new(OperatorId(3));
        op.add_connection_internal(10, 0);
        op.add_connection_internal(11, 1);

        let mut buf = Vec::new();
        op.encode(&mut buf);
        let mut cursor = Cursor::new(&buf[6..]);
        let decoded = InOperator::decode(OperatorId(3), &mut cursor).unwrap();
        assert!(op.equals(&decoded));
    }
}
