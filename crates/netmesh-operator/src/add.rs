//! The accumulator-add operator ("ADD"): sums incoming messages and fires
//! a new payload when the accumulator exceeds a threshold.

use std::any::Any;

use netmesh_core::{write_i32, Cursor, OpType, OperatorId, Payload, SerializeError};

use crate::operator::{encode_header, encode_routing, Operator};
use crate::routing::RoutingTable;
use crate::scheduling::SchedulingContext;

/// Accumulator-add operator.
///
/// Holds two persistent parameters (`weight`, `threshold`) and a transient
/// accumulator `acc` that resets to zero every process phase.
#[derive(Clone, Debug)]
pub struct AddOperator {
    id: OperatorId,
    routing: RoutingTable,
    weight: i32,
    threshold: i32,
    acc: i32,
}

impl AddOperator {
    /// Construct a new ADD operator with the given ID and parameters. The
    /// accumulator starts at zero and the routing table is empty.
    pub fn new(id: OperatorId, weight: i32, threshold: i32) -> Self {
        Self {
            id,
            routing: RoutingTable::new(),
            weight,
            threshold,
            acc: 0,
        }
    }

    /// Current weight parameter.
    pub fn weight(&self) -> i32 {
        self.weight
    }

    /// Current threshold parameter.
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Current accumulator value (transient, not compared by `equals`).
    pub fn acc(&self) -> i32 {
        self.acc
    }

    pub(crate) fn decode(id: OperatorId, cursor: &mut Cursor<'_>) -> Result<Self, SerializeError> {
        let routing = crate::operator::decode_routing(cursor)?;
        let weight = cursor.read_i32()?;
        let threshold = cursor.read_i32()?;
        let acc = cursor.read_i32()?;
        Ok(Self {
            id,
            routing,
            weight,
            threshold,
            acc,
        })
    }
}

impl Operator for AddOperator {
    fn id(&self) -> OperatorId {
        self.id
    }

    fn op_type(&self) -> OpType {
        OpType::Add
    }

    fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    fn message_int(&mut self, v: i32) {
        self.acc = self.acc.saturating_add(v);
    }

    fn process_data(&mut self, ctx: &mut SchedulingContext<'_>) {
        if self.acc > self.threshold && !self.routing.is_empty() {
            let out = self.acc.saturating_add(self.weight);
            ctx.schedule_payload(Payload::new(out, self.id));
        }
        self.acc = 0;
    }

    fn change_params(&mut self, params: &[i32]) {
        if params.len() < 2 {
            return;
        }
        match params[0] {
            0 => self.weight = params[1],
            1 => self.threshold = params[1],
            _ => {}
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        encode_header(self.op_type(), self.id, buf);
        encode_routing(&self.routing, buf);
        write_i32(buf, self.weight);
        write_i32(buf, self.threshold);
        write_i32(buf, self.acc);
    }

    fn equals(&self, other: &dyn Operator) -> bool {
        let Some(other) = (other as &dyn Any).downcast_ref::<Self>() else {
            return false;
        };
        self.id == other.id
            && self.routing == other.routing
            && self.weight == other.weight
            && self.threshold == other.threshold
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
