//! Dispatch an operator block to the right variant decoder by its leading
//! `opType` tag.

use netmesh_core::{Cursor, OpType, OperatorId, SerializeError};

use crate::add::AddOperator;
use crate::in_op::InOperator;
use crate::operator::Operator;
use crate::out_op::OutOperator;

/// Decode a full operator block (`[opType][id][routing][variant tail]`),
/// returning the boxed concrete variant as a trait object.
pub fn decode_operator(cursor: &mut Cursor<'_>) -> Result<Box<dyn Operator>, SerializeError> {
    let tag = cursor.read_u16()?;
    let op_type = OpType::from_wire_tag(tag).ok_or_else(|| SerializeError::Corrupt {
        reason: format!("unknown operator type tag {tag}"),
    })?;
    let id = OperatorId(cursor.read_u32()?);
    match op_type {
        OpType::Add => Ok(Box::new(AddOperator::decode(id, cursor)?)),
        OpType::In => Ok(Box::new(InOperator::decode(id, cursor)?)),
        OpType::Out => Ok(Box::new(OutOperator::decode(id, cursor)?)),
    }
}
