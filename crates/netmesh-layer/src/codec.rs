//! Shared binary envelope for layer blocks: `[kind][rangeFinal][payloadSize]`
//! followed by the reserved range and length-prefixed operator blocks.

use netmesh_core::{write_u32, Cursor, IdRange, LayerKind, SerializeError};
use netmesh_operator::decode_operator;

use crate::core::LayerCore;
use crate::input::InputLayer;
use crate::internal::InternalLayer;
use crate::layer::Layer;
use crate::output::OutputLayer;

/// Encode `[kind][rangeFinal][payloadSize]<reservedMin><reservedMax><operator
/// blocks>`, each operator block itself length-prefixed. Operators are
/// written in ascending ID order, a hard requirement of the format.
pub fn encode_layer_block(kind: LayerKind, range_final: bool, core: &LayerCore, buf: &mut Vec<u8>) {
    let mut payload = Vec::new();
    write_u32(&mut payload, core.reserved_range().min());
    write_u32(&mut payload, core.reserved_range().max());
    for op in core.operators_sorted() {
        let mut block = Vec::new();
        op.encode(&mut block);
        write_u32(&mut payload, block.len() as u32);
        payload.extend_from_slice(&block);
    }

    buf.push(kind.wire_tag());
    buf.push(u8::from(range_final));
    write_u32(buf, payload.len() as u32);
    buf.extend_from_slice(&payload);
}

/// Decode a layer block's reserved range and operators into a fresh
/// [`LayerCore`]. Does not enforce any variant-specific shape invariant
/// (e.g. INPUT/OUTPUT's three fixed channels) — callers fix that up.
fn decode_layer_core(payload: &mut Cursor<'_>, range_final: bool) -> Result<LayerCore, SerializeError> {
    let reserved_min = payload.read_u32()?;
    let reserved_max = payload.read_u32()?;
    let reserved_range = IdRange::new(reserved_min, reserved_max).map_err(|e| SerializeError::Corrupt {
        reason: format!("invalid reserved range in layer block: {e}"),
    })?;
    let mut core = LayerCore::new(reserved_range, range_final);
    while !payload.is_empty() {
        let block_size = payload.read_u32()? as usize;
        let block_bytes = payload.read_bytes(block_size)?;
        let mut block_cursor = Cursor::new(block_bytes);
        let op = decode_operator(&mut block_cursor)?;
        block_cursor.expect_exhausted()?;
        core.add_operator(op).map_err(|e| SerializeError::Corrupt {
            reason: format!("layer block operator rejected: {e}"),
        })?;
    }
    Ok(core)
}

/// Decode a full layer block (envelope plus payload), dispatching on the
/// leading `kind` byte to build the right concrete [`Layer`] variant.
pub fn decode_layer_block(cursor: &mut Cursor<'_>) -> Result<Box<dyn Layer>, SerializeError> {
    let kind_tag = cursor.read_u8()?;
    let kind = LayerKind::from_wire_tag(kind_tag).ok_or_else(|| SerializeError::Corrupt {
        reason: format!("unknown layer kind tag {kind_tag}"),
    })?;
    let range_final = cursor.read_u8()? != 0;
    let payload_size = cursor.read_u32()? as usize;
    let payload_bytes = cursor.read_bytes(payload_size)?;
    let mut payload_cursor = Cursor::new(payload_bytes);
    let core = decode_layer_core(&mut payload_cursor, range_final)?;
    payload_cursor.expect_exhausted()?;

    match kind {
        LayerKind::Input => Ok(Box::new(InputLayer::from_decoded_core(core)?)),
        LayerKind::Output => Ok(Box::new(OutputLayer::from_decoded_core(core)?)),
        LayerKind::Internal => Ok(Box::new(InternalLayer::from_core(core))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_internal_layer() {
        let mut layer = InternalLayer::new(IdRange::new(6, 6).unwrap(), false);
        let id = layer.create_operator(0).unwrap().unwrap();

        let mut buf = Vec::new();
        layer.encode(&mut buf);
        let mut cursor = Cursor::new(&buf);
        let decoded = decode_layer_block(&mut cursor).unwrap();
        cursor.expect_exhausted().unwrap();
        assert!(layer.equals(decoded.as_ref()));
        assert_eq!(decoded.get_operator(id).unwrap().id(), id);
    }
}
