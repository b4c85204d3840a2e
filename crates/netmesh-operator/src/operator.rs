//! The `Operator` trait: the shared contract every operator variant
//! implements, plus the `traverse` and floating-point `message` logic that
//! is identical across variants.

use std::any::Any;

use netmesh_core::{OpType, OperatorId, Payload, SerializeError};

use crate::routing::RoutingTable;
use crate::scheduling::SchedulingContext;

/// Round `v` to the nearest integer, ties away from zero, then clamp to
/// `[i32::MIN, i32::MAX]`. Returns `None` for NaN or infinite input, which
/// callers discard rather than deliver.
fn round_and_clamp(v: f64) -> Option<i32> {
    if !v.is_finite() {
        return None;
    }
    let rounded = v.round();
    Some(if rounded >= i32::MAX as f64 {
        i32::MAX
    } else if rounded <= i32::MIN as f64 {
        i32::MIN
    } else {
        rounded as i32
    })
}

/// Shared behavior every operator variant exposes.
///
/// Object-safe: the engine stores operators as `Box<dyn Operator>` inside
/// each layer. `Operator: Any` enables [`Operator::equals`] to downcast to
/// a concrete type for a deep-equality comparison.
pub trait Operator: Any {
    /// This operator's unique ID.
    fn id(&self) -> OperatorId;

    /// Which variant this is.
    fn op_type(&self) -> OpType;

    /// The output routing table (read access, e.g. for `traverse`).
    fn routing(&self) -> &RoutingTable;

    /// The output routing table (write access, for connection mutation).
    fn routing_mut(&mut self) -> &mut RoutingTable;

    /// Deliver an integer datum. Variant-specific accumulation.
    fn message_int(&mut self, v: i32);

    /// Deliver a `f32` datum: round to nearest (ties away from zero),
    /// clamp to `i32` range, discard NaN/infinite input.
    fn message_f32(&mut self, v: f32) {
        if let Some(i) = round_and_clamp(v as f64) {
            self.message_int(i);
        }
    }

    /// Deliver a `f64` datum, same discard/round/clamp rule as `message_f32`.
    fn message_f64(&mut self, v: f64) {
        if let Some(i) = round_and_clamp(v) {
            self.message_int(i);
        }
    }

    /// Run this operator's process phase, possibly scheduling new payloads
    /// via `ctx`.
    fn process_data(&mut self, ctx: &mut SchedulingContext<'_>);

    /// Advance a payload owned by this operator by one routing hop.
    ///
    /// Shared across all variants: look up the routing bucket at the
    /// payload's current distance, enqueue a delivery per target, then
    /// advance the distance or deactivate the payload if this was the last
    /// hop (or the bucket was empty).
    fn traverse(&self, payload: &mut Payload, ctx: &mut SchedulingContext<'_>) {
        let d = payload.distance_traveled;
        let max_idx = self.routing().max_distance();
        match self.routing().targets_at(d) {
            Some(targets) => {
                for &t in targets {
                    ctx.schedule_message(OperatorId(t), payload.message);
                }
                if Some(d) == max_idx {
                    payload.active = false;
                } else {
                    payload.distance_traveled = d + 1;
                }
            }
            None => {
                payload.active = false;
            }
        }
    }

    /// Add a routing-table entry. Called only by the update dispatcher.
    fn add_connection_internal(&mut self, target: u32, distance: u16) {
        self.routing_mut().add(target, distance);
    }

    /// Remove a routing-table entry, if present. Called only by the update
    /// dispatcher.
    fn remove_connection_internal(&mut self, target: u32, distance: u16) {
        self.routing_mut().remove(target, distance);
    }

    /// Relocate a routing-table entry. Called only by the update
    /// dispatcher.
    fn move_connection_internal(&mut self, target: u32, old_distance: u16, new_distance: u16) {
        self.routing_mut()
            .move_target(target, old_distance, new_distance);
    }

    /// Apply variant-specific parameter changes.
    fn change_params(&mut self, params: &[i32]);

    /// Encode this operator's `[opType][id][routing][variant tail]` block.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Deep-equality over persistent state, ignoring transient accumulators.
    fn equals(&self, other: &dyn Operator) -> bool;

    /// Support downcasting for [`Operator::equals`] implementations.
    fn as_any(&self) -> &dyn Any;

    /// Support mutable downcasting, e.g. for OUTPUT layers reaching their
    /// concrete `OutOperator` text channel.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Encode the `[opType][operatorId]` common header shared by every variant.
pub(crate) fn encode_header(op_type: OpType, id: OperatorId, buf: &mut Vec<u8>) {
    use netmesh_core::{write_u16, write_u32};
    write_u16(buf, op_type.wire_tag());
    write_u32(buf, id.0);
}

/// Encode a routing table in the ascending-distance order the binary format
/// requires.
pub(crate) fn encode_routing(routing: &RoutingTable, buf: &mut Vec<u8>) {
    use netmesh_core::write_u16;
    let buckets = routing.sorted_buckets();
    write_u16(buf, buckets.len() as u16);
    for (distance, targets) in buckets {
        write_u16(buf, distance);
        write_u16(buf, targets.len() as u16);
        let mut ids: Vec<u32> = targets.iter().copied().collect();
        ids.sort_unstable();
        for id in ids {
            netmesh_core::write_u32(buf, id);
        }
    }
}

/// Decode a routing table written by [`encode_routing`].
pub(crate) fn decode_routing(
    cursor: &mut netmesh_core::Cursor<'_>,
) -> Result<RoutingTable, SerializeError> {
    let mut table = RoutingTable::new();
    let num_buckets = cursor.read_u16()?;
    for _ in 0..num_buckets {
        let distance = cursor.read_u16()?;
        let num_targets = cursor.read_u16()?;
        for _ in 0..num_targets {
            let target = cursor.read_u32()?;
            table.add(target, distance);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_and_clamp_discards_nan_and_infinite() {
        assert_eq!(round_and_clamp(f64::NAN), None);
        assert_eq!(round_and_clamp(f64::INFINITY), None);
        assert_eq!(round_and_clamp(f64::NEG_INFINITY), None);
    }

    #[test]
    fn round_and_clamp_rounds_ties_away_from_zero() {
        assert_eq!(round_and_clamp(2.5), Some(3));
        assert_eq!(round_and_clamp(-2.5), Some(-3));
    }

    #[test]
    fn round_and_clamp_saturates_at_i32_bounds() {
        assert_eq!(round_and_clamp(1e30), Some(i32::MAX));
        assert_eq!(round_and_clamp(-1e30), Some(i32::MIN));
    }
}
