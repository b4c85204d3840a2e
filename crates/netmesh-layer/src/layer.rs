//! The `Layer` trait: the shared contract every layer variant implements.

use std::any::Any;

use netmesh_core::{IdRange, LayerError, LayerKind, OperatorId, Payload};
use netmesh_operator::{Operator, SchedulingContext};

/// Shared behavior every layer variant exposes.
///
/// Object-safe: the top controller stores layers as `Box<dyn Layer>`.
/// `Layer: Any` enables [`Layer::equals`] to downcast for a same-variant
/// structural comparison.
pub trait Layer: Any {
    /// Which variant this is.
    fn kind(&self) -> LayerKind;

    /// The range of IDs this layer owns (may have grown if `!range_final`).
    fn reserved_range(&self) -> IdRange;

    /// Whether `reserved_range.max` is fixed.
    fn range_final(&self) -> bool;

    /// The smallest ID currently occupied, if any.
    fn current_min_id(&self) -> Option<u32>;

    /// The greatest ID currently occupied, if any.
    fn current_max_id(&self) -> Option<u32>;

    /// Look up an operator by ID.
    fn get_operator(&self, id: OperatorId) -> Option<&dyn Operator>;

    /// All owned operators, in ascending ID order.
    fn all_operators(&self) -> Vec<&dyn Operator>;

    /// Deliver `v` to `id`. Returns whether the operator exists.
    fn message_operator(&mut self, id: OperatorId, v: i32) -> bool;

    /// Run `id`'s process phase, if it exists.
    fn process_operator_data(&mut self, id: OperatorId, ctx: &mut SchedulingContext<'_>);

    /// Advance `payload` via its owning operator. Returns whether the
    /// operator exists.
    fn traverse_operator_payload(
        &self,
        payload: &mut Payload,
        ctx: &mut SchedulingContext<'_>,
    ) -> bool;

    /// Create a new operator of the variant named by `op_type_tag`,
    /// allocating its ID via `generate_next_id`. A no-op on a `range_final`
    /// layer (returns `Ok(None)`).
    fn create_operator(&mut self, op_type_tag: i32) -> Result<Option<OperatorId>, LayerError>;

    /// Delete the operator identified by `id`. A no-op (`false`) on a
    /// `range_final` layer or if `id` is not owned here.
    fn delete_operator(&mut self, id: OperatorId) -> bool;

    /// Forward a parameter change to the named operator, if it exists.
    fn change_operator_param(&mut self, id: OperatorId, params: &[i32]);

    /// Forward a connection add to the named operator, if it exists.
    fn add_operator_connection(&mut self, id: OperatorId, target: u32, distance: u16);

    /// Forward a connection removal to the named operator, if it exists.
    fn remove_operator_connection(&mut self, id: OperatorId, target: u32, distance: u16);

    /// Forward a connection move to the named operator, if it exists.
    fn move_operator_connection(
        &mut self,
        id: OperatorId,
        target: u32,
        old_distance: u16,
        new_distance: u16,
    );

    /// Encode this layer's `[kind][rangeFinal][payloadSize]<payload>` block.
    fn encode(&self, buf: &mut Vec<u8>);

    /// Structural equality: same kind, same `range_final`, same
    /// `reserved_range`, and pointwise-equal operator map.
    fn equals(&self, other: &dyn Layer) -> bool;

    /// Support downcasting for [`Layer::equals`] implementations.
    fn as_any(&self) -> &dyn Any;

    /// Support mutable downcasting, e.g. to reach a variant's own inherent
    /// methods (INPUT/OUTPUT's text-channel accessors) from a `dyn Layer`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
