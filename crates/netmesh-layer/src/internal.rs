//! The INTERNAL layer: a dynamically sized layer holding ADD operators by
//! default (other variants permitted via creation events).

use std::any::Any;

use netmesh_core::{IdRange, LayerError, LayerKind, OpType, OperatorId, Payload};
use netmesh_operator::{AddOperator, InOperator, Operator, OutOperator, SchedulingContext};
use netmesh_random::RandomSource;

use crate::core::LayerCore;
use crate::layer::Layer;

/// The INTERNAL layer. `range_final` defaults to `false` but either value
/// is permitted; unlike INPUT/OUTPUT, `create_operator`/`delete_operator`
/// are fully functional here.
pub struct InternalLayer {
    core: LayerCore,
}

impl InternalLayer {
    /// Construct an empty INTERNAL layer over `reserved_range`.
    pub fn new(reserved_range: IdRange, range_final: bool) -> Self {
        Self {
            core: LayerCore::new(reserved_range, range_final),
        }
    }

    pub(crate) fn from_core(core: LayerCore) -> Self {
        Self { core }
    }

    /// Create between `capacity / 2` and `capacity` ADD operators (each
    /// allocated via `generate_next_id`), then randomly initialize each
    /// one's parameters and connections against `connection_range`.
    pub fn random_init<R: RandomSource>(
        &mut self,
        capacity: u32,
        connection_range: &IdRange,
        rng: &mut R,
        ctx: &mut SchedulingContext<'_>,
    ) -> Result<(), LayerError> {
        let min_count = capacity / 2;
        let span = (capacity - min_count) as i32;
        let count = min_count as i32 + if span > 0 { rng.get_int(0, span) } else { 0 };
        for _ in 0..count {
            let id = self.core.generate_next_id()?;
            let mut op = AddOperator::new(id, 0, 0);
            op.random_init(connection_range, rng, ctx);
            self.core.add_operator(Box::new(op))?;
        }
        Ok(())
    }
}

impl Layer for InternalLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Internal
    }

    fn reserved_range(&self) -> IdRange {
        self.core.reserved_range()
    }

    fn range_final(&self) -> bool {
        self.core.range_final()
    }

    fn current_min_id(&self) -> Option<u32> {
        self.core.current_min_id()
    }

    fn current_max_id(&self) -> Option<u32> {
        self.core.current_max_id()
    }

    fn get_operator(&self, id: OperatorId) -> Option<&dyn Operator> {
        self.core.get_operator(id)
    }

    fn all_operators(&self) -> Vec<&dyn Operator> {
        self.core.operators_sorted()
    }

    fn message_operator(&mut self, id: OperatorId, v: i32) -> bool {
        self.core.message_operator(id, v)
    }

    fn process_operator_data(&mut self, id: OperatorId, ctx: &mut SchedulingContext<'_>) {
        self.core.process_operator_data(id, ctx);
    }

    fn traverse_operator_payload(
        &self,
        payload: &mut Payload,
        ctx: &mut SchedulingContext<'_>,
    ) -> bool {
        self.core.traverse_operator_payload(payload, ctx)
    }

    fn create_operator(&mut self, op_type_tag: i32) -> Result<Option<OperatorId>, LayerError> {
        let id = self.core.generate_next_id()?;
        let op: Box<dyn Operator> = match OpType::from_wire_tag(op_type_tag as u16) {
            Some(OpType::Add) | None => Box::new(AddOperator::new(id, 0, 0)),
            Some(OpType::In) => Box::new(InOperator::new(id)),
            Some(OpType::Out) => Box::new(OutOperator::new(id)),
        };
        self.core.add_operator(op)?;
        Ok(Some(id))
    }

    fn delete_operator(&mut self, id: OperatorId) -> bool {
        self.core.remove_operator(id).is_some()
    }

    fn change_operator_param(&mut self, id: OperatorId, params: &[i32]) {
        if let Some(op) = self.core.get_operator_mut(id) {
            op.change_params(params);
        }
    }

    fn add_operator_connection(&mut self, id: OperatorId, target: u32, distance: u16) {
        if let Some(op) = self.core.get_operator_mut(id) {
            op.add_connection_internal(target, distance);
        }
    }

    fn remove_operator_connection(&mut self, id: OperatorId, target: u32, distance: u16) {
        if let Some(op) = self.core.get_operator_mut(id) {
            op.remove_connection_internal(target, distance);
        }
    }

    fn move_operator_connection(
        &mut self,
        id: OperatorId,
        target: u32,
        old_distance: u16,
        new_distance: u16,
    ) {
        if let Some(op) = self.core.get_operator_mut(id) {
            op.move_connection_internal(target, old_distance, new_distance);
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        crate::codec::encode_layer_block(self.kind(), self.range_final(), &self.core, buf);
    }

    fn equals(&self, other: &dyn Layer) -> bool {
        let Some(other) = (other as &dyn Any).downcast_ref::<Self>() else {
            return false;
        };
        self.core.reserved_range() == other.core.reserved_range()
            && self.core.range_final() == other.core.range_final()
            && self.core.operators_equal(&other.core)
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
    use netmesh_random::PseudoRandomSource;
    use netmesh_test_utils::RecordingBus;

    #[test]
    fn create_operator_allocates_sequential_ids() {
        let mut layer = InternalLayer::new(IdRange::new(6, 6).unwrap(), false);
        let a = layer.create_operator(OpType::Add.wire_tag() as i32).unwrap().unwrap();
        let b = layer.create_operator(OpType::Add.wire_tag() as i32).unwrap().unwrap();
        assert_eq!(a, OperatorId(6));
        assert_eq!(b, OperatorId(7));
        assert_eq!(layer.reserved_range().max(), 7);
    }

    #[test]
    fn delete_operator_removes_it() {
        let mut layer = InternalLayer::new(IdRange::new(6, 6).unwrap(), false);
        let id = layer.create_operator(0).unwrap().unwrap();
        assert!(layer.delete_operator(id));
        assert!(layer.get_operator(id).is_none());
        assert!(!layer.delete_operator(id));
    }

    #[test]
    fn random_init_creates_between_half_and_full_capacity() {
        let mut layer = InternalLayer::new(IdRange::new(6, 6).unwrap(), false);
        let mut rng = PseudoRandomSource::new(5);
        let mut bus = RecordingBus::new();
        let conn_range = IdRange::new(3, 10).unwrap();
        {
            let mut ctx = bus.context();
            layer.random_init(4, &conn_range, &mut rng, &mut ctx).unwrap();
        }
        assert!(layer.all_operators().len() >= 2);
        assert!(layer.all_operators().len() <= 4);
    }
}
