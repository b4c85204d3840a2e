//! The INPUT layer: exactly three IN-variant channel operators (text,
//! image, audio), always `range_final`.

use std::any::Any;

use netmesh_core::{Channel, IdRange, LayerError, LayerKind, OperatorId, Payload, SerializeError};
use netmesh_operator::{InOperator, Operator, SchedulingContext};
use netmesh_random::RandomSource;

use crate::core::LayerCore;
use crate::layer::Layer;

/// The INPUT layer. Always holds exactly three IN operators at
/// `reserved_range.min + {0,1,2}` (text, image, audio).
pub struct InputLayer {
    core: LayerCore,
}

impl InputLayer {
    /// Construct a fresh INPUT layer over `reserved_range`, creating its
    /// three channel operators. Fails if `reserved_range.count() != 3`.
    pub fn new(reserved_range: IdRange) -> Result<Self, LayerError> {
        let mut core = LayerCore::new(reserved_range, true);
        Self::ensure_channels(&mut core, reserved_range)?;
        Ok(Self { core })
    }

    /// Build from a deserialized core, recreating the three channel
    /// operators in place if the deserialized operator set does not
    /// satisfy the invariant (wrong count, wrong variant, or wrong IDs).
    pub(crate) fn from_decoded_core(mut core: LayerCore) -> Result<Self, SerializeError> {
        let range = core.reserved_range();
        if range.count() != 3 || !Self::has_valid_channels(&core, range) {
            core = LayerCore::new(range, true);
        }
        Self::ensure_channels(&mut core, range).map_err(|e| SerializeError::Corrupt {
            reason: format!("failed to establish INPUT layer channels: {e}"),
        })?;
        Ok(Self { core })
    }

    fn has_valid_channels(core: &LayerCore, range: IdRange) -> bool {
        Channel::ALL.iter().all(|c| {
            core.get_operator(OperatorId(range.min() + c.offset()))
                .is_some_and(|op| op.op_type() == netmesh_core::OpType::In)
        })
    }

    fn ensure_channels(core: &mut LayerCore, range: IdRange) -> Result<(), LayerError> {
        if range.count() != 3 {
            return Err(LayerError::InvalidId {
                id: OperatorId(range.min()),
            });
        }
        for channel in Channel::ALL {
            let id = OperatorId(range.min() + channel.offset());
            if core.get_operator(id).is_none() {
                core.add_operator(Box::new(InOperator::new(id)))?;
            }
        }
        Ok(())
    }

    fn channel_id(&self, channel: Channel) -> OperatorId {
        OperatorId(self.core.reserved_range().min() + channel.offset())
    }

    /// Enqueue one message delivery per byte of `s` to the text channel.
    pub fn input_text(&self, s: &str, ctx: &mut SchedulingContext<'_>) {
        let text_id = self.channel_id(Channel::Text);
        for b in s.bytes() {
            ctx.schedule_message(text_id, b as i32);
        }
    }

    /// Randomly initialize each of the three channel operators' connections
    /// against `connection_range`.
    pub fn random_init<R: RandomSource>(&mut self, connection_range: &IdRange, rng: &mut R) {
        for channel in Channel::ALL {
            let id = self.channel_id(channel);
            if let Some(op) = self
                .core
                .get_operator_mut(id)
                .and_then(|op| op.as_any_mut().downcast_mut::<InOperator>())
            {
                op.random_init(connection_range, rng);
            }
        }
    }
}

impl Layer for InputLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Input
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

    fn create_operator(&mut self, _op_type_tag: i32) -> Result<Option<OperatorId>, LayerError> {
        Ok(None)
    }

    fn delete_operator(&mut self, _id: OperatorId) -> bool {
        false
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
