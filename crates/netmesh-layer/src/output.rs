//! The OUTPUT layer: exactly three OUT-variant channel operators (text,
//! image, audio), always `range_final`.

use std::any::Any;

use netmesh_core::{Channel, IdRange, LayerError, LayerKind, OperatorId, Payload, SerializeError};
use netmesh_operator::{Operator, OutOperator, SchedulingContext};

use crate::core::LayerCore;
use crate::layer::Layer;

/// The OUTPUT layer. Always holds exactly three OUT operators at
/// `reserved_range.min + {0,1,2}` (text, image, audio).
pub struct OutputLayer {
    core: LayerCore,
}

impl OutputLayer {
    /// Construct a fresh OUTPUT layer over `reserved_range`, creating its
    /// three channel operators. Fails if `reserved_range.count() != 3`.
    pub fn new(reserved_range: IdRange) -> Result<Self, LayerError> {
        let mut core = LayerCore::new(reserved_range, true);
        Self::ensure_channels(&mut core, reserved_range)?;
        Ok(Self { core })
    }

    pub(crate) fn from_decoded_core(mut core: LayerCore) -> Result<Self, SerializeError> {
        let range = core.reserved_range();
        if range.count() != 3 || !Self::has_valid_channels(&core, range) {
            core = LayerCore::new(range, true);
        }
        Self::ensure_channels(&mut core, range).map_err(|e| SerializeError::Corrupt {
            reason: format!("failed to establish OUTPUT layer channels: {e}"),
        })?;
        Ok(Self { core })
    }

    fn has_valid_channels(core: &LayerCore, range: IdRange) -> bool {
        Channel::ALL.iter().all(|c| {
            core.get_operator(OperatorId(range.min() + c.offset()))
                .is_some_and(|op| op.op_type() == netmesh_core::OpType::Out)
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
                core.add_operator(Box::new(OutOperator::new(id)))?;
            }
        }
        Ok(())
    }

    fn channel_id(&self, channel: Channel) -> OperatorId {
        OperatorId(self.core.reserved_range().min() + channel.offset())
    }

    fn text_operator(&self) -> &OutOperator {
        self.core
            .get_operator(self.channel_id(Channel::Text))
            .and_then(|op| op.as_any().downcast_ref::<OutOperator>())
            .expect("OUTPUT layer always holds an OUT text channel")
    }

    fn text_operator_mut(&mut self) -> &mut OutOperator {
        let id = self.channel_id(Channel::Text);
        self.core
            .get_operator_mut(id)
            .and_then(|op| op.as_any_mut().downcast_mut::<OutOperator>())
            .expect("OUTPUT layer always holds an OUT text channel")
    }

    /// Whether the text channel has any buffered output.
    pub fn has_text_output(&self) -> bool {
        self.text_operator().has_output()
    }

    /// Drain the text channel's buffer as a string (see
    /// [`OutOperator::drain_as_text`]).
    pub fn text_output(&mut self) -> String {
        self.text_operator_mut().drain_as_text()
    }

    /// Number of values currently buffered on the text channel.
    pub fn text_count(&self) -> i32 {
        self.text_operator().text_count()
    }

    /// Set the text channel's advisory read batch size.
    pub fn set_text_batch_size(&mut self, n: usize) {
        self.text_operator_mut().set_text_batch_size(n);
    }

    /// Drop the text channel's buffered output without reading it.
    pub fn clear_text_output(&mut self) {
        self.text_operator_mut().clear_text_output();
    }
}

impl Layer for OutputLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Output
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_three_out_channels() {
        let layer = OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap();
        for c in Channel::ALL {
            let id = OperatorId(3 + c.offset());
            assert_eq!(layer.get_operator(id).unwrap().op_type(), netmesh_core::OpType::Out);
        }
    }

    #[test]
    fn text_channel_roundtrips_through_message_and_drain() {
        let mut layer = OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap();
        let text_id = OperatorId(3);
        // drain_as_text takes the top byte of a 32-bit value, so a value
        // destined for text output must be pre-scaled by <<23.
        layer.message_operator(text_id, ('h' as i32) << 23);
        layer.message_operator(text_id, ('i' as i32) << 23);
        assert!(layer.has_text_output());
        assert_eq!(layer.text_count(), 2);
        assert_eq!(layer.text_output(), "hi");
        assert!(!layer.has_text_output());
    }

    #[test]
    fn clear_text_output_drops_without_reading() {
        let mut layer = OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap();
        layer.message_operator(OperatorId(3), 1);
        layer.clear_text_output();
        assert!(!layer.has_text_output());
    }
}
