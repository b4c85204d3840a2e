//! Owns the ordered set of layers and routes operator-level operations to
//! whichever layer's reserved range contains the target ID.

use netmesh_core::{Cursor, IdRange, OperatorId, TopologyError, UpdateEvent, UpdateKind};
use netmesh_layer::{decode_layer_block, InputLayer, InternalLayer, Layer, OutputLayer};
use netmesh_operator::{Operator, SchedulingContext};
use netmesh_random::RandomSource;

use crate::bus::EngineBus;
use crate::update_queue::UpdateQueue;

/// The first ID reserved for the INTERNAL layer in a freshly randomized
/// network; INPUT occupies `[0,2]` and OUTPUT `[3,5]`.
const INTERNAL_RANGE_MIN: u32 = 6;

/// Owns an ordered list of layers and enforces the system-wide topology
/// invariant: exactly one non-`rangeFinal` layer, sorting last among
/// reserved ranges, with no overlaps.
#[derive(Default)]
pub struct TopController {
    layers: Vec<Box<dyn Layer>>,
}

impl TopController {
    /// Construct a controller holding no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the layer set with `layers`, sorting by reserved range and
    /// validating the result. On failure, the controller is left holding no
    /// layers at all (mirroring `loadConfiguration`'s "failure resets
    /// state" contract).
    pub fn load_layers(&mut self, mut layers: Vec<Box<dyn Layer>>) -> Result<(), TopologyError> {
        layers.sort_by_key(|l| l.reserved_range());
        if let Err(e) = Self::validate(&layers) {
            self.layers = Vec::new();
            return Err(e);
        }
        self.layers = layers;
        Ok(())
    }

    /// Clear all state and build a fresh INPUT/OUTPUT/INTERNAL network:
    /// INPUT over `[0,2]`, OUTPUT over `[3,5]`, INTERNAL over
    /// `[6, 6+numInternal-1]` (an empty-but-valid `[6,6]` range when
    /// `numInternal == 0`). Connections drawn during random init target
    /// `[3, internalMax]`.
    pub fn randomize_network<R: RandomSource>(
        &mut self,
        num_internal: u32,
        rng: &mut R,
        queue: &mut UpdateQueue,
    ) -> Result<(), TopologyError> {
        let internal_max = if num_internal == 0 {
            INTERNAL_RANGE_MIN
        } else {
            INTERNAL_RANGE_MIN + num_internal - 1
        };
        let connection_range =
            IdRange::new(3, internal_max).expect("internal_max is always >= 3");

        let mut input_layer =
            InputLayer::new(IdRange::new(0, 2).expect("[0,2] is always valid"))?;
        let output_layer =
            OutputLayer::new(IdRange::new(3, 5).expect("[3,5] is always valid"))?;
        let mut internal_layer = InternalLayer::new(
            IdRange::new(INTERNAL_RANGE_MIN, internal_max)
                .expect("internal_max is always >= INTERNAL_RANGE_MIN"),
            false,
        );

        input_layer.random_init(&connection_range, rng);

        if num_internal > 0 {
            let mut pending_messages = Vec::new();
            let mut next = Vec::new();
            let mut bus = EngineBus::new(&mut pending_messages, &mut next, queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            internal_layer.random_init(num_internal, &connection_range, rng, &mut ctx)?;
        }

        self.load_layers(vec![
            Box::new(input_layer),
            Box::new(output_layer),
            Box::new(internal_layer),
        ])
    }

    /// Decode a configuration blob into a fresh layer set (see
    /// [`netmesh_layer::decode_layer_block`]'s per-layer envelope format).
    /// Any trailing bytes or decode failure resets the controller to empty
    /// and surfaces the error.
    pub fn load_configuration(&mut self, bytes: &[u8]) -> Result<(), TopologyError> {
        let mut cursor = Cursor::new(bytes);
        let mut layers = Vec::new();
        let decoded: Result<(), TopologyError> = (|| {
            while !cursor.is_empty() {
                layers.push(decode_layer_block(&mut cursor)?);
            }
            Ok(())
        })();
        if let Err(e) = decoded {
            self.layers = Vec::new();
            return Err(e);
        }
        self.load_layers(layers)
    }

    /// Concatenate each layer's serialized block in the controller's
    /// current (sorted) order.
    pub fn save_configuration(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for layer in &self.layers {
            layer.encode(&mut buf);
        }
        buf
    }

    /// Number of layers currently held.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total number of operators across every layer.
    pub fn operator_count(&self) -> usize {
        self.layers.iter().map(|l| l.all_operators().len()).sum()
    }

    /// The unique layer whose reserved range contains `id`, if any.
    pub fn find_layer_for_operator(&self, id: OperatorId) -> Option<&dyn Layer> {
        self.layers
            .iter()
            .find(|l| l.reserved_range().contains(id.0))
            .map(|b| b.as_ref())
    }

    /// As [`TopController::find_layer_for_operator`], mutably.
    pub fn find_layer_for_operator_mut(&mut self, id: OperatorId) -> Option<&mut dyn Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.reserved_range().contains(id.0))
            .map(|b| b.as_mut())
    }

    /// Look up an operator by ID, wherever it lives.
    pub fn get_operator(&self, id: OperatorId) -> Option<&dyn Operator> {
        self.find_layer_for_operator(id)?.get_operator(id)
    }

    /// Deliver `v` to `id`. Returns whether the operator exists.
    pub fn message_op(&mut self, id: OperatorId, v: i32) -> bool {
        match self.find_layer_for_operator_mut(id) {
            Some(layer) => layer.message_operator(id, v),
            None => false,
        }
    }

    /// Run `id`'s process phase, if it exists.
    pub fn process_op_data(&mut self, id: OperatorId, ctx: &mut SchedulingContext<'_>) {
        if let Some(layer) = self.find_layer_for_operator_mut(id) {
            layer.process_operator_data(id, ctx);
        }
    }

    /// Advance `payload` via its owning operator. Returns whether the
    /// operator exists.
    pub fn traverse_payload(&self, payload: &mut netmesh_core::Payload, ctx: &mut SchedulingContext<'_>) -> bool {
        match self.find_layer_for_operator(payload.current_operator_id) {
            Some(layer) => layer.traverse_operator_payload(payload, ctx),
            None => false,
        }
    }

    /// Create an operator of variant `op_type_tag` in the one dynamic
    /// (non-`rangeFinal`) layer.
    pub fn create_operator_in_dynamic_layer(
        &mut self,
        op_type_tag: i32,
    ) -> Result<Option<OperatorId>, netmesh_core::LayerError> {
        match self.layers.iter_mut().find(|l| !l.range_final()) {
            Some(layer) => layer.create_operator(op_type_tag),
            None => Ok(None),
        }
    }

    /// Apply a single structural mutation. `CreateOperator` always targets
    /// the dynamic layer, ignoring `event.target`; every other kind targets
    /// the layer containing `event.target`. Events addressed to a
    /// non-existent operator are silently dropped.
    pub fn dispatch_update(&mut self, event: &UpdateEvent) {
        match event.kind {
            UpdateKind::AddConnection => {
                if let (Some(&target), Some(&distance)) =
                    (event.params.first(), event.params.get(1))
                {
                    if let Some(layer) = self.find_layer_for_operator_mut(event.target) {
                        layer.add_operator_connection(event.target, target as u32, distance as u16);
                    }
                }
            }
            UpdateKind::RemoveConnection => {
                if let (Some(&target), Some(&distance)) =
                    (event.params.first(), event.params.get(1))
                {
                    if let Some(layer) = self.find_layer_for_operator_mut(event.target) {
                        layer.remove_operator_connection(event.target, target as u32, distance as u16);
                    }
                }
            }
            UpdateKind::MoveConnection => {
                if let (Some(&target), Some(&old_d), Some(&new_d)) = (
                    event.params.first(),
                    event.params.get(1),
                    event.params.get(2),
                ) {
                    if let Some(layer) = self.find_layer_for_operator_mut(event.target) {
                        layer.move_operator_connection(
                            event.target,
                            target as u32,
                            old_d as u16,
                            new_d as u16,
                        );
                    }
                }
            }
            UpdateKind::ChangeParams => {
                if let Some(layer) = self.find_layer_for_operator_mut(event.target) {
                    layer.change_operator_param(event.target, &event.params);
                }
            }
            UpdateKind::CreateOperator => {
                let op_type_tag = event.params.first().copied().unwrap_or(0);
                let _ = self.create_operator_in_dynamic_layer(op_type_tag);
            }
            UpdateKind::DeleteOperator => {
                if let Some(layer) = self.find_layer_for_operator_mut(event.target) {
                    layer.delete_operator(event.target);
                }
            }
        }
    }

    /// Enqueue one message delivery per byte of `s` to the INPUT layer's
    /// text channel. A no-op if no INPUT layer is present.
    pub fn input_text(&self, s: &str, ctx: &mut SchedulingContext<'_>) {
        if let Some(input) = self.input_layer() {
            input.input_text(s, ctx);
        }
    }

    /// Drain the OUTPUT layer's text channel buffer as a string. Returns
    /// an empty string if no OUTPUT layer is present.
    pub fn output_text(&mut self) -> String {
        self.output_layer_mut()
            .map(|l| l.text_output())
            .unwrap_or_default()
    }

    /// Number of values currently buffered on the OUTPUT layer's text
    /// channel.
    pub fn text_count(&self) -> i32 {
        self.output_layer().map(|l| l.text_count()).unwrap_or(0)
    }

    /// Drop the OUTPUT layer's buffered text output without reading it.
    pub fn clear_text_output(&mut self) {
        if let Some(layer) = self.output_layer_mut() {
            layer.clear_text_output();
        }
    }

    /// Set the OUTPUT layer's text channel advisory read batch size.
    pub fn set_text_batch_size(&mut self, n: usize) {
        if let Some(layer) = self.output_layer_mut() {
            layer.set_text_batch_size(n);
        }
    }

    /// All layers, in their current sorted order (for JSON rendering).
    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    fn input_layer(&self) -> Option<&InputLayer> {
        self.layers.iter().find_map(|l| l.as_any().downcast_ref::<InputLayer>())
    }

    fn output_layer(&self) -> Option<&OutputLayer> {
        self.layers.iter().find_map(|l| l.as_any().downcast_ref::<OutputLayer>())
    }

    fn output_layer_mut(&mut self) -> Option<&mut OutputLayer> {
        self.layers
            .iter_mut()
            .find_map(|l| l.as_any_mut().downcast_mut::<OutputLayer>())
    }

    fn validate(layers: &[Box<dyn Layer>]) -> Result<(), TopologyError> {
        let dynamic_count = layers.iter().filter(|l| !l.range_final()).count();
        if dynamic_count != 1 {
            return Err(TopologyError::DynamicLayerCount { found: dynamic_count });
        }
        if !layers.last().is_some_and(|l| !l.range_final()) {
            return Err(TopologyError::DynamicLayerNotLast);
        }
        for pair in layers.windows(2) {
            if pair[0].reserved_range().overlaps(&pair[1].reserved_range()) {
                return Err(TopologyError::OverlappingRanges);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_random::PseudoRandomSource;

    fn fresh_network(num_internal: u32) -> (TopController, UpdateQueue) {
        let mut controller = TopController::new();
        let mut queue = UpdateQueue::new();
        let mut rng = PseudoRandomSource::new(7);
        controller
            .randomize_network(num_internal, &mut rng, &mut queue)
            .unwrap();
        (controller, queue)
    }

    #[test]
    fn randomize_network_builds_three_layers() {
        let (controller, _) = fresh_network(4);
        assert_eq!(controller.layer_count(), 3);
    }

    #[test]
    fn randomize_network_accepts_zero_internal_operators() {
        let (controller, _) = fresh_network(0);
        assert_eq!(controller.layer_count(), 3);
        let internal = controller
            .layers()
            .iter()
            .find(|l| l.kind() == netmesh_core::LayerKind::Internal)
            .unwrap();
        assert_eq!(internal.reserved_range(), IdRange::new(6, 6).unwrap());
        assert!(internal.all_operators().is_empty());
    }

    #[test]
    fn load_layers_rejects_missing_dynamic_layer() {
        let mut controller = TopController::new();
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(InputLayer::new(IdRange::new(0, 2).unwrap()).unwrap()),
            Box::new(OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap()),
        ];
        assert!(controller.load_layers(layers).is_err());
        assert_eq!(controller.layer_count(), 0);
    }

    #[test]
    fn load_layers_rejects_overlapping_ranges() {
        let mut controller = TopController::new();
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(InputLayer::new(IdRange::new(0, 2).unwrap()).unwrap()),
            Box::new(InternalLayer::new(IdRange::new(2, 5).unwrap(), false)),
        ];
        assert!(matches!(
            controller.load_layers(layers),
            Err(TopologyError::OverlappingRanges)
        ));
    }

    #[test]
    fn input_text_and_output_round_trip_through_a_direct_connection() {
        let (mut controller, mut queue) = fresh_network(0);
        // Wire the text INPUT channel directly to the text OUTPUT channel.
        controller.dispatch_update(&UpdateEvent::add_connection(
            OperatorId(0),
            OperatorId(3),
            0,
        ));
        queue.process_all(&mut controller);

        let mut pending = Vec::new();
        let mut next = Vec::new();
        {
            let mut bus = EngineBus::new(&mut pending, &mut next, &mut queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            controller.input_text("h", &mut ctx);
        }
        for (target, v) in pending.drain(..) {
            controller.message_op(target, v);
        }
        {
            let mut bus = EngineBus::new(&mut pending, &mut next, &mut queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            controller.process_op_data(OperatorId(0), &mut ctx);
        }
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].message, b'h' as i32);
    }

    #[test]
    fn create_operator_ignores_event_target_and_uses_dynamic_layer() {
        let (mut controller, _) = fresh_network(0);
        controller.dispatch_update(&UpdateEvent::create_operator(OperatorId(0), 0));
        assert_eq!(controller.operator_count(), 7);
    }

    #[test]
    fn events_targeting_missing_operators_are_silently_dropped() {
        let (mut controller, _) = fresh_network(0);
        controller.dispatch_update(&UpdateEvent::delete_operator(OperatorId(9999)));
        assert_eq!(controller.operator_count(), 6);
    }
}
