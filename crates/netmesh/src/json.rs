//! Deterministic JSON rendering for `print-network`, `print-current-payloads`,
//! and `print-next-payloads`.
//!
//! Ordering is never left to a hash map: layers are rendered in the order
//! [`TopController`] already keeps them (sorted by `reservedRange`),
//! operators within a layer in the `all_operators()` ascending-ID order,
//! and routing slots via [`RoutingTable::sorted_buckets`].

use netmesh_core::Payload;
use netmesh_engine::TopController;
use netmesh_operator::RoutingTable;
use serde::Serialize;

#[derive(Serialize)]
struct NetworkDoc {
    layers: Vec<LayerDoc>,
}

#[derive(Serialize)]
struct LayerDoc {
    kind: &'static str,
    range_final: bool,
    reserved_min: u32,
    reserved_max: u32,
    operator_count: usize,
    operators: Vec<OperatorDoc>,
}

#[derive(Serialize)]
struct OperatorDoc {
    op_type: &'static str,
    operator_id: u32,
    routing: Vec<RoutingSlotDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    acc: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_batch_size: Option<usize>,
}

#[derive(Serialize)]
struct RoutingSlotDoc {
    distance: u16,
    targets: Vec<u32>,
}

fn routing_doc(routing: &RoutingTable) -> Vec<RoutingSlotDoc> {
    routing
        .sorted_buckets()
        .into_iter()
        .map(|(distance, targets)| {
            let mut targets: Vec<u32> = targets.iter().copied().collect();
            targets.sort_unstable();
            RoutingSlotDoc { distance, targets }
        })
        .collect()
}

fn operator_doc(op: &dyn netmesh_operator::Operator) -> OperatorDoc {
    let mut doc = OperatorDoc {
        op_type: op.op_type().name(),
        operator_id: op.id().0,
        routing: routing_doc(op.routing()),
        weight: None,
        threshold: None,
        acc: None,
        text_batch_size: None,
    };
    if let Some(add) = op.as_any().downcast_ref::<netmesh_operator::AddOperator>() {
        doc.weight = Some(add.weight());
        doc.threshold = Some(add.threshold());
        doc.acc = Some(add.acc());
    } else if let Some(out) = op.as_any().downcast_ref::<netmesh_operator::OutOperator>() {
        doc.text_batch_size = Some(out.text_batch_size());
    }
    doc
}

/// Render every layer and operator in `controller` as JSON.
pub fn network_json(controller: &TopController, pretty: bool) -> String {
    let doc = NetworkDoc {
        layers: controller
            .layers()
            .iter()
            .map(|layer| LayerDoc {
                kind: layer.kind().name(),
                range_final: layer.range_final(),
                reserved_min: layer.reserved_range().min(),
                reserved_max: layer.reserved_range().max(),
                operator_count: layer.all_operators().len(),
                operators: layer.all_operators().into_iter().map(operator_doc).collect(),
            })
            .collect(),
    };
    render(&doc, pretty)
}

#[derive(Serialize)]
struct PayloadDoc {
    message: i32,
    current_operator_id: u32,
    distance_traveled: u16,
    active: bool,
}

impl From<&Payload> for PayloadDoc {
    fn from(p: &Payload) -> Self {
        Self {
            message: p.message,
            current_operator_id: p.current_operator_id.0,
            distance_traveled: p.distance_traveled,
            active: p.active,
        }
    }
}

/// Render a slice of in-flight payloads (`current` or `next`) as a JSON array.
pub fn payloads_json(payloads: &[Payload], pretty: bool) -> String {
    let docs: Vec<PayloadDoc> = payloads.iter().map(PayloadDoc::from).collect();
    render(&docs, pretty)
}

fn render<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .expect("JSON rendering of internal simulator state never fails")
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_core::{IdRange, OperatorId};
    use netmesh_engine::TopController;
    use netmesh_layer::{InputLayer, InternalLayer, OutputLayer};

    fn fresh_network() -> TopController {
        let mut controller = TopController::new();
        controller
            .load_layers(vec![
                Box::new(InputLayer::new(IdRange::new(0, 2).unwrap()).unwrap()),
                Box::new(OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap()),
                Box::new(InternalLayer::new(IdRange::new(6, 6).unwrap(), false)),
            ])
            .unwrap();
        controller
    }

    #[test]
    fn network_json_orders_layers_by_reserved_range() {
        let controller = fresh_network();
        let json = network_json(&controller, false);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let layers = parsed["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0]["kind"], "INPUT");
        assert_eq!(layers[1]["kind"], "OUTPUT");
        assert_eq!(layers[2]["kind"], "INTERNAL");
    }

    #[test]
    fn network_json_includes_add_operator_fields() {
        let mut controller = fresh_network();
        let id = controller.create_operator_in_dynamic_layer(0).unwrap().unwrap();
        controller.dispatch_update(&netmesh_core::UpdateEvent::add_connection(
            id,
            OperatorId(3),
            1,
        ));
        let json = network_json(&controller, false);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let internal_ops = parsed["layers"][2]["operators"].as_array().unwrap();
        assert_eq!(internal_ops.len(), 1);
        assert_eq!(internal_ops[0]["op_type"], "ADD");
        assert!(internal_ops[0]["weight"].is_number());
        assert_eq!(internal_ops[0]["routing"][0]["distance"], 1);
        assert_eq!(internal_ops[0]["routing"][0]["targets"][0], 3);
    }

    #[test]
    fn payloads_json_renders_every_field() {
        let payloads = vec![Payload::new(7, OperatorId(1))];
        let json = payloads_json(&payloads, false);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["message"], 7);
        assert_eq!(parsed[0]["current_operator_id"], 1);
        assert_eq!(parsed[0]["active"], true);
    }

    #[test]
    fn pretty_printing_uses_two_space_indentation() {
        let controller = fresh_network();
        let json = network_json(&controller, true);
        assert!(json.lines().any(|l| l.starts_with("  \"layers\"")));
    }
}
