//! Wires a minimal INPUT -> ADD -> OUTPUT network by hand, submits text,
//! and runs the simulator to completion.
//!
//! Run with:
//!
//! ```sh
//! cargo run --example two_hop_delivery -p netmesh
//! ```

use netmesh_core::{IdRange, OperatorId, UpdateEvent};
use netmesh_engine::TopController;
use netmesh_layer::{InputLayer, InternalLayer, OutputLayer};
use netmesh::Simulator;

fn main() {
    let mut controller = TopController::new();
    controller
        .load_layers(vec![
            Box::new(InputLayer::new(IdRange::new(0, 2).unwrap()).unwrap()),
            Box::new(OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap()),
            Box::new(InternalLayer::new(IdRange::new(6, 6).unwrap(), false)),
        ])
        .unwrap();
    let add_id = controller
        .create_operator_in_dynamic_layer(0)
        .unwrap()
        .expect("the dynamic layer always accepts a fresh ADD operator");
    controller.dispatch_update(&UpdateEvent::add_connection(OperatorId(0), add_id, 0));
    controller.dispatch_update(&UpdateEvent::add_connection(add_id, OperatorId(3), 0));

    let sim = Simulator::new();
    sim.load_configuration_bytes(&controller.save_configuration())
        .expect("hand-built two-hop topology is always valid");

    sim.input_text("A");
    let executed = sim.run_to_completion().expect("no run is already in progress");

    println!("{}", sim.network_json(true));
    println!("ran {executed} step(s) before the system went idle");
    println!("output bytes: {:?}", sim.get_output().as_bytes());
}
