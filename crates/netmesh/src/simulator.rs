//! [`Simulator`]: the façade composing [`TopController`], [`StepExecutor`],
//! and [`UpdateQueue`] behind a single lock, per the engine's
//! single-`simMutex` concurrency model.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use netmesh_core::{Cursor, FacadeError, OperatorId, StepId};
use netmesh_engine::{EngineBus, TopController, UpdateQueue};
use netmesh_engine::StepExecutor;
use netmesh_operator::SchedulingContext;
use netmesh_random::CryptoRandomSource;

use crate::json;

/// Upper bound on the number of steps a bare [`Simulator::run_to_completion`]
/// will execute before giving up, even if the system never goes idle.
pub const MAX_STEPS: u64 = 1_000_000;

/// A snapshot of the simulator's state, returned by [`Simulator::status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulatorStatus {
    /// The executor's current step counter.
    pub step: StepId,
    /// Payloads currently in flight, across both `current` and `next`.
    pub payload_count: u64,
    /// Structural mutations not yet drained by the run loop.
    pub pending_updates: u64,
    /// Total operators across every layer.
    pub operator_count: u64,
    /// Number of layers in the topology.
    pub layer_count: u64,
}

struct SimulatorState {
    controller: TopController,
    executor: StepExecutor,
    queue: UpdateQueue,
    log_frequency: u32,
}

/// Composes the propagation engine's stateful core behind one mutex and
/// exposes the command surface a CLI or other front-end drives.
///
/// Per the concurrency model: all mutating and reading façade methods
/// acquire `state` for the duration of one call; [`Simulator::run`]
/// re-acquires it once per step rather than holding it for the whole run,
/// so other façade calls can interleave between steps.
pub struct Simulator {
    state: Mutex<SimulatorState>,
    stop_requested: AtomicBool,
    running: AtomicBool,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// An empty simulator: no layers, no operators, step 0.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatorState {
                controller: TopController::new(),
                executor: StepExecutor::new(),
                queue: UpdateQueue::new(),
                log_frequency: 1,
            }),
            stop_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Replace the topology with one freshly generated by
    /// [`TopController::randomize_network`]. Resets the executor; any
    /// connections the randomization scheduled as update events are
    /// materialized immediately (there is no in-progress step to drain them
    /// later).
    pub fn create_new_network(&self, num_internal: u32) -> Result<(), FacadeError> {
        let mut state = self.state.lock().unwrap();
        let mut rng = CryptoRandomSource::new();
        state
            .controller
            .randomize_network(num_internal, &mut rng, &mut state.queue)?;
        state.queue.process_all(&mut state.controller);
        state.executor = StepExecutor::new();
        Ok(())
    }

    /// Replace the topology with one decoded from `bytes` (§4.4.2's layer
    /// block sequence). On failure the simulator is left empty.
    pub fn load_configuration_bytes(&self, bytes: &[u8]) -> Result<(), FacadeError> {
        let mut state = self.state.lock().unwrap();
        state.controller.load_configuration(bytes)?;
        state.executor = StepExecutor::new();
        state.queue = UpdateQueue::new();
        Ok(())
    }

    /// Encode the current topology (§4.4.2).
    pub fn save_configuration_bytes(&self) -> Vec<u8> {
        self.state.lock().unwrap().controller.save_configuration()
    }

    /// Read an entire configuration from `reader` and load it.
    pub fn load_configuration<R: Read>(&self, reader: &mut R) -> Result<(), FacadeError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| FacadeError::Io { reason: e.to_string() })?;
        self.load_configuration_bytes(&bytes)
    }

    /// Encode the current topology and write it to `writer`.
    pub fn save_configuration<W: Write>(&self, writer: &mut W) -> Result<(), FacadeError> {
        let bytes = self.save_configuration_bytes();
        writer
            .write_all(&bytes)
            .map_err(|e| FacadeError::Io { reason: e.to_string() })
    }

    /// Replace the executor's payload/`toProcess` state from a buffer
    /// written by [`Simulator::save_state_bytes`] (§4.8).
    pub fn load_state_bytes(&self, bytes: &[u8]) -> Result<(), FacadeError> {
        let mut cursor = Cursor::new(bytes);
        let executor = StepExecutor::load_state(&mut cursor)?;
        cursor.expect_exhausted()?;
        self.state.lock().unwrap().executor = executor;
        Ok(())
    }

    /// Encode the executor's payload/`toProcess` state (§4.8).
    pub fn save_state_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.state.lock().unwrap().executor.save_state(&mut buf);
        buf
    }

    /// Read an entire state blob from `reader` and load it.
    pub fn load_state<R: Read>(&self, reader: &mut R) -> Result<(), FacadeError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| FacadeError::Io { reason: e.to_string() })?;
        self.load_state_bytes(&bytes)
    }

    /// Encode the executor's state and write it to `writer`.
    pub fn save_state<W: Write>(&self, writer: &mut W) -> Result<(), FacadeError> {
        let bytes = self.save_state_bytes();
        writer
            .write_all(&bytes)
            .map_err(|e| FacadeError::Io { reason: e.to_string() })
    }

    /// Deliver `s`'s bytes to the INPUT text channel.
    ///
    /// Outside of a step, so the delivery is realized immediately rather
    /// than buffered for the executor to drain: a throwaway
    /// [`EngineBus`]/[`SchedulingContext`] collects the scheduled messages,
    /// then each is applied via `message_op` exactly as
    /// [`StepExecutor::step`] would apply one collected during traversal.
    pub fn input_text(&self, s: &str) {
        let mut state = self.state.lock().unwrap();
        let mut pending = Vec::new();
        let mut next = Vec::new();
        {
            let mut bus = EngineBus::new(&mut pending, &mut next, &mut state.queue);
            let mut ctx = SchedulingContext::new(&mut bus);
            state.controller.input_text(s, &mut ctx);
        }
        for (target, v) in pending {
            if state.controller.message_op(target, v) {
                state.executor.mark_for_processing(target);
            }
        }
        state.executor.extend_next(next);
    }

    /// Drain and return the OUTPUT text channel's buffered bytes.
    pub fn get_output(&self) -> String {
        self.state.lock().unwrap().controller.output_text()
    }

    /// Number of values currently buffered in the OUTPUT text channel.
    pub fn get_text_count(&self) -> i32 {
        self.state.lock().unwrap().controller.text_count()
    }

    /// Drop every buffered OUTPUT text value without reading it.
    pub fn clear_text_output(&self) {
        self.state.lock().unwrap().controller.clear_text_output();
    }

    /// Set the OUTPUT text channel's advisory read batch size.
    pub fn set_text_batch_size(&self, n: usize) {
        self.state.lock().unwrap().controller.set_text_batch_size(n);
    }

    /// Set the logging cadence external front-ends should honor. Rejects
    /// zero (the command table requires `n>0`).
    pub fn set_log_frequency(&self, n: u32) -> Result<(), FacadeError> {
        if n == 0 {
            return Err(FacadeError::InvalidArgument {
                reason: "log frequency must be greater than zero".to_string(),
            });
        }
        self.state.lock().unwrap().log_frequency = n;
        Ok(())
    }

    /// The logging cadence most recently set, default 1.
    pub fn log_frequency(&self) -> u32 {
        self.state.lock().unwrap().log_frequency
    }

    /// A snapshot of step, payload, update, operator, and layer counts.
    pub fn status(&self) -> SimulatorStatus {
        let state = self.state.lock().unwrap();
        SimulatorStatus {
            step: state.executor.current_step(),
            payload_count: (state.executor.current_payloads().len()
                + state.executor.next_payloads().len()) as u64,
            pending_updates: state.queue.len() as u64,
            operator_count: state.controller.operator_count() as u64,
            layer_count: state.controller.layer_count() as u64,
        }
    }

    /// JSON rendering of every layer and operator (`print-network`).
    pub fn network_json(&self, pretty: bool) -> String {
        json::network_json(&self.state.lock().unwrap().controller, pretty)
    }

    /// JSON rendering of the executor's `current` buffer (`print-current-payloads`).
    pub fn current_payloads_json(&self, pretty: bool) -> String {
        json::payloads_json(self.state.lock().unwrap().executor.current_payloads(), pretty)
    }

    /// JSON rendering of the executor's `next` buffer (`print-next-payloads`).
    pub fn next_payloads_json(&self, pretty: bool) -> String {
        json::payloads_json(self.state.lock().unwrap().executor.next_payloads(), pretty)
    }

    /// Request that an in-progress [`Simulator::run`] stop before its next
    /// step. Consulted cooperatively at step boundaries; does not interrupt
    /// a step already underway.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a [`Simulator::run`] call is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute up to `num_steps` discrete steps: `executor.step()`,
    /// `queue.process_all()`, `executor.advance()`. Stops early if the
    /// system goes idle (no in-flight payloads, no pending updates) or a
    /// stop was requested. Returns the number of steps actually executed.
    ///
    /// Only one `run` may be active at a time; a concurrent call returns
    /// [`FacadeError::InvalidState`].
    pub fn run(&self, num_steps: i64) -> Result<u32, FacadeError> {
        if num_steps < 0 {
            return Err(FacadeError::InvalidArgument {
                reason: format!("step count must be non-negative, got {num_steps}"),
            });
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(FacadeError::InvalidState {
                reason: "a run is already in progress".to_string(),
            });
        }
        self.stop_requested.store(false, Ordering::Release);
        let executed = self.run_steps(num_steps as u64);
        self.running.store(false, Ordering::Release);
        Ok(executed)
    }

    /// Run bounded only by [`MAX_STEPS`], stopping early on idle or
    /// cancellation exactly as [`Simulator::run`] does.
    pub fn run_to_completion(&self) -> Result<u32, FacadeError> {
        self.run(MAX_STEPS as i64)
    }

    fn run_steps(&self, num_steps: u64) -> u32 {
        let mut executed = 0u32;
        for _ in 0..num_steps {
            if self.stop_requested.load(Ordering::Acquire) {
                break;
            }
            let mut state = self.state.lock().unwrap();
            if !state.executor.is_active() && state.queue.is_empty() {
                break;
            }
            state.executor.step(&mut state.controller, &mut state.queue);
            state.queue.process_all(&mut state.controller);
            state.executor.advance();
            executed += 1;
        }
        executed
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("Simulator")
            .field("step", &status.step)
            .field("operator_count", &status.operator_count)
            .field("layer_count", &status.layer_count)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_core::{IdRange, UpdateEvent};
    use netmesh_layer::{InputLayer, InternalLayer, Layer, OutputLayer};
    use netmesh_random::PseudoRandomSource;

    fn manual_two_hop_simulator() -> Simulator {
        let sim = Simulator::new();
        {
            let mut state = sim.state.lock().unwrap();
            state
                .controller
                .load_layers(vec![
                    Box::new(InputLayer::new(IdRange::new(0, 2).unwrap()).unwrap()),
                    Box::new(OutputLayer::new(IdRange::new(3, 5).unwrap()).unwrap()),
                    Box::new(InternalLayer::new(IdRange::new(6, 6).unwrap(), false)),
                ])
                .unwrap();
        }
        let id = {
            let mut state = sim.state.lock().unwrap();
            state.controller.create_operator_in_dynamic_layer(0).unwrap().unwrap()
        };
        let mut state = sim.state.lock().unwrap();
        state
            .controller
            .dispatch_update(&UpdateEvent::add_connection(OperatorId(0), id, 0));
        state
            .controller
            .dispatch_update(&UpdateEvent::add_connection(id, OperatorId(3), 0));
        drop(state);
        sim
    }

    #[test]
    fn new_simulator_is_empty() {
        let sim = Simulator::new();
        let status = sim.status();
        assert_eq!(status.step, StepId(0));
        assert_eq!(status.operator_count, 0);
        assert_eq!(status.layer_count, 0);
    }

    #[test]
    fn create_new_network_builds_three_layers() {
        let sim = Simulator::new();
        sim.create_new_network(2).unwrap();
        let status = sim.status();
        assert_eq!(status.layer_count, 3);
        assert!(status.operator_count >= 8);
    }

    #[test]
    fn configuration_round_trips_through_bytes() {
        let sim = Simulator::new();
        sim.create_new_network(1).unwrap();
        let bytes = sim.save_configuration_bytes();

        let sim2 = Simulator::new();
        sim2.load_configuration_bytes(&bytes).unwrap();
        assert_eq!(sim2.status().layer_count, sim.status().layer_count);
        assert_eq!(sim2.status().operator_count, sim.status().operator_count);
    }

    #[test]
    fn configuration_round_trips_through_read_write() {
        let sim = Simulator::new();
        sim.create_new_network(0).unwrap();

        let mut buf: Vec<u8> = Vec::new();
        sim.save_configuration(&mut buf).unwrap();

        let sim2 = Simulator::new();
        let mut cursor = std::io::Cursor::new(buf);
        sim2.load_configuration(&mut cursor).unwrap();
        assert_eq!(sim2.status().layer_count, 3);
    }

    #[test]
    fn load_configuration_rejects_bad_topology_and_leaves_simulator_empty() {
        let sim = Simulator::new();
        sim.create_new_network(1).unwrap();

        // Two non-final layers: violates the single-dynamic-layer invariant.
        let mut bytes = Vec::new();
        InternalLayer::new(IdRange::new(0, 3).unwrap(), false).encode(&mut bytes);
        InternalLayer::new(IdRange::new(4, 8).unwrap(), false).encode(&mut bytes);

        assert!(sim.load_configuration_bytes(&bytes).is_err());
        assert_eq!(sim.status().layer_count, 0);
    }

    #[test]
    fn two_hop_delivery_reaches_output_after_three_steps() {
        // INPUT channel buffers the byte (step 0 processes it into a
        // payload), the payload reaches the ADD operator (step 1), which
        // fires and reaches OUT (step 2) — three steps end to end. OUT's
        // drainAsText takes the top byte of a 32-bit value, so a raw
        // unscaled byte like 65 maps to NUL; this is the same "OUT
        // scaling" `drain_as_text_clamps_negative_values_to_zero` exercises.
        let sim = manual_two_hop_simulator();
        sim.input_text("A");
        let executed = sim.run(3).unwrap();
        assert_eq!(executed, 3);
        assert_eq!(sim.get_output(), "\u{0}");
    }

    #[test]
    fn run_stops_early_once_system_goes_idle() {
        let sim = manual_two_hop_simulator();
        sim.input_text("A");
        let executed = sim.run(50).unwrap();
        assert!(executed < 50);
    }

    #[test]
    fn request_stop_halts_the_run_loop() {
        let sim = manual_two_hop_simulator();
        sim.input_text("A");
        sim.request_stop();
        let executed = sim.run(50).unwrap();
        assert_eq!(executed, 0);
    }

    #[test]
    fn run_rejects_negative_step_counts() {
        let sim = Simulator::new();
        assert!(matches!(
            sim.run(-1),
            Err(FacadeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn state_round_trips_through_bytes() {
        let sim = manual_two_hop_simulator();
        sim.input_text("A");
        let bytes = sim.save_state_bytes();

        let sim2 = Simulator::new();
        sim2.load_state_bytes(&bytes).unwrap();
        assert_eq!(sim2.status().payload_count, sim.status().payload_count);
    }

    #[test]
    fn set_log_frequency_rejects_zero() {
        let sim = Simulator::new();
        assert!(sim.set_log_frequency(0).is_err());
        assert!(sim.set_log_frequency(5).is_ok());
        assert_eq!(sim.log_frequency(), 5);
    }

    #[test]
    fn network_json_reflects_the_loaded_topology() {
        let sim = manual_two_hop_simulator();
        let json = sim.network_json(false);
        assert!(json.contains("\"INTERNAL\""));
        assert!(json.contains("\"ADD\""));
    }

    #[test]
    fn create_new_network_accepts_zero_internal_operators() {
        let sim = Simulator::new();
        sim.create_new_network(0).unwrap();
        assert_eq!(sim.status().layer_count, 3);
    }

    #[test]
    fn randomized_network_runs_without_panicking() {
        let sim = Simulator::new();
        sim.create_new_network(5).unwrap();
        sim.input_text("hello");
        let _ = PseudoRandomSource::new(1); // silence unused-import warning under some cfgs
        sim.run(10).unwrap();
    }
}
