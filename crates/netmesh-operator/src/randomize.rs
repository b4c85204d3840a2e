//! Random initialization for newly created operators.
//!
//! ADD's connections are requested through the update queue (it may be
//! initialized while the simulation is already running); IN's connections
//! are applied directly, which is safe because IN operators only exist
//! before the first step runs.

use netmesh_core::{IdRange, OperatorId, UpdateEvent};
use netmesh_random::RandomSource;

use crate::add::AddOperator;
use crate::in_op::InOperator;
use crate::operator::Operator;
use crate::scheduling::SchedulingContext;

/// Upper bound (inclusive) on how many connections an ADD operator's
/// `random_init` creates.
pub const ADD_MAX_CONNECTIONS: i32 = 4;
/// Upper bound (inclusive) on the routing distance an ADD operator's
/// `random_init` assigns.
pub const ADD_MAX_DISTANCE: i32 = 8;
/// Upper bound (inclusive) on how many connections an IN operator's
/// `random_init` creates.
pub const IN_MAX_CONNECTIONS: i32 = 2;
/// Upper bound (inclusive) on the routing distance an IN operator's
/// `random_init` assigns.
pub const IN_MAX_DISTANCE: i32 = 2;

impl AddOperator {
    /// Draw fresh `weight`/`threshold` values and request between 0 and
    /// [`ADD_MAX_CONNECTIONS`] routing entries, each targeting a uniformly
    /// chosen ID within `connection_range` at a uniformly chosen distance
    /// within `[0, ADD_MAX_DISTANCE]`. Connections are requested through
    /// `ctx`, not applied immediately.
    pub fn random_init<R: RandomSource>(
        &mut self,
        connection_range: &IdRange,
        rng: &mut R,
        ctx: &mut SchedulingContext<'_>,
    ) {
        self.set_weight(rng.get_int(i32::MIN, i32::MAX));
        self.set_threshold(rng.get_int(i32::MIN, i32::MAX));

        let n = rng.get_int(0, ADD_MAX_CONNECTIONS);
        for _ in 0..n {
            let target = rng.get_int(connection_range.min() as i32, connection_range.max() as i32) as u32;
            let distance = rng.get_int(0, ADD_MAX_DISTANCE) as u16;
            ctx.submit_update(UpdateEvent::add_connection(
                self.id(),
                OperatorId(target),
                distance,
            ));
        }
    }

    fn set_weight(&mut self, weight: i32) {
        self.change_params(&[0, weight]);
    }

    fn set_threshold(&mut self, threshold: i32) {
        self.change_params(&[1, threshold]);
    }
}

impl InOperator {
    /// Add between 0 and [`IN_MAX_CONNECTIONS`] routing entries directly,
    /// each targeting a uniformly chosen ID within `connection_range` at a
    /// uniformly chosen distance within `[0, IN_MAX_DISTANCE]`.
    ///
    /// Unlike [`AddOperator::random_init`], this mutates the routing table
    /// in place: IN operators are only ever randomized during network
    /// construction, before any step has run, so there is no concurrent
    /// traversal to race with.
    pub fn random_init<R: RandomSource>(&mut self, connection_range: &IdRange, rng: &mut R) {
        let n = rng.get_int(0, IN_MAX_CONNECTIONS);
        for _ in 0..n {
            let target = rng.get_int(connection_range.min() as i32, connection_range.max() as i32) as u32;
            let distance = rng.get_int(0, IN_MAX_DISTANCE) as u16;
            self.add_connection_internal(target, distance);
        }
    }
}
