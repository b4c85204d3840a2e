//! Shared bookkeeping every layer variant embeds: the operator map, the
//! reserved ID range, and the finality flag.

use indexmap::IndexMap;

use netmesh_core::{IdRange, LayerError, OperatorId, Payload};
use netmesh_operator::{Operator, SchedulingContext};

/// Common state and operations shared by every [`crate::Layer`] variant.
///
/// Not itself object-safe (it's a concrete struct, not a trait) — each
/// variant embeds one and implements `Layer` largely by delegating to it.
pub struct LayerCore {
    reserved_range: IdRange,
    range_final: bool,
    operators: IndexMap<u32, Box<dyn Operator>>,
    current_min_id: Option<u32>,
    current_max_id: Option<u32>,
}

impl LayerCore {
    /// Construct an empty core over `reserved_range`, with the given
    /// finality flag.
    pub fn new(reserved_range: IdRange, range_final: bool) -> Self {
        Self {
            reserved_range,
            range_final,
            operators: IndexMap::new(),
            current_min_id: None,
            current_max_id: None,
        }
    }

    /// The reserved ID range (may have grown via [`LayerCore::generate_next_id`]
    /// if `!range_final`).
    pub fn reserved_range(&self) -> IdRange {
        self.reserved_range
    }

    /// Whether `reserved_range.max` is fixed.
    pub fn range_final(&self) -> bool {
        self.range_final
    }

    /// The smallest ID currently occupied, if any.
    pub fn current_min_id(&self) -> Option<u32> {
        self.current_min_id
    }

    /// The greatest ID currently occupied, if any.
    pub fn current_max_id(&self) -> Option<u32> {
        self.current_max_id
    }

    /// Number of operators currently owned.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Whether no operators are owned.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Add `op`, validating its ID lies within `reserved_range` (or, for a
    /// non-final range, is at least `reserved_range.min`), rejecting
    /// duplicates, and growing `reserved_range.max` when the new ID exceeds
    /// it on a non-final layer.
    pub fn add_operator(&mut self, op: Box<dyn Operator>) -> Result<(), LayerError> {
        let id = op.id();
        if self.operators.contains_key(&id.0) {
            return Err(LayerError::Duplicate { id });
        }
        let valid_id = if self.range_final {
            self.reserved_range.contains(id.0)
        } else {
            id.0 >= self.reserved_range.min()
        };
        if !valid_id {
            return Err(LayerError::InvalidId { id });
        }
        if !self.range_final && id.0 > self.reserved_range.max() {
            self.reserved_range.set_max(id.0)?;
        }
        self.current_min_id = Some(self.current_min_id.map_or(id.0, |m| m.min(id.0)));
        self.current_max_id = Some(self.current_max_id.map_or(id.0, |m| m.max(id.0)));
        self.operators.insert(id.0, op);
        Ok(())
    }

    /// Allocate the next ID this layer would assign: `reserved_range.min`
    /// when empty, else `current_max_id + 1`. Grows `reserved_range.max`
    /// when not final and the candidate exceeds it; fails with `LayerFull`
    /// when final and exhausted, or `IdOverflow` past `u32::MAX`.
    pub fn generate_next_id(&mut self) -> Result<OperatorId, LayerError> {
        let candidate = match self.current_max_id {
            None => self.reserved_range.min(),
            Some(max) => max.checked_add(1).ok_or(LayerError::IdOverflow)?,
        };
        if candidate > self.reserved_range.max() {
            if self.range_final {
                return Err(LayerError::LayerFull);
            }
            self.reserved_range.set_max(candidate)?;
        }
        Ok(OperatorId(candidate))
    }

    /// Look up an operator by ID.
    pub fn get_operator(&self, id: OperatorId) -> Option<&dyn Operator> {
        self.operators.get(&id.0).map(|b| b.as_ref())
    }

    /// Look up an operator by ID, mutably.
    pub fn get_operator_mut(&mut self, id: OperatorId) -> Option<&mut Box<dyn Operator>> {
        self.operators.get_mut(&id.0)
    }

    /// Remove an operator by ID, returning it if present.
    pub fn remove_operator(&mut self, id: OperatorId) -> Option<Box<dyn Operator>> {
        let removed = self.operators.shift_remove(&id.0);
        if removed.is_some() {
            self.current_min_id = self.operators.keys().copied().min();
            self.current_max_id = self.operators.keys().copied().max();
        }
        removed
    }

    /// All owned operators, in ascending ID order. The binary format and
    /// equality checks both depend on this ordering.
    pub fn operators_sorted(&self) -> Vec<&dyn Operator> {
        let mut ops: Vec<&dyn Operator> = self.operators.values().map(|b| b.as_ref()).collect();
        ops.sort_unstable_by_key(|op| op.id().0);
        ops
    }

    /// Deliver `v` to `id`, if present. Returns whether the operator exists.
    pub fn message_operator(&mut self, id: OperatorId, v: i32) -> bool {
        match self.operators.get_mut(&id.0) {
            Some(op) => {
                op.message_int(v);
                true
            }
            None => false,
        }
    }

    /// Run `id`'s process phase, if present.
    pub fn process_operator_data(&mut self, id: OperatorId, ctx: &mut SchedulingContext<'_>) {
        if let Some(op) = self.operators.get_mut(&id.0) {
            op.process_data(ctx);
        }
    }

    /// Advance `payload` via its owning operator, if present. Returns
    /// whether the operator exists.
    pub fn traverse_operator_payload(
        &self,
        payload: &mut Payload,
        ctx: &mut SchedulingContext<'_>,
    ) -> bool {
        match self.operators.get(&payload.current_operator_id.0) {
            Some(op) => {
                op.traverse(payload, ctx);
                true
            }
            None => false,
        }
    }

    /// Equality ignoring anything but ID, presence, and each operator's own
    /// `equals`.
    pub fn operators_equal(&self, other: &LayerCore) -> bool {
        self.operators_sorted()
            .iter()
            .map(|op| op.id())
            .eq(other.operators_sorted().iter().map(|op| op.id()))
            && self
                .operators_sorted()
                .iter()
                .zip(other.operators_sorted())
                .all(|(a, b)| a.equals(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmesh_operator::AddOperator;

    fn add(id: u32) -> Box<dyn Operator> {
        Box::new(AddOperator::new(OperatorId(id), 0, 0))
    }

    #[test]
    fn add_operator_rejects_out_of_range_id_on_final_layer() {
        let mut core = LayerCore::new(IdRange::new(0, 2).unwrap(), true);
        assert!(core.add_operator(add(5)).is_err());
    }

    #[test]
    fn add_operator_rejects_duplicates() {
        let mut core = LayerCore::new(IdRange::new(0, 2).unwrap(), true);
        core.add_operator(add(0)).unwrap();
        assert!(matches!(
            core.add_operator(add(0)),
            Err(LayerError::Duplicate { .. })
        ));
    }

    #[test]
    fn add_operator_grows_non_final_range() {
        let mut core = LayerCore::new(IdRange::new(10, 10).unwrap(), false);
        core.add_operator(add(15)).unwrap();
        assert_eq!(core.reserved_range().max(), 15);
    }

    #[test]
    fn generate_next_id_starts_at_range_min() {
        let mut core = LayerCore::new(IdRange::new(10, 20).unwrap(), false);
        assert_eq!(core.generate_next_id().unwrap(), OperatorId(10));
    }

    #[test]
    fn generate_next_id_increments_from_current_max() {
        let mut core = LayerCore::new(IdRange::new(10, 20).unwrap(), false);
        core.add_operator(add(10)).unwrap();
        assert_eq!(core.generate_next_id().unwrap(), OperatorId(11));
    }

    #[test]
    fn generate_next_id_fails_when_final_and_full() {
        let mut core = LayerCore::new(IdRange::new(0, 0).unwrap(), true);
        core.add_operator(add(0)).unwrap();
        assert!(matches!(
            core.generate_next_id(),
            Err(LayerError::LayerFull)
        ));
    }

    #[test]
    fn generate_next_id_grows_non_final_range_past_its_max() {
        let mut core = LayerCore::new(IdRange::new(0, 0).unwrap(), false);
        core.add_operator(add(0)).unwrap();
        let next = core.generate_next_id().unwrap();
        assert_eq!(next, OperatorId(1));
        assert_eq!(core.reserved_range().max(), 1);
    }

    #[test]
    fn operators_sorted_is_ascending_by_id() {
        let mut core = LayerCore::new(IdRange::new(0, 10).unwrap(), false);
        core.add_operator(add(5)).unwrap();
        core.add_operator(add(1)).unwrap();
        core.add_operator(add(3)).unwrap();
        let ids: Vec<u32> = core.operators_sorted().iter().map(|o| o.id().0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn remove_operator_updates_min_max() {
        let mut core = LayerCore::new(IdRange::new(0, 10).unwrap(), false);
        core.add_operator(add(1)).unwrap();
        core.add_operator(add(5)).unwrap();
        core.remove_operator(OperatorId(5));
        assert_eq!(core.current_max_id(), Some(1));
    }
}
