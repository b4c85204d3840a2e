//! Deferred structural mutations submitted through the scheduling bus.

use smallvec::SmallVec;

use crate::id::OperatorId;

/// Inline storage for an [`UpdateEvent`]'s parameters.
///
/// Every event kind needs at most four `i32` parameters (the widest is
/// `MoveConnection`'s `{old_distance, new_distance}` pair plus room for
/// growth), so params never spill to the heap in practice.
pub type Params = SmallVec<[i32; 4]>;

/// The closed set of structural mutations an operator or façade call may
/// request. Submitted to the queue rather than applied immediately so that
/// traversal and processing within a step see a stable topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Add a routing-table entry: `target` at `params[0]` distance.
    AddConnection,
    /// Remove a routing-table entry: `target` at `params[0]` distance.
    RemoveConnection,
    /// Move a routing-table entry from `params[0]` to `params[1]` distance.
    MoveConnection,
    /// Replace an operator's variant-specific parameters with `params`.
    ChangeParams,
    /// Create a new operator in the one dynamic (non-`rangeFinal`) layer,
    /// regardless of `target`.
    CreateOperator,
    /// Delete the operator identified by `target`.
    DeleteOperator,
}

/// A single deferred mutation, queued for the next drain pass.
///
/// `target` is the operator the mutation applies to; for `AddConnection` it
/// is the *source* operator whose routing table gains the entry, and the
/// destination operator ID lives in `params`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEvent {
    /// Which mutation to apply.
    pub kind: UpdateKind,
    /// The operator the mutation is addressed to.
    pub target: OperatorId,
    /// Kind-specific parameters.
    pub params: Params,
}

impl UpdateEvent {
    /// Build an `AddConnection` event: add `target_conn` at `distance` to
    /// `source`'s routing table.
    pub fn add_connection(source: OperatorId, target_conn: OperatorId, distance: u16) -> Self {
        Self {
            kind: UpdateKind::AddConnection,
            target: source,
            params: Params::from_slice(&[target_conn.0 as i32, distance as i32]),
        }
    }

    /// Build a `RemoveConnection` event: remove `target_conn` at `distance`
    /// from `source`'s routing table.
    pub fn remove_connection(source: OperatorId, target_conn: OperatorId, distance: u16) -> Self {
        Self {
            kind: UpdateKind::RemoveConnection,
            target: source,
            params: Params::from_slice(&[target_conn.0 as i32, distance as i32]),
        }
    }

    /// Build a `MoveConnection` event: relocate `target_conn` from
    /// `old_distance` to `new_distance` in `source`'s routing table.
    pub fn move_connection(
        source: OperatorId,
        target_conn: OperatorId,
        old_distance: u16,
        new_distance: u16,
    ) -> Self {
        Self {
            kind: UpdateKind::MoveConnection,
            target: source,
            params: Params::from_slice(&[
                target_conn.0 as i32,
                old_distance as i32,
                new_distance as i32,
            ]),
        }
    }

    /// Build a `ChangeParams` event carrying variant-specific parameters.
    pub fn change_params(target: OperatorId, params: Params) -> Self {
        Self {
            kind: UpdateKind::ChangeParams,
            target,
            params,
        }
    }

    /// Build a `CreateOperator` event. `params[0]` carries the wire tag of
    /// the operator variant to create. `target` is unused by this event kind
    /// (creation always targets the dynamic layer) but a value is required
    /// to keep `UpdateEvent`'s shape uniform; callers may pass any ID.
    pub fn create_operator(target: OperatorId, op_type_tag: i32) -> Self {
        Self {
            kind: UpdateKind::CreateOperator,
            target,
            params: Params::from_slice(&[op_type_tag]),
        }
    }

    /// Build a `DeleteOperator` event.
    pub fn delete_operator(target: OperatorId) -> Self {
        Self {
            kind: UpdateKind::DeleteOperator,
            target,
            params: Params::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_connection_packs_target_and_distance() {
        let e = UpdateEvent::add_connection(OperatorId(1), OperatorId(9), 3);
        assert_eq!(e.kind, UpdateKind::AddConnection);
        assert_eq!(e.target, OperatorId(1));
        assert_eq!(&e.params[..], &[9, 3]);
    }

    #[test]
    fn delete_operator_carries_no_params() {
        let e = UpdateEvent::delete_operator(OperatorId(4));
        assert_eq!(e.kind, UpdateKind::DeleteOperator);
        assert!(e.params.is_empty());
    }

    #[test]
    fn move_connection_packs_both_distances() {
        let e = UpdateEvent::move_connection(OperatorId(2), OperatorId(5), 1, 2);
        assert_eq!(&e.params[..], &[5, 1, 2]);
    }
}
