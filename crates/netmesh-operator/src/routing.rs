//! An operator's output routing table: distance buckets of target IDs.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

/// Maps a routing distance `d` to the set of operator IDs a payload at that
/// distance should be delivered to.
///
/// Buckets are stored only when non-empty; inserting the last member of a
/// bucket via [`RoutingTable::remove`] removes the bucket entirely, keeping
/// `max_distance` cheap to recompute. Insertion order within a bucket is
/// preserved but carries no semantic weight — there is no defined ordering
/// among targets sharing a distance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutingTable {
    buckets: IndexMap<u16, IndexSet<u32>>,
}

impl RoutingTable {
    /// An empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no distance bucket holds any target.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The greatest distance with a non-empty bucket, or `None` if empty.
    pub fn max_distance(&self) -> Option<u16> {
        self.buckets.keys().copied().max()
    }

    /// The targets at distance `d`, if any are registered.
    pub fn targets_at(&self, d: u16) -> Option<&IndexSet<u32>> {
        self.buckets.get(&d)
    }

    /// Add `target` at distance `d`. Idempotent: adding the same pair twice
    /// has no additional effect.
    pub fn add(&mut self, target: u32, d: u16) {
        self.buckets.entry(d).or_default().insert(target);
    }

    /// Remove `target` from distance `d`. A no-op if the pair is not
    /// present, including when `d` holds no bucket at all.
    pub fn remove(&mut self, target: u32, d: u16) {
        if let Entry::Occupied(mut entry) = self.buckets.entry(d) {
            entry.get_mut().shift_remove(&target);
            if entry.get().is_empty() {
                entry.shift_remove();
            }
        }
    }

    /// Move `target` from distance `old_d` to `new_d`. A no-op if `target`
    /// is not present at `old_d`.
    pub fn move_target(&mut self, target: u32, old_d: u16, new_d: u16) {
        if old_d == new_d {
            return;
        }
        let had_it = self
            .buckets
            .get(&old_d)
            .is_some_and(|set| set.contains(&target));
        if !had_it {
            return;
        }
        self.remove(target, old_d);
        self.add(target, new_d);
    }

    /// All `(distance, targets)` pairs, sorted by distance ascending. Used
    /// by the binary format, which requires a deterministic bucket order.
    pub fn sorted_buckets(&self) -> Vec<(u16, &IndexSet<u32>)> {
        let mut entries: Vec<_> = self.buckets.iter().map(|(d, s)| (*d, s)).collect();
        entries.sort_unstable_by_key(|(d, _)| *d);
        entries
    }
}
