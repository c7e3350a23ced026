//! Lane bookkeeping for one indexing run.

use std::collections::{BTreeSet, HashMap};

use crate::storage::CommitId;

/// Reservation map and free-lane pool.
///
/// Every lane below `next_lane` is in exactly one of three states: reserved
/// for a commit that has not been processed yet, held by the commit being
/// processed, or free. Allocation always hands out the smallest free lane,
/// so the number of lanes in use tracks the width of the history window
/// rather than its length.
#[derive(Debug, Default)]
pub(crate) struct LaneState {
    reservations: HashMap<CommitId, usize>,
    free: BTreeSet<usize>,
    next_lane: usize,
}

impl LaneState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the smallest lane that is neither reserved nor held.
    pub(crate) fn allocate(&mut self) -> usize {
        if let Some(lane) = self.free.pop_first() {
            return lane;
        }
        let lane = self.next_lane;
        self.next_lane += 1;
        lane
    }

    /// Consume the reservation made for `id`, or allocate a fresh lane for it.
    pub(crate) fn take_or_allocate(&mut self, id: &CommitId) -> usize {
        match self.reservations.remove(id) {
            Some(lane) => lane,
            None => self.allocate(),
        }
    }

    pub(crate) fn reservation(&self, id: &CommitId) -> Option<usize> {
        self.reservations.get(id).copied()
    }

    /// Hold `lane` until `id` is processed.
    pub(crate) fn reserve(&mut self, id: CommitId, lane: usize) {
        debug_assert!(lane < self.next_lane, "reserving a lane that was never allocated");
        self.reservations.insert(id, lane);
    }

    /// Return a lane to the pool.
    pub(crate) fn release(&mut self, lane: usize) {
        debug_assert!(lane < self.next_lane, "releasing a lane that was never allocated");
        self.free.insert(lane);
    }

    /// Number of distinct lanes ever handed out.
    pub(crate) fn width(&self) -> usize {
        self.next_lane
    }

    /// Commits still waiting for their reserved lane.
    pub(crate) fn pending(&self) -> usize {
        self.reservations.len()
    }
}
