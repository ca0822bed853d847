//! Time-ordered queue of deferred farm actions.
//!
//! Removals and replants happen a fixed delay after a harvest. They are
//! queued here against simulated time and executed by the tick loop, so a
//! run is fully reproducible from its seed and tick inputs.
//!
//! Entries due at the same instant come out in insertion order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use agrisim_types::{CropId, CropKind, Position, SimTime};

/// A deferred action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledAction {
    /// Take a harvested crop off the farm.
    RemoveCrop {
        /// Crop to remove.
        crop: CropId,
        /// Species, remembered for the replant.
        kind: CropKind,
        /// Slot position, remembered for the replant.
        position: Position,
    },
    /// Plant a seedling in an empty slot.
    Replant {
        /// Species to plant.
        kind: CropKind,
        /// Slot position.
        position: Position,
    },
}

#[derive(Debug, Clone)]
struct Entry {
    due: SimTime,
    seq: u64,
    action: ScheduledAction,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .seconds()
            .total_cmp(&other.due.seconds())
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of [`ScheduledAction`]s keyed by due time.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl Schedule {
    /// An empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run once simulated time reaches `due`.
    pub fn schedule(&mut self, due: SimTime, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Reverse(Entry { due, seq, action }));
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: SimTime) -> Vec<ScheduledAction> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.queue.pop() {
                due.push(entry.action);
            }
        }
        due
    }

    /// Due time of the earliest pending action.
    pub fn next_due(&self) -> Option<SimTime> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Whether a removal of `crop` is pending.
    pub fn has_removal(&self, crop: CropId) -> bool {
        self.queue.iter().any(|Reverse(entry)| {
            matches!(entry.action, ScheduledAction::RemoveCrop { crop: c, .. } if c == crop)
        })
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
