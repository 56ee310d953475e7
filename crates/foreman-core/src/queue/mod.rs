//! The in-memory priority queue and the retry policy.

mod entry;
mod retry;

pub use entry::QueuedTask;
pub use retry::RetryPolicy;

use std::collections::{BinaryHeap, HashMap};

use tokio::time::Instant;

use crate::domain::{Priority, TaskId};
use entry::{DueEntry, ReadyEntry};

/// Authoritative queue slot. Heap entries reference slots by generation;
/// a stale generation means the entry was replaced or removed.
#[derive(Debug)]
struct Slot {
    entry: QueuedTask,
    generation: u64,
}

/// Priority queue of tasks awaiting dispatch.
///
/// Structure (single source of truth is the `slots` map, heaps hold ids
/// only, mirroring the usual ready/scheduled split):
/// - `ready`: max-heap ordered by priority desc, then earliest `run_at`,
///   then insertion order — only entries that were due when pushed.
/// - `scheduled`: min-heap by `run_at` for entries whose dispatch time is
///   still in the future. `promote_due` moves them over once due.
/// - Replacement and removal invalidate heap entries lazily via a
///   generation counter rather than rebuilding heaps.
///
/// Future-scheduled tasks are invisible to `peek`/`pop` but still count in
/// `len()` and show up in `snapshot()` for queue-status views.
///
/// Not internally synchronized; the engine serializes access behind one
/// mutex (single-writer discipline).
pub struct PriorityQueue {
    slots: HashMap<TaskId, Slot>,
    ready: BinaryHeap<ReadyEntry>,
    scheduled: BinaryHeap<DueEntry>,
    next_seq: u64,
    next_generation: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            ready: BinaryHeap::new(),
            scheduled: BinaryHeap::new(),
            next_seq: 0,
            next_generation: 0,
        }
    }

    /// Insert or replace the entry for this task id. Re-insertion is
    /// idempotent so a still-pending task can be updated in place.
    pub fn insert(&mut self, entry: QueuedTask) {
        self.next_generation += 1;
        let generation = self.next_generation;

        if entry.run_at <= Instant::now() {
            self.push_ready(&entry, generation);
        } else {
            self.scheduled.push(DueEntry {
                run_at: entry.run_at,
                generation,
                id: entry.id,
            });
        }
        self.slots.insert(entry.id, Slot { entry, generation });
    }

    /// Remove an entry if present; `None` otherwise. Heap entries go stale
    /// and are discarded on the next peek/pop.
    pub fn remove(&mut self, id: TaskId) -> Option<QueuedTask> {
        self.slots.remove(&id).map(|slot| slot.entry)
    }

    /// The highest-priority, earliest-scheduled entry whose `run_at <= now`.
    pub fn peek_next_eligible(&mut self, now: Instant) -> Option<&QueuedTask> {
        self.promote_due(now);
        loop {
            let (id, generation) = match self.ready.peek() {
                Some(top) => (top.id, top.generation),
                None => return None,
            };
            if self.is_live(id, generation) {
                return self.slots.get(&id).map(|slot| &slot.entry);
            }
            self.ready.pop();
        }
    }

    /// Like `peek_next_eligible`, but removes and returns the entry.
    pub fn pop_next_eligible(&mut self, now: Instant) -> Option<QueuedTask> {
        self.promote_due(now);
        loop {
            let top = self.ready.pop()?;
            if self.is_live(top.id, top.generation) {
                return self.slots.remove(&top.id).map(|slot| slot.entry);
            }
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&QueuedTask> {
        self.slots.get(&id).map(|slot| &slot.entry)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All entries (eligible or not), ordered priority desc then earliest
    /// schedule. Introspection only.
    pub fn snapshot(&self) -> Vec<QueuedTask> {
        let mut entries: Vec<QueuedTask> =
            self.slots.values().map(|slot| slot.entry.clone()).collect();
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.run_at.cmp(&b.run_at))
        });
        entries
    }

    /// Move scheduled entries whose time has come onto the ready heap.
    /// The scheduled heap is sorted, so stop at the first future entry.
    fn promote_due(&mut self, now: Instant) {
        while let Some(top) = self.scheduled.peek() {
            if top.run_at > now {
                break;
            }
            let due = self.scheduled.pop().expect("peeked entry exists");
            if self.is_live(due.id, due.generation) {
                let slot = &self.slots[&due.id];
                let (priority, run_at) = (slot.entry.priority, slot.entry.run_at);
                self.push_ready_raw(due.id, priority, run_at, due.generation);
            }
        }
    }

    fn push_ready(&mut self, entry: &QueuedTask, generation: u64) {
        self.push_ready_raw(entry.id, entry.priority, entry.run_at, generation);
    }

    fn push_ready_raw(&mut self, id: TaskId, priority: Priority, run_at: Instant, generation: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ready.push(ReadyEntry {
            priority,
            run_at,
            seq,
            generation,
            id,
        });
    }

    fn is_live(&self, id: TaskId, generation: u64) -> bool {
        self.slots
            .get(&id)
            .is_some_and(|slot| slot.generation == generation)
    }
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}
