//! Queue entries and their heap orderings.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::domain::{Priority, Task, TaskId};

/// The scheduling projection of a task while it awaits dispatch.
///
/// Carries only what the queue needs to order and dispatch. Created when a
/// task is (re-)enqueued, destroyed the moment it is handed to an
/// execution. `run_at` is monotonic time (what dispatch eligibility is
/// measured against); `scheduled_at` is the wall-clock mirror kept for
/// status views.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: TaskId,
    pub priority: Priority,
    pub run_at: Instant,
    pub scheduled_at: DateTime<Utc>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    pub enqueued_at: Instant,
}

impl QueuedTask {
    /// Project a task record into a queue entry eligible at `run_at`.
    pub fn for_task(task: &Task, run_at: Instant) -> Self {
        Self {
            id: task.id,
            priority: task.priority,
            run_at,
            scheduled_at: task.scheduled_at,
            retry_count: task.retry_count,
            max_retries: task.max_retries,
            timeout: Duration::from_millis(task.timeout_ms),
            enqueued_at: Instant::now(),
        }
    }
}

/// Ready-heap entry: max-heap by priority, then earliest `run_at`, then
/// insertion sequence (FIFO among exact ties).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReadyEntry {
    pub priority: Priority,
    pub run_at: Instant,
    pub seq: u64,
    pub generation: u64,
    pub id: TaskId,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.run_at.cmp(&self.run_at))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scheduled-heap entry.
///
/// Reverse ordering so BinaryHeap acts as a min-heap (earliest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DueEntry {
    pub run_at: Instant,
    pub generation: u64,
    pub id: TaskId,
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.run_at.cmp(&self.run_at)
    }
}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
