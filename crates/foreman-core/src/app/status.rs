//! Read-only snapshot types for queue introspection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Priority, TaskId};
use crate::queue::QueuedTask;

/// Snapshot returned by `Foreman::queue_status`. No side effects.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusView {
    pub queue_size: usize,
    pub running: usize,
    pub max_concurrent: usize,
    pub queued: Vec<QueuedTaskView>,
}

/// One queued task as exposed to observers, future-scheduled entries
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedTaskView {
    pub id: TaskId,
    pub priority: Priority,
    pub scheduled_at: DateTime<Utc>,
    pub retry_count: u32,
}

impl From<&QueuedTask> for QueuedTaskView {
    fn from(entry: &QueuedTask) -> Self {
        Self {
            id: entry.id,
            priority: entry.priority,
            scheduled_at: entry.scheduled_at,
            retry_count: entry.retry_count,
        }
    }
}
