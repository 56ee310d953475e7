//! Domain events published for in-process listeners.
//!
//! Delivered over a `tokio::sync::broadcast` channel obtained from
//! `Foreman::subscribe()`; the scheduler core has no compile-time
//! dependency on any specific listener.

use super::ids::TaskId;
use super::outcome::{TaskFailure, TaskResult};

#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A task finished successfully.
    Completed { task_id: TaskId, result: TaskResult },

    /// A task became terminally failed (retries exhausted or none allowed).
    Failed { task_id: TaskId, error: TaskFailure },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskEvent::Completed { task_id, .. } => *task_id,
            TaskEvent::Failed { task_id, .. } => *task_id,
        }
    }
}
