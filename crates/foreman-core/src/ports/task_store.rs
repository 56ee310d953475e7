//! TaskStore port - the durable system of record for task lifecycles.

use async_trait::async_trait;

use crate::domain::{Task, TaskId};
use crate::error::ForemanError;

/// Durable storage for task records.
///
/// Design intent:
/// - The store mirrors the scheduler's lifecycle transitions; the live
///   queue stays in process memory and is never reconstructed from here.
/// - Treated as externally synchronized: last-writer-wins per record, no
///   optimistic concurrency assumed.
/// - Executions re-fetch through `get` before running because the queue's
///   projection of a task may be stale.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get(&self, id: TaskId) -> Result<Option<Task>, ForemanError>;

    /// Insert or overwrite the record for `task.id`.
    async fn save(&self, task: &Task) -> Result<(), ForemanError>;
}
