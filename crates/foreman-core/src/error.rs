use thiserror::Error;

use crate::domain::{AgentId, TaskId};

/// Errors surfaced by the scheduler's public surface.
///
/// Validation, not-found and precondition errors are returned synchronously
/// from `enqueue`/`cancel`/`retry` and never enter the queue. Execution-time
/// failures (executor errors, timeouts) are consumed inside the execution
/// controller and routed through the retry handler instead; they only show
/// up here when an executor implementation chooses to return one.
#[derive(Debug, Error)]
pub enum ForemanError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("agent execution failed: {0}")]
    Execution(String),

    #[error("task store error: {0}")]
    Store(String),
}
