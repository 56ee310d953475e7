//! The durable task record.
//!
//! The store is a system-of-record mirror; this record is mutated only
//! through the lifecycle transitions below, each of which maintains
//! `updated_at`. The scheduler's queue holds a projection of this record
//! (`queue::QueuedTask`), which may be stale — executions always re-fetch
//! the record before running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AgentId, TaskId, WorkflowId};
use super::outcome::{TaskFailure, TaskResult};
use super::priority::Priority;
use super::spec::TaskRequest;
use super::status::TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub agent_id: AgentId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: serde_json::Value,
    pub priority: Priority,
    pub status: TaskStatus,

    /// Earliest eligible dispatch time.
    pub scheduled_at: DateTime<Utc>,

    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialize a validated request into a PENDING record.
    pub fn from_request(id: TaskId, request: TaskRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            agent_id: request.agent_id,
            workflow_id: request.workflow_id,
            name: request.name,
            description: request.description,
            parameters: request.parameters,
            priority: request.priority,
            status: TaskStatus::Pending,
            scheduled_at: request.scheduled_at.unwrap_or(now),
            retry_count: 0,
            max_retries: request.max_retries,
            timeout_ms: request.timeout_ms,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending -> Running.
    pub fn begin_run(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Running -> Completed (terminal).
    pub fn complete(&mut self, result: TaskResult, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Running -> Failed (terminal; max retries exhausted).
    pub fn fail(&mut self, error: TaskFailure, now: DateTime<Utc>) {
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Pending/Running -> Cancelled (terminal, never retried).
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Cancelled;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Running -> Pending with an incremented retry count and a new
    /// earliest dispatch time. `retry_count` only ever increases here.
    pub fn schedule_retry(&mut self, next_attempt_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.status = TaskStatus::Pending;
        self.retry_count += 1;
        self.scheduled_at = next_attempt_at;
        self.updated_at = now;
    }

    /// Failed -> Pending via the manual retry endpoint. Deliberately does
    /// NOT touch `retry_count` (automatic backoff increments; manual retry
    /// does not). Clears the previous attempt's outcome fields.
    pub fn reset_for_manual_retry(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Pending;
        self.scheduled_at = now;
        self.started_at = None;
        self.completed_at = None;
        self.result = None;
        self.error = None;
        self.updated_at = now;
    }
}
