//! Task submission descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AgentId, WorkflowId};
use super::priority::Priority;
use crate::config::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS, MAX_RETRIES_LIMIT, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS,
};
use crate::error::ForemanError;

/// What a caller hands to `enqueue`.
///
/// Defaults match the public contract: priority MEDIUM, empty parameters,
/// scheduled "now", max_retries 3, timeout 30s. Validation is explicit
/// (`validate`) and runs before anything touches the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub name: String,

    pub agent_id: AgentId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Opaque key/value parameters passed through to the platform executor.
    #[serde(default)]
    pub parameters: serde_json::Value,

    #[serde(default)]
    pub priority: Priority,

    /// Earliest eligible dispatch time; `None` means now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    pub max_retries: u32,

    pub timeout_ms: u64,
}

impl TaskRequest {
    pub fn new(name: impl Into<String>, agent_id: AgentId) -> Self {
        Self {
            name: name.into(),
            agent_id,
            workflow_id: None,
            description: None,
            parameters: serde_json::json!({}),
            priority: Priority::default(),
            scheduled_at: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_workflow(mut self, workflow_id: WorkflowId) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    pub fn with_scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Check the documented submission constraints.
    pub fn validate(&self) -> Result<(), ForemanError> {
        if self.name.trim().is_empty() {
            return Err(ForemanError::Validation {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ForemanError::Validation {
                field: "max_retries",
                reason: format!("{} exceeds limit {MAX_RETRIES_LIMIT}", self.max_retries),
            });
        }
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ForemanError::Validation {
                field: "timeout_ms",
                reason: format!(
                    "{} outside allowed range {MIN_TIMEOUT_MS}..={MAX_TIMEOUT_MS}",
                    self.timeout_ms
                ),
            });
        }
        if !self.parameters.is_object() {
            return Err(ForemanError::Validation {
                field: "parameters",
                reason: "must be a JSON object".to_string(),
            });
        }
        Ok(())
    }
}
