//! Execution outcomes: what executors report and what the record retains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a platform executor reports back.
///
/// The contract is `{ success, data }`: a returned `success: false` is a
/// retryable failure exactly like a thrown error, with the diagnostic
/// carried in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,

    #[serde(default)]
    pub data: serde_json::Value,
}

impl AgentResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn failed(data: serde_json::Value) -> Self {
        Self {
            success: false,
            data,
        }
    }

    /// Failure detail for a `success: false` response. Uses the response's
    /// `error` field when present, otherwise the serialized payload.
    pub fn failure_detail(&self) -> FailureDetail {
        let message = match self.data.get("error").and_then(|v| v.as_str()) {
            Some(msg) => msg.to_string(),
            None => format!("agent reported failure: {}", self.data),
        };
        FailureDetail::new(message)
    }
}

/// Success payload retained on a COMPLETED record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    pub output: serde_json::Value,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Structured error retained on a FAILED record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,

    pub failed_at: DateTime<Utc>,

    /// Retry count at the moment the task became terminal.
    pub retry_count: u32,
}

/// In-flight failure description handed to the retry handler.
///
/// Cancellations never become a `FailureDetail`; they finalize the task
/// directly and skip the retry machinery.
#[derive(Debug, Clone)]
pub struct FailureDetail {
    pub message: String,
    pub diagnostic: Option<String>,
}

impl FailureDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_detail_prefers_the_error_field() {
        let resp = AgentResponse::failed(serde_json::json!({"error": "rate limited"}));
        assert_eq!(resp.failure_detail().message, "rate limited");
    }

    #[test]
    fn failure_detail_falls_back_to_the_payload() {
        let resp = AgentResponse::failed(serde_json::json!({"code": 502}));
        assert!(resp.failure_detail().message.contains("502"));
    }

    #[test]
    fn task_failure_round_trips_without_diagnostic() {
        let failure = TaskFailure {
            message: "boom".to_string(),
            diagnostic: None,
            failed_at: Utc::now(),
            retry_count: 3,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("diagnostic").is_none());
        let back: TaskFailure = serde_json::from_value(json).unwrap();
        assert_eq!(back.retry_count, 3);
    }
}
