//! Task lifecycle states.

use serde::{Deserialize, Serialize};

/// Status of a task record.
///
/// Transitions:
/// - Pending -> Running (dispatch)
/// - Running -> Completed (terminal)
/// - Running -> Cancelled (terminal, no retry)
/// - Running -> Pending (retryable failure, re-enqueued with backoff)
/// - Running -> Failed (max retries exceeded; terminal, but a manual
///   `retry()` may move it back to Pending)
/// - Pending -> Cancelled (cancelled while still queued)
///
/// Nothing leaves Running except through completion, cancellation, or the
/// failure handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Is this a terminal state? (Failed counts: only an explicit manual
    /// retry resurrects it.)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pending(TaskStatus::Pending, false)]
    #[case::running(TaskStatus::Running, false)]
    #[case::completed(TaskStatus::Completed, true)]
    #[case::failed(TaskStatus::Failed, true)]
    #[case::cancelled(TaskStatus::Cancelled, true)]
    fn terminal_states(#[case] status: TaskStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        let back: TaskStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, TaskStatus::Cancelled);
    }
}
