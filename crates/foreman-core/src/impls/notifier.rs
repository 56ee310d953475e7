//! Notification sinks: one that logs, one that records for assertions.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{TaskId, TaskStatus};
use crate::ports::NotificationSink;

/// Sink that writes every notification to the tracing log. Useful for
/// development wiring where no real transport exists yet.
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn status_changed(&self, task_id: TaskId, status: TaskStatus, metadata: serde_json::Value) {
        debug!(task_id = %task_id, status = ?status, %metadata, "status changed");
    }

    async fn progress(&self, task_id: TaskId, percent: u8, message: &str) {
        debug!(task_id = %task_id, percent, message, "progress");
    }

    async fn error(&self, task_id: TaskId, message: &str, metadata: serde_json::Value) {
        warn!(task_id = %task_id, message, %metadata, "task error");
    }
}

/// One captured notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StatusChanged {
        task_id: TaskId,
        status: TaskStatus,
        metadata: serde_json::Value,
    },
    Progress {
        task_id: TaskId,
        percent: u8,
        message: String,
    },
    Error {
        task_id: TaskId,
        message: String,
        metadata: serde_json::Value,
    },
}

/// Sink that records everything it receives, for tests.
pub struct RecordingNotifier {
    records: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.records.lock().expect("notifier lock").clone()
    }

    /// The sequence of statuses announced for one task.
    pub fn statuses_for(&self, id: TaskId) -> Vec<TaskStatus> {
        self.snapshot()
            .into_iter()
            .filter_map(|n| match n {
                Notification::StatusChanged { task_id, status, .. } if task_id == id => {
                    Some(status)
                }
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn status_changed(&self, task_id: TaskId, status: TaskStatus, metadata: serde_json::Value) {
        self.records
            .lock()
            .expect("notifier lock")
            .push(Notification::StatusChanged {
                task_id,
                status,
                metadata,
            });
    }

    async fn progress(&self, task_id: TaskId, percent: u8, message: &str) {
        self.records
            .lock()
            .expect("notifier lock")
            .push(Notification::Progress {
                task_id,
                percent,
                message: message.to_string(),
            });
    }

    async fn error(&self, task_id: TaskId, message: &str, metadata: serde_json::Value) {
        self.records
            .lock()
            .expect("notifier lock")
            .push(Notification::Error {
                task_id,
                message: message.to_string(),
                metadata,
            });
    }
}
