//! NotificationSink port - best-effort observer feedback.

use async_trait::async_trait;

use crate::domain::{TaskId, TaskStatus};

/// Receives status / progress / error events for observers.
///
/// All methods are fire-and-forget: they return nothing, and a sink that
/// fails internally must swallow its own transport errors. Emission never
/// blocks persistence or the execution path — implementations are expected
/// to return promptly (queue internally if delivery is slow).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn status_changed(&self, task_id: TaskId, status: TaskStatus, metadata: serde_json::Value);

    /// Coarse progress milestones, `percent` in 0..=100.
    async fn progress(&self, task_id: TaskId, percent: u8, message: &str);

    async fn error(&self, task_id: TaskId, message: &str, metadata: serde_json::Value);
}

/// Sink that drops everything. The builder default.
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn status_changed(
        &self,
        _task_id: TaskId,
        _status: TaskStatus,
        _metadata: serde_json::Value,
    ) {
    }

    async fn progress(&self, _task_id: TaskId, _percent: u8, _message: &str) {}

    async fn error(&self, _task_id: TaskId, _message: &str, _metadata: serde_json::Value) {}
}
