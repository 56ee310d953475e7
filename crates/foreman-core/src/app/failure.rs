//! The retry/failure handler: re-enqueue with backoff or mark terminal.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::time::Instant;
use tracing::{error, warn};

use super::engine::Engine;
use crate::domain::{FailureDetail, Task, TaskEvent, TaskFailure, TaskStatus};
use crate::queue::QueuedTask;

pub(crate) struct FailureHandler;

impl FailureHandler {
    /// Decide retry vs terminal. Cancellations never reach this point, so
    /// the only rule is whether attempts remain.
    pub async fn handle(
        engine: &Arc<Engine>,
        task: Task,
        entry: &QueuedTask,
        detail: FailureDetail,
    ) {
        if task.retry_count < task.max_retries {
            Self::schedule_retry(engine, task, entry, detail).await;
        } else {
            Self::mark_failed(engine, task, detail).await;
        }
    }

    async fn schedule_retry(
        engine: &Arc<Engine>,
        mut task: Task,
        entry: &QueuedTask,
        detail: FailureDetail,
    ) {
        // Delay from the pre-increment count: first retry waits base_delay.
        let delay = engine.retry_policy.delay_for(task.retry_count);
        let run_at = Instant::now() + delay;
        let now = Utc::now();
        let next_attempt_at = now + chrono::Duration::milliseconds(delay.as_millis() as i64);

        task.schedule_retry(next_attempt_at, now);
        engine.persist(&task).await;

        let requeued = QueuedTask {
            id: task.id,
            priority: task.priority,
            run_at,
            scheduled_at: next_attempt_at,
            retry_count: task.retry_count,
            max_retries: task.max_retries,
            timeout: entry.timeout,
            enqueued_at: Instant::now(),
        };
        {
            // One lock acquisition: the id moves running -> queue with no
            // window where it is in neither or both.
            let mut state = engine.state.lock().await;
            state.running.remove(&task.id);
            state.queue.insert(requeued);
        }

        engine
            .notifier
            .status_changed(
                task.id,
                TaskStatus::Pending,
                json!({
                    "retry": {
                        "attempt": task.retry_count,
                        "max_retries": task.max_retries,
                        "next_attempt_at": next_attempt_at.to_rfc3339(),
                        "last_error": detail.message,
                    }
                }),
            )
            .await;
        warn!(
            task_id = %task.id,
            attempt = task.retry_count,
            delay_ms = delay.as_millis() as u64,
            error = %detail.message,
            "execution failed, retry scheduled"
        );
    }

    async fn mark_failed(engine: &Arc<Engine>, mut task: Task, detail: FailureDetail) {
        let now = Utc::now();
        let failure = TaskFailure {
            message: detail.message.clone(),
            diagnostic: detail.diagnostic.clone(),
            failed_at: now,
            retry_count: task.retry_count,
        };
        task.fail(failure.clone(), now);
        engine.persist(&task).await;
        engine.state.lock().await.running.remove(&task.id);

        engine
            .notifier
            .status_changed(
                task.id,
                TaskStatus::Failed,
                json!({ "retry_count": task.retry_count }),
            )
            .await;
        engine
            .notifier
            .error(
                task.id,
                &detail.message,
                json!({ "retry_count": task.retry_count }),
            )
            .await;
        engine.publish(TaskEvent::Failed {
            task_id: task.id,
            error: failure,
        });
        error!(task_id = %task.id, error = %detail.message, "task failed permanently");
    }
}
