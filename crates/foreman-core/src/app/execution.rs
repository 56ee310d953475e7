//! The execution controller: run exactly one task to completion.
//!
//! Flow: fetch the record fresh (the queue projection may be stale), guard
//! on PENDING, resolve the agent's platform, transition to RUNNING, then
//! race the executor against the deadline and the cancellation signal.
//! Whatever happens, the running-set entry is removed and no error ever
//! propagates out to the dispatch loop.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::Engine;
use super::failure::FailureHandler;
use crate::domain::{AgentResponse, FailureDetail, Task, TaskEvent, TaskId, TaskResult, TaskStatus};
use crate::queue::QueuedTask;

/// How one raced execution settled.
enum Settled {
    Finished(AgentResponse),
    Failed(FailureDetail),
    TimedOut,
    Cancelled,
}

pub(crate) struct ExecutionController;

impl ExecutionController {
    pub fn spawn(
        engine: Arc<Engine>,
        entry: QueuedTask,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(engine, entry, cancel))
    }

    async fn run(engine: Arc<Engine>, entry: QueuedTask, cancel: CancellationToken) {
        let task_id = entry.id;

        let Some(mut task) = engine.load(task_id).await else {
            warn!(task_id = %task_id, "record missing at dispatch, dropping");
            Self::deregister(&engine, task_id).await;
            return;
        };

        // The record may have moved on while the entry sat in the queue.
        if task.status != TaskStatus::Pending {
            debug!(task_id = %task_id, status = ?task.status, "no longer pending, skipping");
            Self::deregister(&engine, task_id).await;
            return;
        }

        // Cancelled between dispatch and here: finalize without running.
        if cancel.is_cancelled() {
            Self::settle_cancelled(&engine, task).await;
            return;
        }

        let agent = match engine.agents.lookup(task.agent_id).await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                let detail =
                    FailureDetail::new(format!("agent {} no longer exists", task.agent_id));
                FailureHandler::handle(&engine, task, &entry, detail).await;
                return;
            }
            Err(err) => {
                FailureHandler::handle(&engine, task, &entry, FailureDetail::new(err.to_string()))
                    .await;
                return;
            }
        };

        task.begin_run(Utc::now());
        engine.persist(&task).await;
        engine
            .notifier
            .status_changed(task_id, TaskStatus::Running, json!({ "agent": agent.platform }))
            .await;
        engine.notifier.progress(task_id, 10, "execution started").await;

        let started = Instant::now();
        engine
            .notifier
            .progress(task_id, 25, "dispatched to agent platform")
            .await;

        // The race. Biased so a deliberate cancel always wins a tie with a
        // finishing executor; the timeout fires the same token the
        // executor observes.
        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => Settled::Cancelled,
            result = engine.executor.execute(&agent.platform, &task.parameters, cancel.clone()) => {
                match result {
                    Ok(response) if response.success => Settled::Finished(response),
                    Ok(response) => Settled::Failed(response.failure_detail()),
                    Err(err) => Settled::Failed(FailureDetail::new(err.to_string())),
                }
            }
            _ = tokio::time::sleep(entry.timeout) => {
                cancel.cancel();
                Settled::TimedOut
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        if matches!(settled, Settled::Finished(_) | Settled::Failed(_)) {
            engine.notifier.progress(task_id, 75, "result received").await;
        }

        match settled {
            Settled::Finished(response) => {
                Self::settle_success(&engine, task, response, duration_ms).await;
            }
            Settled::Failed(detail) => {
                FailureHandler::handle(&engine, task, &entry, detail).await;
            }
            Settled::TimedOut => {
                let detail = FailureDetail::new(format!(
                    "execution timed out after {}ms",
                    entry.timeout.as_millis()
                ));
                FailureHandler::handle(&engine, task, &entry, detail).await;
            }
            Settled::Cancelled => {
                Self::settle_cancelled(&engine, task).await;
            }
        }
    }

    async fn settle_success(
        engine: &Arc<Engine>,
        mut task: Task,
        response: AgentResponse,
        duration_ms: u64,
    ) {
        let now = Utc::now();
        let result = TaskResult {
            success: true,
            output: response.data,
            duration_ms,
            finished_at: now,
        };
        task.complete(result.clone(), now);
        engine.persist(&task).await;
        Self::deregister(engine, task.id).await;

        engine.notifier.progress(task.id, 100, "completed").await;
        engine
            .notifier
            .status_changed(task.id, TaskStatus::Completed, json!({ "duration_ms": duration_ms }))
            .await;
        engine.publish(TaskEvent::Completed {
            task_id: task.id,
            result,
        });
        info!(task_id = %task.id, duration_ms, "task completed");
    }

    /// Terminal, never retried, never enters the failure handler.
    async fn settle_cancelled(engine: &Arc<Engine>, mut task: Task) {
        let now = Utc::now();
        task.cancel(now);
        engine.persist(&task).await;
        Self::deregister(engine, task.id).await;

        engine
            .notifier
            .status_changed(
                task.id,
                TaskStatus::Cancelled,
                json!({ "cancelled_at": now.to_rfc3339() }),
            )
            .await;
        info!(task_id = %task.id, "task cancelled");
    }

    async fn deregister(engine: &Arc<Engine>, task_id: TaskId) {
        engine.state.lock().await.running.remove(&task_id);
    }
}
