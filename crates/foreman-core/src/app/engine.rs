//! Shared engine wiring: ports, state, config and the event channel.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};
use tracing::warn;

use super::state::EngineState;
use crate::config::SchedulerConfig;
use crate::domain::{Task, TaskEvent, TaskId};
use crate::ports::{AgentDirectory, AgentExecutor, IdGenerator, NotificationSink, TaskStore};
use crate::queue::RetryPolicy;

/// Everything the dispatch loop, execution controllers and the failure
/// handler share. Held behind an `Arc`; the facade owns the only other
/// pieces (shutdown channel, loop handle).
pub(crate) struct Engine {
    pub state: Mutex<EngineState>,
    pub config: Mutex<SchedulerConfig>,

    pub store: Arc<dyn TaskStore>,
    pub agents: Arc<dyn AgentDirectory>,
    pub executor: Arc<dyn AgentExecutor>,
    pub notifier: Arc<dyn NotificationSink>,
    pub ids: Arc<dyn IdGenerator>,
    pub retry_policy: RetryPolicy,

    /// Restarts the dispatch timer when the interval changes.
    pub tick_interval_tx: watch::Sender<Duration>,

    /// Sole mutual-exclusion primitive preventing overlapping dispatch
    /// ticks (the timer loop and manual kicks share it).
    pub tick_in_progress: AtomicBool,

    pub events: broadcast::Sender<TaskEvent>,
}

impl Engine {
    /// Persist a record without letting a store hiccup escape into the
    /// execution path; the dispatch loop must stay alive regardless.
    pub async fn persist(&self, task: &Task) {
        if let Err(err) = self.store.save(task).await {
            warn!(task_id = %task.id, error = %err, "failed to persist task record");
        }
    }

    /// Fetch a record, logging instead of propagating store errors.
    pub async fn load(&self, id: TaskId) -> Option<Task> {
        match self.store.get(id).await {
            Ok(task) => task,
            Err(err) => {
                warn!(task_id = %id, error = %err, "failed to load task record");
                None
            }
        }
    }

    /// Broadcast a domain event; nobody listening is fine.
    pub fn publish(&self, event: TaskEvent) {
        let _ = self.events.send(event);
    }
}
