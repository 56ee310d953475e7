//! Foreman - the public service facade.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::dispatcher::DispatchLoop;
use super::engine::Engine;
use super::state::EngineState;
use super::status::{QueueStatusView, QueuedTaskView};
use crate::config::{ConfigUpdate, SchedulerConfig, clamp_concurrency, clamp_tick_interval};
use crate::domain::{Task, TaskEvent, TaskId, TaskRequest, TaskStatus};
use crate::error::ForemanError;
use crate::ports::{AgentDirectory, AgentExecutor, IdGenerator, NotificationSink, TaskStore};
use crate::queue::{QueuedTask, RetryPolicy};

/// The scheduler's public surface: submit, cancel, retry, inspect,
/// reconfigure, subscribe. Construct through `ForemanBuilder`, then
/// `start()` the dispatch loop.
pub struct Foreman {
    engine: Arc<Engine>,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Foreman {
    pub(crate) fn new(
        store: Arc<dyn TaskStore>,
        agents: Arc<dyn AgentDirectory>,
        executor: Arc<dyn AgentExecutor>,
        notifier: Arc<dyn NotificationSink>,
        ids: Arc<dyn IdGenerator>,
        retry_policy: RetryPolicy,
        config: SchedulerConfig,
    ) -> Self {
        let (tick_interval_tx, _) = watch::channel(config.tick_interval);
        let (events, _) = broadcast::channel(64);
        let (shutdown_tx, _) = watch::channel(false);

        let engine = Arc::new(Engine {
            state: Mutex::new(EngineState::new()),
            config: Mutex::new(config),
            store,
            agents,
            executor,
            notifier,
            ids,
            retry_policy,
            tick_interval_tx,
            tick_in_progress: AtomicBool::new(false),
            events,
        });

        Self {
            engine,
            shutdown_tx,
            loop_handle: Mutex::new(None),
        }
    }

    /// Start the dispatch loop. A no-op when already running.
    pub async fn start(&self) {
        let mut guard = self.loop_handle.lock().await;
        if guard.is_some() {
            return;
        }
        self.shutdown_tx.send_replace(false);
        *guard = Some(DispatchLoop::spawn(
            Arc::clone(&self.engine),
            self.shutdown_tx.subscribe(),
        ));
    }

    /// Stop the dispatch loop and wait for it to exit. Halts future ticks
    /// only — in-flight executions run to their own conclusion.
    pub async fn shutdown(&self) {
        let handle = self.loop_handle.lock().await.take();
        if let Some(handle) = handle {
            self.shutdown_tx.send_replace(true);
            let _ = handle.await;
        }
    }

    /// Validate a request, resolve its agent, persist the PENDING record
    /// and place it in the queue.
    pub async fn enqueue(&self, request: TaskRequest) -> Result<TaskId, ForemanError> {
        request.validate()?;

        let agent = self
            .engine
            .agents
            .lookup(request.agent_id)
            .await?
            .ok_or(ForemanError::AgentNotFound(request.agent_id))?;
        if !agent.active {
            return Err(ForemanError::Precondition(format!(
                "agent {} is not active",
                agent.id
            )));
        }

        let now = Utc::now();
        let id = self.engine.ids.task_id();
        let task = Task::from_request(id, request, now);
        self.engine.store.save(&task).await?;

        let entry = QueuedTask::for_task(&task, run_at_for(task.scheduled_at, now));
        self.engine.state.lock().await.queue.insert(entry);
        debug!(task_id = %id, priority = %task.priority, "task enqueued");
        Ok(id)
    }

    /// Cancel a task. Idempotent: cancelling an already-cancelled task is
    /// Ok. Removes a pending task from the queue directly (it never
    /// reaches RUNNING); signals a running execution's token and lets the
    /// controller finalize.
    pub async fn cancel(&self, task_id: TaskId) -> Result<(), ForemanError> {
        let removed_from_queue = {
            let mut state = self.engine.state.lock().await;
            if let Some(run) = state.running.get(&task_id) {
                debug!(
                    task_id = %run.task_id,
                    running_for_ms = run.started_at.elapsed().as_millis() as u64,
                    "cancellation signalled to running execution"
                );
                run.cancel.cancel();
                return Ok(());
            }
            state.queue.remove(task_id).is_some()
        };

        if removed_from_queue {
            let Some(mut task) = self.engine.load(task_id).await else {
                return Err(ForemanError::TaskNotFound(task_id));
            };
            task.cancel(Utc::now());
            self.engine.store.save(&task).await?;
            self.engine
                .notifier
                .status_changed(task_id, TaskStatus::Cancelled, json!({}))
                .await;
            return Ok(());
        }

        // Not tracked in memory: decide off the stored record.
        match self.engine.store.get(task_id).await? {
            None => Err(ForemanError::TaskNotFound(task_id)),
            Some(task) if task.status == TaskStatus::Cancelled => Ok(()),
            Some(task) if task.status.is_terminal() => Err(ForemanError::Precondition(format!(
                "task {task_id} already settled as {:?}",
                task.status
            ))),
            Some(mut task) => {
                // A pending record the queue no longer knows about (e.g.
                // after a restart). Finalize it directly.
                task.cancel(Utc::now());
                self.engine.store.save(&task).await?;
                self.engine
                    .notifier
                    .status_changed(task_id, TaskStatus::Cancelled, json!({}))
                    .await;
                Ok(())
            }
        }
    }

    /// Re-enqueue a FAILED task. The manual path deliberately leaves
    /// `retry_count` untouched — only automatic backoff increments it.
    pub async fn retry(&self, task_id: TaskId) -> Result<(), ForemanError> {
        let Some(mut task) = self.engine.store.get(task_id).await? else {
            return Err(ForemanError::TaskNotFound(task_id));
        };
        if task.status != TaskStatus::Failed {
            return Err(ForemanError::Precondition(format!(
                "retry requires FAILED status, task {task_id} is {:?}",
                task.status
            )));
        }

        task.reset_for_manual_retry(Utc::now());
        self.engine.store.save(&task).await?;

        let entry = QueuedTask::for_task(&task, Instant::now());
        self.engine.state.lock().await.queue.insert(entry);
        debug!(task_id = %task_id, "task re-enqueued for manual retry");
        Ok(())
    }

    /// Read-only snapshot of the queue and running set.
    pub async fn queue_status(&self) -> QueueStatusView {
        let max_concurrent = self.engine.config.lock().await.max_concurrent;
        let state = self.engine.state.lock().await;
        QueueStatusView {
            queue_size: state.queue.len(),
            running: state.running.len(),
            max_concurrent,
            queued: state.queue.snapshot().iter().map(QueuedTaskView::from).collect(),
        }
    }

    /// Apply new scheduler knobs, clamped to their documented ranges.
    /// An interval change restarts the dispatch timer.
    pub async fn configure(&self, update: ConfigUpdate) {
        let mut config = self.engine.config.lock().await;
        if let Some(n) = update.max_concurrent {
            config.max_concurrent = clamp_concurrency(n);
        }
        if let Some(ms) = update.tick_interval_ms {
            let tick_interval = clamp_tick_interval(ms);
            if tick_interval != config.tick_interval {
                config.tick_interval = tick_interval;
                let _ = self.engine.tick_interval_tx.send(tick_interval);
            }
        }
    }

    /// Register for task-completed / task-failed events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.engine.events.subscribe()
    }

    /// Run one dispatch pass right now instead of waiting out the tick.
    /// Shares the tick-in-progress guard with the periodic loop.
    pub async fn kick(&self) {
        DispatchLoop::tick(&self.engine).await;
    }
}

/// Translate a wall-clock schedule into the monotonic eligibility time the
/// queue dispatches against. Past schedules are eligible immediately.
fn run_at_for(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Instant {
    let delay = (scheduled_at - now).to_std().unwrap_or(Duration::ZERO);
    Instant::now() + delay
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use ulid::Ulid;

    use super::*;
    use crate::app::builder::ForemanBuilder;
    use crate::domain::{AgentId, AgentResponse, Priority};
    use crate::impls::{InMemoryTaskStore, RecordingNotifier, StaticAgentDirectory};
    use crate::ports::AgentRef;

    /// Scriptable executor: fail the first N calls, optionally run slow,
    /// optionally hang until cancelled. Records every call's marker, start
    /// time, and the peak number of concurrent invocations.
    struct TestExecutor {
        delay: Duration,
        failures_left: AtomicU32,
        always_fail: bool,
        hang_until_cancelled: bool,
        calls: StdMutex<Vec<(String, Instant)>>,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TestExecutor {
        fn succeeding() -> Self {
            Self::scripted(Duration::ZERO, 0, false, false)
        }

        fn failing_first(n: u32) -> Self {
            Self::scripted(Duration::ZERO, n, false, false)
        }

        fn always_failing() -> Self {
            Self::scripted(Duration::ZERO, 0, true, false)
        }

        fn hanging() -> Self {
            Self::scripted(Duration::ZERO, 0, false, true)
        }

        fn slow(delay: Duration) -> Self {
            Self::scripted(delay, 0, false, false)
        }

        fn scripted(delay: Duration, failures: u32, always_fail: bool, hang: bool) -> Self {
            Self {
                delay,
                failures_left: AtomicU32::new(failures),
                always_fail,
                hang_until_cancelled: hang,
                calls: StdMutex::new(Vec::new()),
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_markers(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }
    }

    #[async_trait]
    impl crate::ports::AgentExecutor for TestExecutor {
        async fn execute(
            &self,
            _platform: &str,
            parameters: &serde_json::Value,
            cancel: CancellationToken,
        ) -> Result<AgentResponse, ForemanError> {
            let marker = parameters
                .get("marker")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            self.calls.lock().unwrap().push((marker, Instant::now()));
            let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);

            let result = async {
                if self.hang_until_cancelled {
                    cancel.cancelled().await;
                    return Err(ForemanError::Execution("interrupted by signal".into()));
                }
                if !self.delay.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(ForemanError::Execution("interrupted by signal".into()));
                        }
                        _ = tokio::time::sleep(self.delay) => {}
                    }
                }
                let must_fail = self.always_fail
                    || self
                        .failures_left
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                if must_fail {
                    Err(ForemanError::Execution("scripted failure".into()))
                } else {
                    Ok(AgentResponse::ok(serde_json::json!({ "echo": true })))
                }
            }
            .await;

            self.current.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    struct Harness {
        foreman: Foreman,
        store: Arc<InMemoryTaskStore>,
        executor: Arc<TestExecutor>,
        notifier: Arc<RecordingNotifier>,
        agent_id: AgentId,
    }

    fn harness(executor: TestExecutor) -> Harness {
        let store = Arc::new(InMemoryTaskStore::new());
        let executor = Arc::new(executor);
        let notifier = Arc::new(RecordingNotifier::new());
        let agent_id = AgentId::from_ulid(Ulid::new());
        let agents = StaticAgentDirectory::new().with_agent(AgentRef {
            id: agent_id,
            platform: "mock".to_string(),
            active: true,
        });

        let foreman = ForemanBuilder::new()
            .task_store(Arc::clone(&store) as Arc<dyn TaskStore>)
            .agent_directory(Arc::new(agents))
            .executor(Arc::clone(&executor) as Arc<dyn crate::ports::AgentExecutor>)
            .notifier(Arc::clone(&notifier) as Arc<dyn NotificationSink>)
            .id_generator(Arc::new(crate::ports::SequentialIdGenerator::new()))
            .config(SchedulerConfig {
                max_concurrent: 10,
                tick_interval: Duration::from_millis(100),
            })
            .build()
            .expect("harness wiring is complete");

        Harness {
            foreman,
            store,
            executor,
            notifier,
            agent_id,
        }
    }

    fn request(h: &Harness, name: &str) -> TaskRequest {
        TaskRequest::new(name, h.agent_id)
            .with_parameters(serde_json::json!({ "marker": name }))
    }

    async fn wait_for_status(h: &Harness, id: TaskId, status: TaskStatus) -> Task {
        tokio::time::timeout(Duration::from_secs(300), async {
            loop {
                if let Ok(Some(task)) = h.store.get(id).await
                    && task.status == status
                {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("task never reached {status:?}"))
    }

    // --- enqueue surface -------------------------------------------------

    #[tokio::test]
    async fn enqueue_rejects_invalid_requests() {
        let h = harness(TestExecutor::succeeding());
        let bad = request(&h, "t").with_timeout_ms(10);
        assert!(matches!(
            h.foreman.enqueue(bad).await,
            Err(ForemanError::Validation { field: "timeout_ms", .. })
        ));
    }

    #[tokio::test]
    async fn enqueue_rejects_unknown_and_inactive_agents() {
        let h = harness(TestExecutor::succeeding());

        let unknown = TaskRequest::new("t", AgentId::from_ulid(Ulid::new()));
        assert!(matches!(
            h.foreman.enqueue(unknown).await,
            Err(ForemanError::AgentNotFound(_))
        ));

        // Separate wiring with an inactive agent.
        let store = Arc::new(InMemoryTaskStore::new());
        let agent_id = AgentId::from_ulid(Ulid::new());
        let agents = StaticAgentDirectory::new().with_agent(AgentRef {
            id: agent_id,
            platform: "mock".to_string(),
            active: false,
        });
        let foreman = ForemanBuilder::new()
            .task_store(store)
            .agent_directory(Arc::new(agents))
            .executor(Arc::new(TestExecutor::succeeding()))
            .build()
            .unwrap();
        assert!(matches!(
            foreman.enqueue(TaskRequest::new("t", agent_id)).await,
            Err(ForemanError::Precondition(_))
        ));
    }

    // --- dispatch ordering and capacity ----------------------------------

    #[tokio::test(start_paused = true)]
    async fn dispatches_in_priority_order() {
        let h = harness(TestExecutor::succeeding());
        h.foreman
            .configure(ConfigUpdate {
                max_concurrent: Some(1),
                tick_interval_ms: None,
            })
            .await;

        // Enqueued LOW, HIGH, MEDIUM, CRITICAL with identical schedules.
        let mut ids = Vec::new();
        for (name, priority) in [
            ("low", Priority::Low),
            ("high", Priority::High),
            ("medium", Priority::Medium),
            ("critical", Priority::Critical),
        ] {
            let id = h
                .foreman
                .enqueue(request(&h, name).with_priority(priority))
                .await
                .unwrap();
            ids.push(id);
        }

        h.foreman.start().await;
        for id in &ids {
            wait_for_status(&h, *id, TaskStatus::Completed).await;
        }
        h.foreman.shutdown().await;

        assert_eq!(h.executor.call_markers(), vec!["critical", "high", "medium", "low"]);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_the_concurrency_cap() {
        let h = harness(TestExecutor::slow(Duration::from_millis(500)));
        h.foreman
            .configure(ConfigUpdate {
                max_concurrent: Some(2),
                tick_interval_ms: None,
            })
            .await;

        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(h.foreman.enqueue(request(&h, &format!("t{i}"))).await.unwrap());
        }

        h.foreman.start().await;
        for id in &ids {
            wait_for_status(&h, *id, TaskStatus::Completed).await;
        }
        h.foreman.shutdown().await;

        assert_eq!(h.executor.call_count(), 6);
        assert!(
            h.executor.peak.load(Ordering::SeqCst) <= 2,
            "cap was exceeded: peak {}",
            h.executor.peak.load(Ordering::SeqCst)
        );
        assert_eq!(h.executor.peak.load(Ordering::SeqCst), 2, "cap never filled");
    }

    // --- retry machinery -------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn retries_with_exponential_backoff_then_fails() {
        let h = harness(TestExecutor::always_failing());
        let id = h
            .foreman
            .enqueue(request(&h, "doomed").with_max_retries(3))
            .await
            .unwrap();

        h.foreman.start().await;
        let task = wait_for_status(&h, id, TaskStatus::Failed).await;
        h.foreman.shutdown().await;

        // Four attempts total; the final count is 3, not 4.
        assert_eq!(h.executor.call_count(), 4);
        assert_eq!(task.retry_count, 3);
        let error = task.error.expect("terminal failure retains the error");
        assert_eq!(error.retry_count, 3);
        assert!(error.message.contains("scripted failure"));

        // Delays 1s, 2s, 4s between attempts (plus up to one tick of
        // dispatch quantization).
        let times = h.executor.call_times();
        let expected = [
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ];
        for (i, want) in expected.iter().enumerate() {
            let gap = times[i + 1] - times[i];
            assert!(gap >= *want, "gap {i} too short: {gap:?}");
            assert!(
                gap <= *want + Duration::from_millis(300),
                "gap {i} too long: {gap:?}"
            );
        }

        // Each retry went back through PENDING with retry metadata.
        let pending_announcements = h
            .notifier
            .statuses_for(id)
            .into_iter()
            .filter(|s| *s == TaskStatus::Pending)
            .count();
        assert_eq!(pending_announcements, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_retries_means_exactly_one_attempt() {
        let h = harness(TestExecutor::always_failing());
        let id = h
            .foreman
            .enqueue(
                request(&h, "one-shot")
                    .with_priority(Priority::High)
                    .with_max_retries(0),
            )
            .await
            .unwrap();

        h.foreman.start().await;
        let task = wait_for_status(&h, id, TaskStatus::Failed).await;
        h.foreman.shutdown().await;

        assert_eq!(h.executor.call_count(), 1);
        assert_eq!(task.retry_count, 0);
        assert!(task.error.is_some());
        assert_eq!(h.foreman.queue_status().await.queue_size, 0, "no re-enqueue");
    }

    #[tokio::test(start_paused = true)]
    async fn manual_retry_preserves_retry_count_and_can_complete() {
        let h = harness(TestExecutor::failing_first(1));
        let id = h
            .foreman
            .enqueue(request(&h, "flaky").with_max_retries(0))
            .await
            .unwrap();

        h.foreman.start().await;
        wait_for_status(&h, id, TaskStatus::Failed).await;

        h.foreman.retry(id).await.unwrap();
        let task = wait_for_status(&h, id, TaskStatus::Completed).await;
        h.foreman.shutdown().await;

        assert_eq!(task.retry_count, 0, "manual retry does not increment");
        assert!(task.result.is_some());
        assert_eq!(h.executor.call_count(), 2);
    }

    #[tokio::test]
    async fn manual_retry_requires_failed_status() {
        let h = harness(TestExecutor::succeeding());
        let id = h.foreman.enqueue(request(&h, "queued")).await.unwrap();
        assert!(matches!(
            h.foreman.retry(id).await,
            Err(ForemanError::Precondition(_))
        ));
        assert!(matches!(
            h.foreman.retry(TaskId::from_u128(42)).await,
            Err(ForemanError::TaskNotFound(_))
        ));
    }

    // --- scheduling ------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn future_schedule_is_honored() {
        let h = harness(TestExecutor::succeeding());
        let id = h
            .foreman
            .enqueue(
                request(&h, "later")
                    .with_scheduled_at(Utc::now() + chrono::Duration::seconds(5)),
            )
            .await
            .unwrap();

        h.foreman.start().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(h.executor.call_count(), 0, "dispatched before its schedule");
        let status = h.foreman.queue_status().await;
        assert_eq!(status.queue_size, 1);
        assert_eq!(status.queued[0].retry_count, 0);

        wait_for_status(&h, id, TaskStatus::Completed).await;
        h.foreman.shutdown().await;
    }

    // --- cancellation ----------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_running_task_is_terminal_without_retry() {
        let h = harness(TestExecutor::hanging());
        let id = h.foreman.enqueue(request(&h, "longhaul")).await.unwrap();

        h.foreman.start().await;
        wait_for_status(&h, id, TaskStatus::Running).await;

        h.foreman.cancel(id).await.unwrap();
        wait_for_status(&h, id, TaskStatus::Cancelled).await;
        // Let the controller finish deregistering before inspecting.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = h.foreman.queue_status().await;
        assert_eq!(status.queue_size, 0);
        assert_eq!(status.running, 0);

        // Idempotent: second cancel succeeds, status stays CANCELLED.
        h.foreman.cancel(id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let task = h.store.get(id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert!(task.completed_at.is_some());
        assert_eq!(h.executor.call_count(), 1, "no retry after cancellation");
        h.foreman.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_pending_task_never_runs_it() {
        let h = harness(TestExecutor::succeeding());
        let id = h
            .foreman
            .enqueue(
                request(&h, "not-yet")
                    .with_scheduled_at(Utc::now() + chrono::Duration::seconds(60)),
            )
            .await
            .unwrap();

        h.foreman.start().await;
        h.foreman.cancel(id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(90)).await;
        h.foreman.shutdown().await;

        let task = h.store.get(id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
        assert_eq!(h.executor.call_count(), 0);
        assert!(
            !h.notifier.statuses_for(id).contains(&TaskStatus::Running),
            "a cancelled pending task must never reach RUNNING"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_a_completed_task_is_a_precondition_error() {
        let h = harness(TestExecutor::succeeding());
        let id = h.foreman.enqueue(request(&h, "done")).await.unwrap();
        h.foreman.start().await;
        wait_for_status(&h, id, TaskStatus::Completed).await;
        h.foreman.shutdown().await;

        assert!(matches!(
            h.foreman.cancel(id).await,
            Err(ForemanError::Precondition(_))
        ));
        assert!(matches!(
            h.foreman.cancel(TaskId::from_u128(42)).await,
            Err(ForemanError::TaskNotFound(_))
        ));
    }

    // --- timeout ---------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_the_task_close_to_the_deadline() {
        let h = harness(TestExecutor::hanging());
        let started = Instant::now();
        let id = h
            .foreman
            .enqueue(
                request(&h, "stuck")
                    .with_timeout_ms(1_000)
                    .with_max_retries(0),
            )
            .await
            .unwrap();

        h.foreman.start().await;
        let task = wait_for_status(&h, id, TaskStatus::Failed).await;
        h.foreman.shutdown().await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "failed early: {elapsed:?}");
        assert!(
            elapsed <= Duration::from_millis(1_600),
            "failed far past the deadline: {elapsed:?}"
        );
        let error = task.error.expect("timeout retains an error");
        assert!(error.message.contains("timed out"));
    }

    // --- introspection, events, config -----------------------------------

    #[tokio::test]
    async fn queue_status_reports_queued_tasks() {
        let h = harness(TestExecutor::succeeding());
        h.foreman
            .enqueue(request(&h, "a").with_priority(Priority::Critical))
            .await
            .unwrap();
        h.foreman.enqueue(request(&h, "b")).await.unwrap();

        let status = h.foreman.queue_status().await;
        assert_eq!(status.queue_size, 2);
        assert_eq!(status.running, 0);
        assert_eq!(status.max_concurrent, 10);
        assert_eq!(status.queued.len(), 2);
        assert_eq!(status.queued[0].priority, Priority::Critical);
    }

    #[tokio::test]
    async fn configure_clamps_to_documented_ranges() {
        let h = harness(TestExecutor::succeeding());
        h.foreman
            .configure(ConfigUpdate {
                max_concurrent: Some(1_000),
                tick_interval_ms: Some(5),
            })
            .await;
        assert_eq!(h.foreman.queue_status().await.max_concurrent, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_and_failure_events_are_broadcast() {
        let h = harness(TestExecutor::failing_first(1));
        let mut events = h.foreman.subscribe();

        let id = h
            .foreman
            .enqueue(request(&h, "evented").with_max_retries(1))
            .await
            .unwrap();
        h.foreman.start().await;
        wait_for_status(&h, id, TaskStatus::Completed).await;
        h.foreman.shutdown().await;

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("an event arrives")
            .expect("channel open");
        match event {
            TaskEvent::Completed { task_id, result } => {
                assert_eq!(task_id, id);
                assert!(result.success);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn kick_dispatches_without_the_timer() {
        let h = harness(TestExecutor::succeeding());
        let id = h.foreman.enqueue(request(&h, "kicked")).await.unwrap();

        // No start(): a single manual pass dispatches the task.
        h.foreman.kick().await;
        wait_for_status(&h, id, TaskStatus::Completed).await;
        assert_eq!(h.executor.call_count(), 1);
    }
}
