//! The dispatch loop: periodically fill available execution capacity.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::engine::Engine;
use super::execution::ExecutionController;
use super::state::RunningExecution;

pub(crate) struct DispatchLoop;

impl DispatchLoop {
    /// Spawn the periodic loop. It stops when `shutdown_rx` flips to true
    /// or its sender is dropped; in-flight executions are left alone.
    pub fn spawn(engine: Arc<Engine>, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(Self::run(engine, shutdown_rx))
    }

    async fn run(engine: Arc<Engine>, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval_rx = engine.tick_interval_tx.subscribe();

        // Outer loop rebuilds the timer whenever the interval changes.
        'timer: loop {
            let period = *interval_rx.borrow_and_update();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_ms = period.as_millis() as u64, "dispatch timer started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::tick(&engine).await;
                    }
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break 'timer;
                        }
                        continue 'timer;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break 'timer;
                        }
                    }
                }
            }
        }
        info!("dispatch loop stopped");
    }

    /// One dispatch pass. Skips entirely if another tick is still running
    /// (the flag is the only mutual exclusion between the timer loop and
    /// manual kicks).
    pub(crate) async fn tick(engine: &Arc<Engine>) {
        if engine
            .tick_in_progress
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("tick already in progress, skipping");
            return;
        }
        Self::fill_capacity(engine).await;
        engine.tick_in_progress.store(false, Ordering::Release);
    }

    /// Pop eligible tasks while below the concurrency cap, spawning an
    /// execution for each. Pop and running-set registration happen under
    /// one lock so an id is never in both collections (or neither).
    async fn fill_capacity(engine: &Arc<Engine>) {
        let max_concurrent = engine.config.lock().await.max_concurrent;
        let mut state = engine.state.lock().await;
        let now = Instant::now();

        while state.running.len() < max_concurrent {
            let Some(entry) = state.queue.pop_next_eligible(now) else {
                break;
            };

            let cancel = CancellationToken::new();
            let handle = ExecutionController::spawn(Arc::clone(engine), entry.clone(), cancel.clone());
            debug!(task_id = %entry.id, priority = %entry.priority, "dispatching task");
            state.running.insert(
                entry.id,
                RunningExecution {
                    task_id: entry.id,
                    started_at: now,
                    cancel,
                    handle,
                },
            );
        }
    }
}
