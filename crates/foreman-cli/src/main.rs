//! Demo: wire the scheduler with in-memory adapters and watch a flaky
//! agent task retry its way to success next to well-behaved neighbors.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::info;

use foreman_core::domain::{AgentId, AgentResponse, Priority, TaskEvent, TaskRequest};
use foreman_core::error::ForemanError;
use foreman_core::impls::{InMemoryTaskStore, StaticAgentDirectory, TracingNotifier};
use foreman_core::ports::{AgentExecutor, AgentRef, CancellationToken};
use foreman_core::{ConfigUpdate, ForemanBuilder};

#[derive(Debug, Deserialize)]
struct JobParams {
    job: String,
}

/// Pretends to call an external platform; fails the first N invocations of
/// the flaky job to show the backoff machinery working.
struct DemoExecutor {
    remaining_failures: AtomicU32,
}

impl DemoExecutor {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl AgentExecutor for DemoExecutor {
    async fn execute(
        &self,
        platform: &str,
        parameters: &serde_json::Value,
        _cancel: CancellationToken,
    ) -> Result<AgentResponse, ForemanError> {
        let params: JobParams = serde_json::from_value(parameters.clone())
            .map_err(|e| ForemanError::Execution(format!("json decode: {e}")))?;
        sleep(Duration::from_millis(200)).await;

        if params.job == "flaky" {
            let left = self.remaining_failures.load(Ordering::Relaxed);
            if left > 0 {
                self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
                return Err(ForemanError::Execution(format!(
                    "intentional failure (left={left})"
                )));
            }
        }

        println!("  [{platform}] ran job '{}'", params.job);
        Ok(AgentResponse::ok(serde_json::json!({ "job": params.job })))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // (A) In-memory wiring: store, one active agent, a flaky executor.
    let store = Arc::new(InMemoryTaskStore::new());
    let agent_id = AgentId::from_u128(1);
    let agents = StaticAgentDirectory::new().with_agent(AgentRef {
        id: agent_id,
        platform: "demo-platform".to_string(),
        active: true,
    });

    let foreman = ForemanBuilder::new()
        .task_store(store.clone())
        .agent_directory(Arc::new(agents))
        .executor(Arc::new(DemoExecutor::new(2)))
        .notifier(Arc::new(TracingNotifier))
        .build()
        .expect("wiring is complete");
    info!("scheduler wired with in-memory adapters");

    // (B) Fast ticks for the demo, and a modest cap.
    foreman
        .configure(ConfigUpdate {
            max_concurrent: Some(4),
            tick_interval_ms: Some(200),
        })
        .await;

    // (C) Watch completion/failure events as they happen.
    let mut events = foreman.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TaskEvent::Completed { task_id, result } => {
                    println!("  event: {task_id} completed in {}ms", result.duration_ms);
                }
                TaskEvent::Failed { task_id, error } => {
                    println!("  event: {task_id} failed: {}", error.message);
                }
            }
        }
    });

    // (D) Enqueue a mixed bag: the flaky one retries with backoff, the
    // critical one jumps the queue.
    foreman.start().await;
    for (job, priority) in [
        ("flaky", Priority::Medium),
        ("report", Priority::Low),
        ("hotfix", Priority::Critical),
    ] {
        let id = foreman
            .enqueue(
                TaskRequest::new(job, agent_id)
                    .with_priority(priority)
                    .with_parameters(serde_json::json!({ "job": job })),
            )
            .await
            .expect("enqueue");
        println!("enqueued '{job}' as {id} ({priority})");
    }

    // (E) Poll until every task settles, then print the final records.
    loop {
        let status = foreman.queue_status().await;
        if status.queue_size == 0 && status.running == 0 {
            break;
        }
        sleep(Duration::from_millis(250)).await;
    }

    for task in store.all().await {
        println!(
            "final: '{}' status={:?} retries={} error={:?}",
            task.name,
            task.status,
            task.retry_count,
            task.error.map(|e| e.message)
        );
    }

    foreman.shutdown().await;
    watcher.abort();
}
