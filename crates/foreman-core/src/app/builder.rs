//! ForemanBuilder - wiring and fail-fast startup validation.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::ports::{
    AgentDirectory, AgentExecutor, IdGenerator, NoopSink, NotificationSink, TaskStore,
    UlidGenerator,
};
use crate::queue::RetryPolicy;

use super::service::Foreman;

/// Wires the engine's ports together.
///
/// The three collaborators without sensible defaults (store, directory,
/// executor) are checked at `build()` so a miswired deployment fails at
/// startup with a clear message instead of at first dispatch.
///
/// ```ignore
/// let foreman = ForemanBuilder::new()
///     .task_store(store)
///     .agent_directory(agents)
///     .executor(executor)
///     .build()?;
/// foreman.start().await;
/// ```
pub struct ForemanBuilder {
    store: Option<Arc<dyn TaskStore>>,
    agents: Option<Arc<dyn AgentDirectory>>,
    executor: Option<Arc<dyn AgentExecutor>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    ids: Option<Arc<dyn IdGenerator>>,
    retry_policy: RetryPolicy,
    config: SchedulerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no task store configured")]
    MissingTaskStore,

    #[error("no agent directory configured")]
    MissingAgentDirectory,

    #[error("no agent executor configured")]
    MissingExecutor,
}

impl ForemanBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            agents: None,
            executor: None,
            notifier: None,
            ids: None,
            retry_policy: RetryPolicy::default(),
            config: SchedulerConfig::default(),
        }
    }

    pub fn task_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn agent_directory(mut self, agents: Arc<dyn AgentDirectory>) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn AgentExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Defaults to a sink that drops everything.
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Defaults to wall-clock ULIDs.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Out-of-range values are clamped, not rejected.
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Foreman, BuildError> {
        let store = self.store.ok_or(BuildError::MissingTaskStore)?;
        let agents = self.agents.ok_or(BuildError::MissingAgentDirectory)?;
        let executor = self.executor.ok_or(BuildError::MissingExecutor)?;
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NoopSink));
        let ids = self.ids.unwrap_or_else(|| Arc::new(UlidGenerator));

        Ok(Foreman::new(
            store,
            agents,
            executor,
            notifier,
            ids,
            self.retry_policy,
            self.config.clamped(),
        ))
    }
}

impl Default for ForemanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryTaskStore, StaticAgentDirectory};
    use crate::ports::AgentExecutor;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct NullExecutor;

    #[async_trait]
    impl AgentExecutor for NullExecutor {
        async fn execute(
            &self,
            _platform: &str,
            _parameters: &serde_json::Value,
            _cancel: CancellationToken,
        ) -> Result<crate::domain::AgentResponse, crate::ForemanError> {
            Ok(crate::domain::AgentResponse::ok(serde_json::json!({})))
        }
    }

    #[test]
    fn build_succeeds_with_required_ports() {
        let result = ForemanBuilder::new()
            .task_store(Arc::new(InMemoryTaskStore::new()))
            .agent_directory(Arc::new(StaticAgentDirectory::new()))
            .executor(Arc::new(NullExecutor))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn build_fails_without_a_store() {
        let result = ForemanBuilder::new()
            .agent_directory(Arc::new(StaticAgentDirectory::new()))
            .executor(Arc::new(NullExecutor))
            .build();
        assert!(matches!(result, Err(BuildError::MissingTaskStore)));
    }

    #[test]
    fn build_fails_without_an_executor() {
        let result = ForemanBuilder::new()
            .task_store(Arc::new(InMemoryTaskStore::new()))
            .agent_directory(Arc::new(StaticAgentDirectory::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingExecutor)));
    }
}
