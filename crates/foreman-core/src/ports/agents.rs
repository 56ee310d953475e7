//! AgentDirectory port - resolves agent ids to platform references.

use async_trait::async_trait;

use crate::domain::AgentId;
use crate::error::ForemanError;

/// What the scheduler needs to know about an agent: which platform adapter
/// handles it and whether it is currently allowed to receive work.
#[derive(Debug, Clone)]
pub struct AgentRef {
    pub id: AgentId,
    pub platform: String,
    pub active: bool,
}

/// Registry of the agents tasks can target.
///
/// `enqueue` resolves here up front (unknown agent -> not-found, inactive
/// agent -> precondition error); executions resolve again at dispatch time
/// because the registry may have changed while the task sat in the queue.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn lookup(&self, id: AgentId) -> Result<Option<AgentRef>, ForemanError>;
}
