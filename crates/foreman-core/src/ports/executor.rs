//! AgentExecutor port - performs the actual remote invocation.

use async_trait::async_trait;

/// Re-exported so executor implementations outside this crate don't need
/// their own tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

use crate::domain::AgentResponse;
use crate::error::ForemanError;

/// The platform adapter boundary.
///
/// Cancellation is cooperative: the same token fires for an explicit
/// cancel and for a timeout, and implementations must observe it to stop
/// promptly. The controller does not forcibly terminate uncooperative
/// work; it stops waiting on it and finalizes the task on its own.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        platform: &str,
        parameters: &serde_json::Value,
        cancel: CancellationToken,
    ) -> Result<AgentResponse, ForemanError>;
}
