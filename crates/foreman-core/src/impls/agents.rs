//! Fixed in-memory agent directory.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::AgentId;
use crate::error::ForemanError;
use crate::ports::{AgentDirectory, AgentRef};

/// Directory with a fixed set of agents, built up front.
pub struct StaticAgentDirectory {
    agents: HashMap<AgentId, AgentRef>,
}

impl StaticAgentDirectory {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    pub fn with_agent(mut self, agent: AgentRef) -> Self {
        self.agents.insert(agent.id, agent);
        self
    }
}

impl Default for StaticAgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentDirectory for StaticAgentDirectory {
    async fn lookup(&self, id: AgentId) -> Result<Option<AgentRef>, ForemanError> {
        Ok(self.agents.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[tokio::test]
    async fn lookup_finds_registered_agents_only() {
        let known = AgentId::from_ulid(Ulid::new());
        let directory = StaticAgentDirectory::new().with_agent(AgentRef {
            id: known,
            platform: "github".to_string(),
            active: true,
        });

        let found = directory.lookup(known).await.unwrap().unwrap();
        assert_eq!(found.platform, "github");
        assert!(found.active);

        let unknown = AgentId::from_ulid(Ulid::new());
        assert!(directory.lookup(unknown).await.unwrap().is_none());
    }
}
