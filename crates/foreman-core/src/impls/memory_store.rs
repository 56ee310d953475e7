//! In-memory task store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Task, TaskId};
use crate::error::ForemanError;
use crate::ports::TaskStore;

/// HashMap-backed store. Good enough for development and tests; the live
/// queue never depends on it surviving a restart anyway.
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// All records, unordered. Introspection only.
    pub async fn all(&self) -> Vec<Task> {
        self.tasks.lock().await.values().cloned().collect()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, id: TaskId) -> Result<Option<Task>, ForemanError> {
        Ok(self.tasks.lock().await.get(&id).cloned())
    }

    async fn save(&self, task: &Task) -> Result<(), ForemanError> {
        self.tasks.lock().await.insert(task.id, task.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentId, TaskRequest, TaskStatus};
    use chrono::Utc;
    use ulid::Ulid;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = InMemoryTaskStore::new();
        let request = TaskRequest::new("t", AgentId::from_ulid(Ulid::new()));
        let task = Task::from_request(TaskId::from_ulid(Ulid::new()), request, Utc::now());

        assert!(store.get(task.id).await.unwrap().is_none());
        store.save(&task).await.unwrap();

        let loaded = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, task.id);
        assert_eq!(loaded.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn save_overwrites_the_previous_record() {
        let store = InMemoryTaskStore::new();
        let request = TaskRequest::new("t", AgentId::from_ulid(Ulid::new()));
        let mut task = Task::from_request(TaskId::from_ulid(Ulid::new()), request, Utc::now());
        store.save(&task).await.unwrap();

        task.begin_run(Utc::now());
        store.save(&task).await.unwrap();

        let loaded = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Running);
        assert_eq!(store.all().await.len(), 1);
    }
}
