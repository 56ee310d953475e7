//! Strongly-typed identifiers.
//!
//! ULID-backed so ids sort by creation time and can be generated without
//! coordination. A phantom-typed `Id<T>` provides one implementation for
//! all id kinds while keeping them distinct at compile time: a `TaskId`
//! can never be passed where an `AgentId` is expected.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Marker trait for id kinds. Supplies the `Display` prefix.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Build an id from a raw u128. Handy for deterministic tests.
    pub fn from_u128(value: u128) -> Self {
        Self::from_ulid(Ulid::from_bytes(value.to_be_bytes()))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for task ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskMarker {}

impl IdMarker for TaskMarker {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Marker for agent ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentMarker {}

impl IdMarker for AgentMarker {
    fn prefix() -> &'static str {
        "agent-"
    }
}

/// Marker for workflow ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkflowMarker {}

impl IdMarker for WorkflowMarker {
    fn prefix() -> &'static str {
        "workflow-"
    }
}

/// Identifier of a task (the unit of scheduled work).
pub type TaskId = Id<TaskMarker>;

/// Identifier of an agent (the external entity a task runs against).
pub type AgentId = Id<AgentMarker>;

/// Identifier of a workflow a task may belong to.
pub type WorkflowId = Id<WorkflowMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_the_kind_prefix() {
        let task = TaskId::from_ulid(Ulid::new());
        let agent = AgentId::from_ulid(Ulid::new());
        let workflow = WorkflowId::from_ulid(Ulid::new());

        assert!(task.to_string().starts_with("task-"));
        assert!(agent.to_string().starts_with("agent-"));
        assert!(workflow.to_string().starts_with("workflow-"));

        // The whole point: you can't accidentally mix these types.
        // (Compile-time property, kept as a comment.)
        // let _: TaskId = agent; // <- does not compile
    }

    #[test]
    fn ids_are_sortable_by_creation_time() {
        let a = TaskId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = TaskId::from_ulid(Ulid::new());
        assert!(a < b);
    }

    #[test]
    fn ids_round_trip_through_serde() {
        let id = TaskId::from_ulid(Ulid::new());
        let json = serde_json::to_string(&id).unwrap();
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn from_u128_is_deterministic() {
        assert_eq!(TaskId::from_u128(7), TaskId::from_u128(7));
        assert!(TaskId::from_u128(1) < TaskId::from_u128(2));
    }
}
