//! Domain model (ids, priority, status, records, outcomes, events).

pub mod events;
pub mod ids;
pub mod outcome;
pub mod priority;
pub mod spec;
pub mod status;
pub mod task;

pub use events::TaskEvent;
pub use ids::{AgentId, TaskId, WorkflowId};
pub use outcome::{AgentResponse, FailureDetail, TaskFailure, TaskResult};
pub use priority::Priority;
pub use spec::TaskRequest;
pub use status::TaskStatus;
pub use task::Task;
