//! The engine: dispatch loop, execution controller, failure handler and
//! the public facade that wires them to the ports.
//!
//! # Control flow
//! enqueue -> PriorityQueue -> DispatchLoop (per tick, up to the
//! concurrency cap) -> ExecutionController -> success records COMPLETED;
//! failure enters the FailureHandler -> re-enqueue with backoff or FAILED.

pub mod builder;
pub mod service;
pub mod status;

mod dispatcher;
mod engine;
mod execution;
mod failure;
mod state;

pub use builder::{BuildError, ForemanBuilder};
pub use service::Foreman;
pub use status::{QueueStatusView, QueuedTaskView};
