//! foreman-core
//!
//! In-process scheduling and dispatch of tasks that trigger automation
//! agents on external platforms. One dispatch loop fills execution capacity
//! from a priority queue on a fixed tick; each execution runs independently
//! with a deadline and cooperative cancellation; failures go through a
//! retry state machine with exponential backoff.
//!
//! # Module layout
//! - **domain**: ids, priority, status, the durable task record, submission
//!   specs, outcomes and domain events
//! - **ports**: boundary traits (TaskStore, AgentDirectory, AgentExecutor,
//!   NotificationSink, IdGenerator)
//! - **queue**: the in-memory priority queue and the retry policy
//! - **app**: the engine — builder, dispatch loop, execution controller,
//!   failure handler, service facade, status views
//! - **impls**: in-memory implementations for development and tests

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{BuildError, Foreman, ForemanBuilder, QueueStatusView, QueuedTaskView};
pub use config::{ConfigUpdate, SchedulerConfig};
pub use error::ForemanError;
