//! Mutable scheduler state: the queue and the running-execution set.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::TaskId;
use crate::queue::PriorityQueue;

/// One in-flight execution.
///
/// Created when dispatch begins; destroyed when the execution settles.
/// The token is the single cancellation mechanism: an explicit cancel and
/// a timeout both fire it.
#[derive(Debug)]
pub(crate) struct RunningExecution {
    pub task_id: TaskId,
    pub started_at: Instant,
    pub cancel: CancellationToken,

    /// Held so the set owns its executions; the dispatch loop never awaits
    /// this handle (executions outlive the loop on shutdown).
    #[allow(dead_code)]
    pub handle: JoinHandle<()>,
}

/// Queue + running set behind one mutex.
///
/// Invariant: a task id appears in at most one of the two collections at
/// any time. Moves between them (dispatch pop -> running insert, failure
/// running remove -> queue insert) happen under a single lock acquisition.
pub(crate) struct EngineState {
    pub queue: PriorityQueue,
    pub running: HashMap<TaskId, RunningExecution>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            running: HashMap::new(),
        }
    }
}
