//! Dispatch priority.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority of a task in the dispatch queue.
///
/// Ordering: `Critical > High > Medium > Low`. Within one dispatch tick,
/// eligible tasks are dequeued in descending priority; ties are broken by
/// earliest scheduled time.
///
/// Serialized SCREAMING_SNAKE_CASE to match the wire format of the task
/// records (`"CRITICAL"`, `"HIGH"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    /// Numeric rank (LOW=1 .. CRITICAL=4); higher dispatches first.
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}
