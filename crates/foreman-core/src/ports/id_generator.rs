//! IdGenerator port - id creation behind a trait so tests can be
//! deterministic.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use ulid::Ulid;

use crate::domain::TaskId;

pub trait IdGenerator: Send + Sync {
    fn task_id(&self) -> TaskId;
}

/// Production generator: ULIDs stamped with the current wall-clock time,
/// so ids sort by creation order across restarts.
pub struct UlidGenerator;

impl IdGenerator for UlidGenerator {
    fn task_id(&self) -> TaskId {
        let timestamp_ms = Utc::now().timestamp_millis() as u64;
        TaskId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

/// Test generator: ids 1, 2, 3, ... in allocation order.
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn task_id(&self) -> TaskId {
        TaskId::from_u128(self.next.fetch_add(1, Ordering::Relaxed) as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_are_unique() {
        let ids = UlidGenerator;
        assert_ne!(ids.task_id(), ids.task_id());
    }

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIdGenerator::new();
        let a = ids.task_id();
        let b = ids.task_id();
        assert!(a < b);
        assert_eq!(a, TaskId::from_u128(1));
        assert_eq!(b, TaskId::from_u128(2));
    }
}
