//! Serializable identifiers and entity records shared across the crate.

use serde::{Deserialize, Serialize};

/// Absolute time in milliseconds, as reported by the plant clock.
pub type Timestamp = u64;

/// Externally assigned worker identifier.
pub type WorkerId = u64;

/// Externally assigned task identifier.
pub type TaskId = u64;

/// A worker available during the half-open window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerSpec {
    /// Unique worker identifier.
    pub id: WorkerId,
    /// First instant at which the worker may be assigned.
    pub start: Timestamp,
    /// Instant from which the worker is permanently unavailable.
    pub end: Timestamp,
}

impl WorkerSpec {
    /// Create a worker record.
    #[must_use]
    pub const fn new(id: WorkerId, start: Timestamp, end: Timestamp) -> Self {
        Self { id, start, end }
    }

    /// Whether the window has started and not yet ended at `now`.
    #[must_use]
    pub const fn is_present_at(&self, now: Timestamp) -> bool {
        self.start <= now && now < self.end
    }
}

/// A task needing `capacity` workers at one station, runnable from `start`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task identifier.
    pub id: TaskId,
    /// Number of workers that must work on the task at the same time.
    pub capacity: usize,
    /// Earliest instant at which the task may start.
    pub start: Timestamp,
}

impl TaskSpec {
    /// Create a task record.
    #[must_use]
    pub const fn new(id: TaskId, capacity: usize, start: Timestamp) -> Self {
        Self {
            id,
            capacity,
            start,
        }
    }
}
