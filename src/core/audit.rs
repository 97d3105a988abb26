//! Audit sink implementations.
//!
//! Records what the plant did and when, in plant-clock time: registrations,
//! assignments, completions, retirements and worker expiry.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::serde::{TaskId, Timestamp, WorkerId};

/// Kind of plant event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A new worker joined the registry.
    WorkerRegistered,
    /// A worker's window ended.
    WorkerExpired,
    /// A new task joined the registry.
    TaskRegistered,
    /// A task received a station and its workers.
    TaskAssigned,
    /// All workers of a task returned their results.
    TaskFinished,
    /// A task was retired as unsatisfiable.
    TaskSkipped,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Action taken.
    pub action: AuditAction,
    /// Related task, if any.
    pub task_id: Option<TaskId>,
    /// Related workers, in slot order for assignments.
    pub worker_ids: Vec<WorkerId>,
    /// Station index for assignments and completions.
    pub station: Option<usize>,
    /// Plant-clock time of the event.
    pub at: Timestamp,
}

impl AuditEvent {
    /// Attach a task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Attach workers.
    #[must_use]
    pub fn with_workers(mut self, worker_ids: impl IntoIterator<Item = WorkerId>) -> Self {
        self.worker_ids.extend(worker_ids);
        self
    }

    /// Attach a station index.
    #[must_use]
    pub const fn with_station(mut self, station: usize) -> Self {
        self.station = Some(station);
        self
    }
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to the plant.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Snapshot of stored events with the given action.
    #[must_use]
    pub fn events_of(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh identifier.
#[must_use]
pub fn build_audit_event(action: AuditAction, at: Timestamp) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        action,
        task_id: None,
        worker_ids: Vec::new(),
        station: None,
        at,
    }
}
