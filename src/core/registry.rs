//! Entity registry: stations, workers and tasks of one plant generation.
//!
//! Workers and tasks live in append-only arenas. An entity keeps its index for
//! the whole lifetime of the registry, so assignments, result slots and
//! per-task condition variables handed out by index stay valid while the
//! tables grow. Expiry and retirement are status changes, never removals.

use std::collections::{HashMap, TryReserveError};
use std::sync::Arc;

use parking_lot::Condvar;
use serde::{Deserialize, Serialize};

use crate::util::serde::{TaskId, TaskSpec, WorkerId, WorkerSpec};

/// Lifecycle status of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a station and enough idle workers.
    Pending,
    /// Workers are executing it at a reserved station.
    InProgress,
    /// Every result slot has been filled.
    Finished,
    /// Retired because it can never be satisfied.
    Skipped,
}

impl TaskStatus {
    /// Whether collectors waiting on the task can return.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Skipped)
    }
}

/// Worker availability for assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerStatus {
    Idle,
    Working,
}

#[derive(Debug, Clone)]
pub(crate) struct Station {
    pub(crate) capacity: usize,
    pub(crate) occupancy: usize,
}

#[derive(Debug)]
pub(crate) struct WorkerEntry {
    pub(crate) spec: WorkerSpec,
    pub(crate) status: WorkerStatus,
}

impl WorkerEntry {
    /// Idle and inside its window at `now`.
    pub(crate) const fn is_available(&self, now: u64) -> bool {
        matches!(self.status, WorkerStatus::Idle) && self.spec.is_present_at(now)
    }
}

pub(crate) struct TaskEntry<R> {
    pub(crate) spec: TaskSpec,
    pub(crate) status: TaskStatus,
    pub(crate) results: Vec<Option<R>>,
    /// Callers currently blocked in `collect_task`.
    pub(crate) waiting: usize,
    /// Broadcast when the task becomes terminal.
    pub(crate) finished: Arc<Condvar>,
    /// Signalled when `waiting` drops back to zero.
    pub(crate) drained: Arc<Condvar>,
}

pub(crate) struct Registry<R> {
    pub(crate) stations: Vec<Station>,
    pub(crate) max_station_capacity: usize,
    pub(crate) workers: Vec<WorkerEntry>,
    worker_index: HashMap<WorkerId, usize>,
    /// Indices of workers whose window has not ended, ascending.
    pub(crate) active: Vec<usize>,
    /// Workers announced by the init hint but not registered yet.
    pub(crate) workers_to_come: usize,
    pub(crate) tasks: Vec<TaskEntry<R>>,
    task_index: HashMap<TaskId, usize>,
    pub(crate) pending: usize,
    pub(crate) in_progress: usize,
}

impl<R> Registry<R> {
    /// Build the fixed station table and size the worker table from the hint.
    pub(crate) fn new(
        station_capacities: &[usize],
        worker_count_hint: usize,
    ) -> Result<Self, TryReserveError> {
        let mut stations = Vec::new();
        stations.try_reserve_exact(station_capacities.len())?;
        stations.extend(station_capacities.iter().map(|&capacity| Station {
            capacity,
            occupancy: 0,
        }));

        let mut workers = Vec::new();
        workers.try_reserve(worker_count_hint)?;
        let mut active = Vec::new();
        active.try_reserve(worker_count_hint)?;

        Ok(Self {
            max_station_capacity: station_capacities.iter().copied().max().unwrap_or(0),
            stations,
            workers,
            worker_index: HashMap::new(),
            active,
            workers_to_come: worker_count_hint,
            tasks: Vec::new(),
            task_index: HashMap::new(),
            pending: 0,
            in_progress: 0,
        })
    }

    pub(crate) fn find_worker(&self, id: WorkerId) -> Option<usize> {
        self.worker_index.get(&id).copied()
    }

    pub(crate) fn find_task(&self, id: TaskId) -> Option<usize> {
        self.task_index.get(&id).copied()
    }

    /// Register a worker as Idle and active.
    ///
    /// Returns `Ok(None)` when the identifier is already known. Nothing is
    /// modified when growing a table fails.
    pub(crate) fn insert_worker(
        &mut self,
        spec: WorkerSpec,
    ) -> Result<Option<usize>, TryReserveError> {
        if self.find_worker(spec.id).is_some() {
            return Ok(None);
        }
        self.workers.try_reserve(1)?;
        self.active.try_reserve(1)?;
        self.worker_index.try_reserve(1)?;

        let index = self.workers.len();
        self.worker_index.insert(spec.id, index);
        self.workers.push(WorkerEntry {
            spec,
            status: WorkerStatus::Idle,
        });
        // New indices are the largest, so `active` stays sorted.
        self.active.push(index);
        self.workers_to_come = self.workers_to_come.saturating_sub(1);
        Ok(Some(index))
    }

    /// Register a task as Pending.
    ///
    /// Returns `Ok(None)` when the identifier is already known.
    pub(crate) fn insert_task(&mut self, spec: TaskSpec) -> Result<Option<usize>, TryReserveError> {
        if self.find_task(spec.id).is_some() {
            return Ok(None);
        }
        let mut results = Vec::new();
        results.try_reserve_exact(spec.capacity)?;
        results.resize_with(spec.capacity, || None);
        self.tasks.try_reserve(1)?;
        self.task_index.try_reserve(1)?;

        let index = self.tasks.len();
        self.task_index.insert(spec.id, index);
        self.tasks.push(TaskEntry {
            spec,
            status: TaskStatus::Pending,
            results,
            waiting: 0,
            finished: Arc::new(Condvar::new()),
            drained: Arc::new(Condvar::new()),
        });
        self.pending += 1;
        Ok(Some(index))
    }

    /// No task is pending or running.
    pub(crate) const fn is_idle(&self) -> bool {
        self.pending == 0 && self.in_progress == 0
    }
}
