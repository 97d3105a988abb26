//! Matching engine: one greedy scheduling pass ("tick") over the registry.
//!
//! The engine only decides. It mutates registry state under the plant lock and
//! reports what happened in a [`TickOutcome`]; waking waiters, launching work
//! threads and re-arming the alarm are left to the caller, which still holds
//! the lock while it acts on the outcome.

use std::cmp::Reverse;

use crate::util::serde::{TaskId, Timestamp, WorkerId};

use super::registry::{Registry, TaskStatus, WorkerStatus};

/// One worker bound to one slot of a task at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Assignment {
    pub(crate) station: usize,
    pub(crate) task: usize,
    pub(crate) worker: usize,
    pub(crate) slot: usize,
}

/// Everything a tick changed that the caller has to act on.
#[derive(Debug, Default)]
pub(crate) struct TickOutcome {
    /// Workers whose window ended during this tick.
    pub(crate) expired: Vec<WorkerId>,
    /// Task indices retired as unsatisfiable; their waiters must be woken.
    pub(crate) retired: Vec<usize>,
    /// Nothing is pending or running; idle waiters must be woken.
    pub(crate) idle: bool,
    /// New work to launch, grouped by task in assignment order.
    pub(crate) assignments: Vec<Assignment>,
    /// The armed deadline moved earlier; the alarm thread must be woken.
    pub(crate) rearmed: bool,
}

/// Outcome of one finished unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Release {
    /// The last worker of the task finished; its waiters must be woken.
    pub(crate) task_finished: bool,
    /// Nothing is pending or running any more.
    pub(crate) idle: bool,
}

impl<R> Registry<R> {
    /// Run one full expire / retire / assign / re-arm pass at `now`.
    ///
    /// `armed` is the deadline the alarm thread currently sleeps towards.
    pub(crate) fn tick(&mut self, now: Timestamp, armed: &mut Option<Timestamp>) -> TickOutcome {
        let mut outcome = TickOutcome {
            expired: self.expire_workers(now),
            retired: self.retire_unsatisfiable(),
            ..TickOutcome::default()
        };

        if self.is_idle() {
            outcome.idle = true;
            return outcome;
        }

        while let Some((station, task)) = self.select_pair(now) {
            self.start_task(station, task, now, &mut outcome.assignments);
        }

        // A deadline that already passed is stale: nobody will fire for it.
        if armed.is_some_and(|current| current <= now) {
            *armed = None;
        }
        if let Some(next) = self.next_deadline(now) {
            let earlier = match *armed {
                Some(current) => next < current,
                None => true,
            };
            if earlier {
                *armed = Some(next);
                outcome.rearmed = true;
            }
        }

        outcome
    }

    /// Drop workers whose window has ended from the active set.
    fn expire_workers(&mut self, now: Timestamp) -> Vec<WorkerId> {
        let workers = &self.workers;
        let mut expired = Vec::new();
        self.active.retain(|&index| {
            let spec = &workers[index].spec;
            let alive = now < spec.end;
            if !alive {
                expired.push(spec.id);
            }
            alive
        });
        expired
    }

    /// Skip every pending task that no present or announced worker set and no
    /// station can ever satisfy.
    fn retire_unsatisfiable(&mut self) -> Vec<usize> {
        let reachable = self.active.len() + self.workers_to_come;
        let max_station = self.max_station_capacity;
        let mut retired = Vec::new();

        for (index, task) in self.tasks.iter_mut().enumerate() {
            if task.status != TaskStatus::Pending {
                continue;
            }
            let needed = task.spec.capacity;
            if reachable < needed || max_station < needed {
                task.status = TaskStatus::Skipped;
                retired.push(index);
            }
        }

        self.pending -= retired.len();
        retired
    }

    /// Pick the largest free station and the first registered runnable task
    /// that fits both it and the idle workforce.
    fn select_pair(&self, now: Timestamp) -> Option<(usize, usize)> {
        let idle_workers = self
            .active
            .iter()
            .filter(|&&index| self.workers[index].is_available(now))
            .count();

        let (station, capacity) = self
            .stations
            .iter()
            .enumerate()
            .filter(|(_, station)| station.occupancy == 0)
            .min_by_key(|&(index, station)| (Reverse(station.capacity), index))
            .map(|(index, station)| (index, station.capacity))?;

        let task = self.tasks.iter().position(|task| {
            task.status == TaskStatus::Pending
                && task.spec.start <= now
                && task.spec.capacity <= idle_workers
                && task.spec.capacity <= capacity
        })?;

        Some((station, task))
    }

    /// Reserve `station` for `task` and bind the first idle workers to it.
    fn start_task(
        &mut self,
        station: usize,
        task: usize,
        now: Timestamp,
        assignments: &mut Vec<Assignment>,
    ) {
        let needed = self.tasks[task].spec.capacity;

        self.stations[station].occupancy = needed;
        self.tasks[task].status = TaskStatus::InProgress;
        self.pending -= 1;
        self.in_progress += 1;

        let mut slot = 0;
        for &worker in &self.active {
            if slot == needed {
                break;
            }
            let entry = &mut self.workers[worker];
            if entry.is_available(now) {
                entry.status = WorkerStatus::Working;
                assignments.push(Assignment {
                    station,
                    task,
                    worker,
                    slot,
                });
                slot += 1;
            }
        }
    }

    /// Earliest future instant at which eligibility can change.
    fn next_deadline(&self, now: Timestamp) -> Option<Timestamp> {
        let worker_edges = self.active.iter().flat_map(|&index| {
            let spec = &self.workers[index].spec;
            [spec.start, spec.end]
        });
        let task_starts = self
            .tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Pending)
            .map(|task| task.spec.start);

        worker_edges.chain(task_starts).filter(|&at| at > now).min()
    }

    /// Store a worker's result and free its place at the station.
    pub(crate) fn release(&mut self, assignment: &Assignment, result: R) -> Release {
        let task = &mut self.tasks[assignment.task];
        task.results[assignment.slot] = Some(result);
        self.workers[assignment.worker].status = WorkerStatus::Idle;

        let station = &mut self.stations[assignment.station];
        station.occupancy -= 1;
        if station.occupancy > 0 {
            return Release {
                task_finished: false,
                idle: false,
            };
        }

        task.status = TaskStatus::Finished;
        // in_progress must drop before pending is inspected.
        self.in_progress -= 1;
        Release {
            task_finished: true,
            idle: self.pending == 0 && self.in_progress == 0,
        }
    }

    /// Identifier of the task at `index`.
    pub(crate) fn task_id(&self, index: usize) -> TaskId {
        self.tasks[index].spec.id
    }
}
