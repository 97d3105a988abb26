//! The plant: lifecycle control, registration, result collection and the
//! per-assignment work threads.
//!
//! # Locking
//!
//! One `parking_lot::Mutex` guards the whole plant state. Every registry
//! access, matching pass and status transition happens under it; the only
//! code running without it is the injected [`WorkExecutor`]. Waiters block on
//! condition variables paired with that mutex:
//!
//! - `collect_task` on the task's `finished` condvar,
//! - `destroy` on `plant_idle`, then on each task's `drained` condvar,
//! - the alarm thread on `alarm`, with a timeout.
//!
//! Every broadcast is issued while the lock is held, and every waiter
//! re-checks its condition after waking.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PlantConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditEvent, AuditSink};
use crate::core::engine::Assignment;
use crate::core::error::PlantError;
use crate::core::executor::WorkExecutor;
use crate::core::registry::{Registry, TaskStatus, WorkerStatus};
use crate::util::clock::{Clock, SystemClock};
use crate::util::serde::{TaskId, TaskSpec, Timestamp, WorkerSpec};

/// Occupancy of one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationStats {
    /// Maximum simultaneous workers.
    pub capacity: usize,
    /// Workers currently reserved at the station.
    pub occupancy: usize,
}

/// Point-in-time snapshot of a plant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlantStats {
    /// Between `init` and the end of `destroy`.
    pub initialized: bool,
    /// `destroy` is draining.
    pub shutting_down: bool,
    /// Station table in index order.
    pub stations: Vec<StationStats>,
    /// Workers ever registered in this generation.
    pub registered_workers: usize,
    /// Registered workers whose window has not ended (as of the last tick).
    pub active_workers: usize,
    /// Workers currently executing work.
    pub busy_workers: usize,
    /// Workers announced by the hint but not registered yet.
    pub workers_to_come: usize,
    /// Tasks ever registered in this generation.
    pub registered_tasks: usize,
    /// Tasks waiting for resources.
    pub pending_tasks: usize,
    /// Tasks being worked on.
    pub in_progress_tasks: usize,
    /// Tasks completed with all results.
    pub finished_tasks: usize,
    /// Tasks retired as unsatisfiable.
    pub skipped_tasks: usize,
    /// Deadline the alarm thread is sleeping towards.
    pub armed_deadline: Option<Timestamp>,
}

/// Thread settings captured from the config at `init`.
#[derive(Debug, Clone)]
pub(crate) struct ThreadSettings {
    pub(crate) stack_size: usize,
    pub(crate) name_prefix: String,
}

impl From<&PlantConfig> for ThreadSettings {
    fn from(config: &PlantConfig) -> Self {
        Self {
            stack_size: config.thread_stack_size,
            name_prefix: config.thread_name_prefix.clone(),
        }
    }
}

/// Everything guarded by the plant lock.
pub(crate) struct PlantState<R> {
    /// `Some` exactly while the plant is initialized.
    pub(crate) registry: Option<Registry<R>>,
    shutting_down: bool,
    pub(crate) armed: Option<Timestamp>,
    /// Incremented by every `init`; an alarm thread only serves its own epoch.
    pub(crate) epoch: u64,
    pub(crate) threads: ThreadSettings,
    alarm_thread: Option<JoinHandle<()>>,
}

impl<R> PlantState<R> {
    fn new() -> Self {
        Self {
            registry: None,
            shutting_down: false,
            armed: None,
            epoch: 0,
            threads: ThreadSettings::from(&PlantConfig::new()),
            alarm_thread: None,
        }
    }

    fn ensure_accepting(&self) -> Result<(), PlantError> {
        if self.registry.is_none() {
            Err(PlantError::NotInitialized)
        } else if self.shutting_down {
            Err(PlantError::ShuttingDown)
        } else {
            Ok(())
        }
    }

    fn registry(&self) -> Result<&Registry<R>, PlantError> {
        self.registry.as_ref().ok_or(PlantError::NotInitialized)
    }

    fn registry_mut(&mut self) -> Result<&mut Registry<R>, PlantError> {
        self.registry.as_mut().ok_or(PlantError::NotInitialized)
    }

    /// The plant is still running the generation `epoch` was issued for.
    pub(crate) const fn is_current(&self, epoch: u64) -> bool {
        self.registry.is_some() && self.epoch == epoch
    }
}

/// State shared by plant handles, the alarm thread and work threads.
pub(crate) struct Shared<R, E> {
    pub(crate) state: Mutex<PlantState<R>>,
    /// Signalled when nothing is pending or running.
    pub(crate) plant_idle: Condvar,
    /// Wakes the alarm thread early.
    pub(crate) alarm: Condvar,
    pub(crate) clock: Arc<dyn Clock>,
    executor: E,
    audit: Mutex<Option<Box<dyn AuditSink>>>,
}

/// Handle to a plant scheduler.
///
/// Handles are cheap to clone and all refer to the same plant. A plant is
/// created uninitialized; [`Plant::init`] brings up the station table and the
/// alarm thread, [`Plant::destroy`] drains and releases them, after which the
/// plant may be initialized again.
///
/// `destroy` must be called to stop the alarm thread; dropping every handle of
/// an initialized plant leaves it running.
///
/// # Example
///
/// ```rust,ignore
/// use plant_scheduler::config::PlantConfig;
/// use plant_scheduler::core::{FnExecutor, Plant};
/// use plant_scheduler::util::{now_ms, TaskSpec, WorkerSpec};
///
/// let plant = Plant::new(FnExecutor(|w: &WorkerSpec, _: &TaskSpec, slot: usize| (w.id, slot)));
/// plant.init(&PlantConfig::new().with_stations([2]).with_worker_count_hint(2))?;
///
/// let now = now_ms();
/// plant.add_worker(WorkerSpec::new(1, now, now + 60_000))?;
/// plant.add_worker(WorkerSpec::new(2, now, now + 60_000))?;
/// plant.add_task(TaskSpec::new(7, 2, now))?;
///
/// let results = plant.collect_task(7)?;
/// assert_eq!(results.len(), 2);
/// plant.destroy()?;
/// ```
pub struct Plant<R, E> {
    shared: Arc<Shared<R, E>>,
}

impl<R, E> Clone for Plant<R, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R, E> Plant<R, E>
where
    R: Clone + Send + 'static,
    E: WorkExecutor<R>,
{
    /// Create an uninitialized plant on the system clock.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self::with_clock(executor, Arc::new(SystemClock))
    }

    /// Create an uninitialized plant on a custom clock.
    #[must_use]
    pub fn with_clock(executor: E, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PlantState::new()),
                plant_idle: Condvar::new(),
                alarm: Condvar::new(),
                clock,
                executor,
                audit: Mutex::new(None),
            }),
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(self, audit: Box<dyn AuditSink>) -> Self {
        *self.shared.audit.lock() = Some(audit);
        self
    }

    /// Bring up the station table and start the alarm thread.
    ///
    /// # Errors
    ///
    /// - `PlantError::InvalidConfig` if the configuration does not validate
    /// - `PlantError::AlreadyInitialized` if the plant is running
    /// - `PlantError::Allocation` if the tables cannot be allocated
    /// - `PlantError::Spawn` if the alarm thread cannot be started
    pub fn init(&self, config: &PlantConfig) -> Result<(), PlantError> {
        config.validate().map_err(PlantError::InvalidConfig)?;

        let mut state = self.shared.state.lock();
        if state.registry.is_some() {
            warn!("init rejected: plant already initialized");
            return Err(PlantError::AlreadyInitialized);
        }

        let registry = Registry::new(&config.station_capacities, config.worker_count_hint)?;
        state.epoch += 1;
        state.armed = None;
        state.shutting_down = false;
        state.threads = ThreadSettings::from(config);

        let alarm = self
            .shared
            .spawn_alarm(state.epoch, &state.threads)
            .map_err(PlantError::Spawn)?;
        state.registry = Some(registry);
        state.alarm_thread = Some(alarm);

        info!(
            stations = config.station_capacities.len(),
            max_station_capacity = config.max_station_capacity(),
            worker_count_hint = config.worker_count_hint,
            epoch = state.epoch,
            "plant initialized"
        );
        Ok(())
    }

    /// Shorthand for [`Plant::init`] with default thread settings.
    ///
    /// # Errors
    ///
    /// Same as [`Plant::init`].
    pub fn init_stations(
        &self,
        station_capacities: &[usize],
        worker_count_hint: usize,
    ) -> Result<(), PlantError> {
        self.init(
            &PlantConfig::new()
                .with_stations(station_capacities)
                .with_worker_count_hint(worker_count_hint),
        )
    }

    /// Register a worker and run a scheduling pass.
    ///
    /// Registering an identifier twice is a successful no-op.
    ///
    /// # Errors
    ///
    /// - `PlantError::NotInitialized` / `PlantError::ShuttingDown` outside the
    ///   `init..destroy` window
    /// - `PlantError::Allocation` if the worker table cannot grow
    pub fn add_worker(&self, worker: WorkerSpec) -> Result<(), PlantError> {
        let mut state = self.shared.state.lock();
        state
            .ensure_accepting()
            .inspect_err(|e| warn!(worker_id = worker.id, error = %e, "add_worker rejected"))?;

        let worker_id = worker.id;
        let (start, end) = (worker.start, worker.end);
        if state.registry_mut()?.insert_worker(worker)?.is_none() {
            debug!(worker_id, "duplicate worker ignored");
            return Ok(());
        }

        debug!(worker_id, start, end, "worker registered");
        self.shared.audit(|now| {
            build_audit_event(AuditAction::WorkerRegistered, now).with_workers([worker_id])
        });
        self.shared.schedule(&mut state);
        Ok(())
    }

    /// Register a task and run a scheduling pass.
    ///
    /// Registering an identifier twice is a successful no-op.
    ///
    /// # Errors
    ///
    /// - `PlantError::NotInitialized` / `PlantError::ShuttingDown` outside the
    ///   `init..destroy` window
    /// - `PlantError::InvalidTask` for a task needing zero workers
    /// - `PlantError::Allocation` if the task table cannot grow
    pub fn add_task(&self, task: TaskSpec) -> Result<(), PlantError> {
        let mut state = self.shared.state.lock();
        state
            .ensure_accepting()
            .inspect_err(|e| warn!(task_id = task.id, error = %e, "add_task rejected"))?;

        if task.capacity == 0 {
            return Err(PlantError::InvalidTask(format!(
                "task {} requires zero workers",
                task.id
            )));
        }

        let task_id = task.id;
        let (capacity, start) = (task.capacity, task.start);
        if state.registry_mut()?.insert_task(task)?.is_none() {
            debug!(task_id, "duplicate task ignored");
            return Ok(());
        }

        debug!(task_id, capacity, start, "task registered");
        self.shared
            .audit(|now| build_audit_event(AuditAction::TaskRegistered, now).with_task(task_id));
        self.shared.schedule(&mut state);
        Ok(())
    }

    /// Block until the task is resolved and return its result slots in slot
    /// order.
    ///
    /// # Errors
    ///
    /// - `PlantError::TaskSkipped` if the task was retired as unsatisfiable
    /// - `PlantError::UnknownTask` if the task was never registered
    /// - `PlantError::NotInitialized` / `PlantError::ShuttingDown` outside the
    ///   `init..destroy` window
    pub fn collect_task(&self, id: TaskId) -> Result<Vec<R>, PlantError> {
        let mut state = self.shared.state.lock();
        state.ensure_accepting()?;

        let registry = state.registry()?;
        let index = registry.find_task(id).ok_or(PlantError::UnknownTask(id))?;
        let entry = &registry.tasks[index];
        let finished = Arc::clone(&entry.finished);
        let drained = Arc::clone(&entry.drained);

        loop {
            let entry = &mut state.registry_mut()?.tasks[index];
            if entry.status.is_terminal() {
                break;
            }
            entry.waiting += 1;
            finished.wait(&mut state);
            state.registry_mut()?.tasks[index].waiting -= 1;
        }

        let entry = &state.registry()?.tasks[index];
        if entry.waiting == 0 {
            drained.notify_all();
        }

        if entry.status == TaskStatus::Skipped {
            debug!(task_id = id, "collected skipped task");
            return Err(PlantError::TaskSkipped(id));
        }
        entry
            .results
            .iter()
            .cloned()
            .collect::<Option<Vec<R>>>()
            .ok_or_else(|| PlantError::Internal(format!("task {id} finished with empty slots")))
    }

    /// Async variant of [`Plant::collect_task`].
    ///
    /// The blocking wait runs on tokio's blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Plant::collect_task`], plus `PlantError::Internal` if the
    /// blocking task fails.
    pub async fn collect_task_async(&self, id: TaskId) -> Result<Vec<R>, PlantError> {
        let plant = self.clone();
        tokio::task::spawn_blocking(move || plant.collect_task(id))
            .await
            .map_err(|e| PlantError::Internal(format!("collector task failed: {e}")))?
    }

    /// Drain and release the plant.
    ///
    /// Waits until no task is pending or running and no caller is still inside
    /// `collect_task`, then drops the registry and joins the alarm thread.
    /// Once shutdown starts no more workers can arrive, so tasks still waiting
    /// for announced workers are re-evaluated and may be skipped.
    ///
    /// # Errors
    ///
    /// - `PlantError::NotInitialized` if the plant is not running
    /// - `PlantError::ShuttingDown` if another `destroy` is in progress
    pub fn destroy(&self) -> Result<(), PlantError> {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        if state.registry.is_none() {
            return Err(PlantError::NotInitialized);
        }
        if state.shutting_down {
            return Err(PlantError::ShuttingDown);
        }

        state.shutting_down = true;
        info!("plant shutting down, draining tasks");
        state.registry_mut()?.workers_to_come = 0;
        shared.schedule(&mut state);

        while !state.registry()?.is_idle() {
            shared.plant_idle.wait(&mut state);
        }

        let drains: Vec<Arc<Condvar>> = state
            .registry()?
            .tasks
            .iter()
            .map(|task| Arc::clone(&task.drained))
            .collect();
        for (index, drained) in drains.iter().enumerate() {
            while state.registry()?.tasks[index].waiting > 0 {
                drained.wait(&mut state);
            }
        }

        let registry = state.registry.take();
        state.shutting_down = false;
        state.armed = None;
        let alarm = state.alarm_thread.take();
        shared.alarm.notify_all();
        drop(state);
        drop(registry);

        if let Some(handle) = alarm {
            if handle.join().is_err() {
                warn!("alarm thread panicked");
            }
        }
        info!("plant destroyed");
        Ok(())
    }

    /// Force a scheduling pass now.
    ///
    /// The alarm thread already ticks at every worker and task boundary of the
    /// plant clock; this is for clocks moved by hand, such as `ManualClock`.
    /// While such a clock stands still the alarm stays parked until a tick.
    ///
    /// # Errors
    ///
    /// Returns `PlantError::NotInitialized` if the plant is not running.
    pub fn tick(&self) -> Result<(), PlantError> {
        let mut state = self.shared.state.lock();
        state.registry()?;
        self.shared.schedule(&mut state);
        Ok(())
    }

    /// Current status of a registered task.
    ///
    /// # Errors
    ///
    /// `PlantError::NotInitialized` or `PlantError::UnknownTask`.
    pub fn task_status(&self, id: TaskId) -> Result<TaskStatus, PlantError> {
        let state = self.shared.state.lock();
        let registry = state.registry()?;
        let index = registry.find_task(id).ok_or(PlantError::UnknownTask(id))?;
        Ok(registry.tasks[index].status)
    }

    /// Whether the plant is between `init` and the end of `destroy`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.state.lock().registry.is_some()
    }

    /// Snapshot of counters and station occupancy.
    #[must_use]
    pub fn stats(&self) -> PlantStats {
        let state = self.shared.state.lock();
        let Some(registry) = state.registry.as_ref() else {
            return PlantStats::default();
        };

        let count = |status: TaskStatus| {
            registry
                .tasks
                .iter()
                .filter(|task| task.status == status)
                .count()
        };

        PlantStats {
            initialized: true,
            shutting_down: state.shutting_down,
            stations: registry
                .stations
                .iter()
                .map(|station| StationStats {
                    capacity: station.capacity,
                    occupancy: station.occupancy,
                })
                .collect(),
            registered_workers: registry.workers.len(),
            active_workers: registry.active.len(),
            busy_workers: registry
                .workers
                .iter()
                .filter(|worker| worker.status == WorkerStatus::Working)
                .count(),
            workers_to_come: registry.workers_to_come,
            registered_tasks: registry.tasks.len(),
            pending_tasks: registry.pending,
            in_progress_tasks: registry.in_progress,
            finished_tasks: count(TaskStatus::Finished),
            skipped_tasks: count(TaskStatus::Skipped),
            armed_deadline: state.armed,
        }
    }
}

impl<R, E> Shared<R, E>
where
    R: Clone + Send + 'static,
    E: WorkExecutor<R>,
{
    /// Record an audit event if a sink is attached.
    fn audit(&self, build: impl FnOnce(Timestamp) -> AuditEvent) {
        if let Some(sink) = self.audit.lock().as_mut() {
            sink.record(build(self.clock.now()));
        }
    }

    /// Run one matching pass and act on its outcome. Requires the plant lock.
    pub(crate) fn schedule(self: &Arc<Self>, state: &mut PlantState<R>) {
        let now = self.clock.now();
        let PlantState {
            registry,
            armed,
            threads,
            ..
        } = state;
        let Some(registry) = registry.as_mut() else {
            return;
        };

        let outcome = registry.tick(now, armed);

        for &worker_id in &outcome.expired {
            debug!(worker_id, now, "worker window ended");
            self.audit(|at| build_audit_event(AuditAction::WorkerExpired, at).with_workers([worker_id]));
        }

        for &index in &outcome.retired {
            let task = &registry.tasks[index];
            warn!(
                task_id = task.spec.id,
                capacity = task.spec.capacity,
                "task can never be satisfied, skipping"
            );
            task.finished.notify_all();
            self.audit(|at| build_audit_event(AuditAction::TaskSkipped, at).with_task(task.spec.id));
        }

        if outcome.idle {
            debug!("plant idle");
            self.plant_idle.notify_all();
        }

        for group in outcome.assignments.chunk_by(|a, b| a.task == b.task) {
            let task_id = registry.task_id(group[0].task);
            let station = group[0].station;
            debug!(task_id, station, workers = group.len(), now, "task assigned");
            self.audit(|at| {
                build_audit_event(AuditAction::TaskAssigned, at)
                    .with_task(task_id)
                    .with_station(station)
                    .with_workers(group.iter().map(|a| registry.workers[a.worker].spec.id))
            });
            for assignment in group {
                self.launch(*assignment, registry, threads);
            }
        }

        if outcome.rearmed {
            debug!(deadline = ?*armed, "alarm re-armed");
            self.alarm.notify_all();
        }
    }

    /// Start the work thread for one assignment.
    fn launch(self: &Arc<Self>, assignment: Assignment, registry: &Registry<R>, threads: &ThreadSettings) {
        let worker = registry.workers[assignment.worker].spec.clone();
        let task = registry.tasks[assignment.task].spec.clone();
        let shared = Arc::clone(self);

        let spawned = thread::Builder::new()
            .name(format!("{}-worker-{}", threads.name_prefix, worker.id))
            .stack_size(threads.stack_size)
            .spawn(move || shared.run_assignment(assignment, &worker, &task));

        if let Err(e) = spawned {
            fatal(&format!("failed to spawn work thread: {e}"));
        }
    }

    /// Body of a work thread: execute unlocked, then report back and reschedule.
    fn run_assignment(self: &Arc<Self>, assignment: Assignment, worker: &WorkerSpec, task: &TaskSpec) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => fatal(&format!("failed to build work runtime: {e}")),
        };

        debug!(
            worker_id = worker.id,
            task_id = task.id,
            slot = assignment.slot,
            "worker executing task"
        );
        let work = panic::catch_unwind(AssertUnwindSafe(|| {
            runtime.block_on(self.executor.execute(worker, task, assignment.slot))
        }));
        let Ok(result) = work else {
            fatal(&format!(
                "work executor panicked (worker {}, task {}, slot {})",
                worker.id, task.id, assignment.slot
            ));
        };
        drop(runtime);

        let mut state = self.state.lock();
        let Some(registry) = state.registry.as_mut() else {
            fatal("plant released while work was in flight");
        };

        let release = registry.release(&assignment, result);
        if release.task_finished {
            registry.tasks[assignment.task].finished.notify_all();
            debug!(task_id = task.id, station = assignment.station, "task finished");
            self.audit(|at| {
                build_audit_event(AuditAction::TaskFinished, at)
                    .with_task(task.id)
                    .with_station(assignment.station)
            });
        }
        if release.idle {
            self.plant_idle.notify_all();
        }

        self.schedule(&mut state);
    }
}

/// The plant can no longer guarantee consistency; stop the process.
fn fatal(reason: &str) -> ! {
    error!(reason, "fatal plant error, aborting");
    std::process::abort()
}
