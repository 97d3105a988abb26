//! The work capability injected into a plant.

use async_trait::async_trait;

use crate::util::serde::{TaskSpec, WorkerSpec};

/// Executes one worker's share of a task and produces the value stored in
/// the task's result slot.
///
/// Each call runs on a dedicated OS thread with its own single-threaded tokio
/// runtime, without the plant lock held, so long computations never stall
/// scheduling. Result types do not need to be serializable.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use plant_scheduler::core::WorkExecutor;
/// use plant_scheduler::util::{TaskSpec, WorkerSpec};
///
/// struct Assembly;
///
/// #[async_trait]
/// impl WorkExecutor<String> for Assembly {
///     async fn execute(&self, worker: &WorkerSpec, task: &TaskSpec, slot: usize) -> String {
///         format!("worker {} built part {slot} of task {}", worker.id, task.id)
///     }
/// }
/// ```
#[async_trait]
pub trait WorkExecutor<R>: Send + Sync + 'static
where
    R: Send + 'static,
{
    /// Perform the work of `worker` on `task`, filling result slot `slot`.
    ///
    /// `slot` is distinct for every worker assigned to the same task and lies
    /// in `0..task.capacity`.
    async fn execute(&self, worker: &WorkerSpec, task: &TaskSpec, slot: usize) -> R;
}

/// Adapter turning a plain closure into a [`WorkExecutor`].
///
/// ```rust,ignore
/// let executor = FnExecutor(|w: &WorkerSpec, _t: &TaskSpec, slot: usize| w.id * 10 + slot as u64);
/// ```
pub struct FnExecutor<F>(pub F);

#[async_trait]
impl<F, R> WorkExecutor<R> for FnExecutor<F>
where
    F: Fn(&WorkerSpec, &TaskSpec, usize) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    async fn execute(&self, worker: &WorkerSpec, task: &TaskSpec, slot: usize) -> R {
        (self.0)(worker, task, slot)
    }
}
