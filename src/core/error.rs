//! Error types for plant operations.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::util::serde::TaskId;

/// Errors produced by plant operations.
#[derive(Debug, Error)]
pub enum PlantError {
    /// `init` was called on a plant that is already running.
    #[error("plant already initialized")]
    AlreadyInitialized,
    /// The operation needs an initialized plant.
    #[error("plant not initialized")]
    NotInitialized,
    /// `destroy` is draining the plant; no new calls are accepted.
    #[error("plant is shutting down")]
    ShuttingDown,
    /// The task identifier was never registered.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    /// The task was retired because it can never be satisfied.
    #[error("task {0} skipped: not enough workers or station capacity")]
    TaskSkipped(TaskId),
    /// The task record is malformed.
    #[error("invalid task: {0}")]
    InvalidTask(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Registry growth failed.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// A plant thread could not be started.
    #[error("failed to spawn plant thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// Internal failure (join error, broken invariant reported to a caller).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
