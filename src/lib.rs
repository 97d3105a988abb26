//! # Plant Scheduler
//!
//! A concurrent scheduler for a production plant: a fixed set of stations with
//! worker-capacity limits, workers that are only available during a time
//! window, and tasks that need a fixed number of workers at one station at the
//! same time and may not start before a given instant.
//!
//! ## Core Problem Solved
//!
//! - **Multi-entity admission control**: a task only runs when one station and
//!   enough idle, present workers are free at once
//! - **Time-gated eligibility**: workers come and go, tasks wait for their start
//!   time, and the plant wakes itself at the next boundary without polling
//! - **Unsatisfiable work**: tasks that no station or no present or announced
//!   workforce can ever satisfy are retired instead of waiting forever
//! - **Graceful drain**: shutdown waits for running work and for every caller
//!   still collecting a result before releasing state
//!
//! ## Architecture
//!
//! - **Registry**: append-only station, worker and task tables
//! - **Matching engine**: greedy pass pairing the largest free station with the
//!   first registered runnable task that fits
//! - **Alarm thread**: sleeps until the earliest future worker/task boundary
//! - **Work threads**: one per worker assignment, running the injected
//!   [`core::WorkExecutor`] without the plant lock
//! - **Lifecycle**: [`core::Plant`] handles for init, registration, collection
//!   and shutdown
//!
//! ```rust,ignore
//! use plant_scheduler::config::PlantConfig;
//! use plant_scheduler::core::{FnExecutor, Plant};
//! use plant_scheduler::util::{now_ms, TaskSpec, WorkerSpec};
//!
//! let plant = Plant::new(FnExecutor(|w: &WorkerSpec, t: &TaskSpec, slot: usize| {
//!     format!("worker {} did part {slot} of task {}", w.id, t.id)
//! }));
//! plant.init(&PlantConfig::new().with_stations([2, 1]).with_worker_count_hint(2))?;
//!
//! let now = now_ms();
//! plant.add_worker(WorkerSpec::new(1, now, now + 10_000))?;
//! plant.add_worker(WorkerSpec::new(2, now, now + 10_000))?;
//! plant.add_task(TaskSpec::new(100, 2, now + 50))?;
//!
//! let parts = plant.collect_task(100)?;
//! plant.destroy()?;
//! ```
//!
//! For complete examples, see:
//! - `tests/plant_test.rs` - scheduling scenarios
//! - `tests/lifecycle_test.rs` - init/destroy windows and draining

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Plant registry, matching engine, alarm and lifecycle.
pub mod core;
/// Configuration models for plants and their threads.
pub mod config;
/// Builders to construct plants from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
