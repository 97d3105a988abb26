//! Tests for builder modules

use std::sync::Arc;

use plant_scheduler::builders::{build_plant, build_plant_with_clock};
use plant_scheduler::config::PlantConfig;
use plant_scheduler::core::{FnExecutor, PlantError};
use plant_scheduler::util::{ManualClock, TaskSpec, WorkerSpec};

fn slot_executor() -> FnExecutor<fn(&WorkerSpec, &TaskSpec, usize) -> usize> {
    FnExecutor(|_: &WorkerSpec, _: &TaskSpec, slot: usize| slot)
}

#[test]
fn test_build_plant_initializes() {
    let cfg = PlantConfig::new().with_stations([2, 1]).with_worker_count_hint(2);
    let plant = build_plant(&cfg, slot_executor()).unwrap();

    assert!(plant.is_initialized());
    let stats = plant.stats();
    assert_eq!(stats.stations.len(), 2);
    assert_eq!(stats.workers_to_come, 2);

    plant.destroy().unwrap();
    assert!(!plant.is_initialized());
}

#[test]
fn test_build_plant_rejects_invalid_config() {
    let cfg = PlantConfig::new().with_stations([1]).with_thread_name_prefix("");
    let result = build_plant(&cfg, slot_executor());
    assert!(matches!(result, Err(PlantError::InvalidConfig(_))));
}

#[test]
fn test_build_plant_with_manual_clock() {
    let clock = Arc::new(ManualClock::new(0));
    let cfg = PlantConfig::new().with_stations([1]).with_worker_count_hint(1);
    let plant = build_plant_with_clock(&cfg, slot_executor(), clock.clone()).unwrap();

    plant.add_worker(WorkerSpec::new(1, 0, 1_000)).unwrap();
    plant.add_task(TaskSpec::new(1, 1, 500)).unwrap();
    assert_eq!(plant.stats().armed_deadline, Some(500));

    clock.set(500);
    plant.tick().unwrap();
    assert_eq!(plant.collect_task(1).unwrap(), vec![0]);

    plant.destroy().unwrap();
}
