//! Benchmarks for the plant scheduler.
//!
//! Benchmarks cover:
//! - Full init/register/collect/destroy cycles with many small tasks
//! - Wide tasks occupying whole stations
//! - Async collection from a tokio runtime

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tokio::runtime::Runtime;

use plant_scheduler::config::PlantConfig;
use plant_scheduler::core::{FnExecutor, Plant};
use plant_scheduler::util::{now_ms, TaskSpec, WorkerSpec};

// ============================================================================
// Helper Functions
// ============================================================================

type BenchPlant = Plant<u64, FnExecutor<fn(&WorkerSpec, &TaskSpec, usize) -> u64>>;

const HOUR_MS: u64 = 3_600_000;

fn part(worker: &WorkerSpec, task: &TaskSpec, slot: usize) -> u64 {
    worker.id ^ task.id.rotate_left(slot as u32)
}

fn running_plant(stations: &[usize], workers: u64) -> BenchPlant {
    let plant: BenchPlant = Plant::new(FnExecutor(part as fn(&WorkerSpec, &TaskSpec, usize) -> u64));
    plant
        .init(
            &PlantConfig::new()
                .with_stations(stations)
                .with_worker_count_hint(workers as usize)
                .with_thread_name_prefix("bench"),
        )
        .unwrap();

    let now = now_ms();
    for id in 0..workers {
        plant.add_worker(WorkerSpec::new(id, now, now + HOUR_MS)).unwrap();
    }
    plant
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_single_worker_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_worker_tasks");

    for tasks in [10u64, 100] {
        group.throughput(Throughput::Elements(tasks));
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            b.iter(|| {
                let plant = running_plant(&[1, 1, 1, 1], 4);
                let now = now_ms();
                for id in 0..tasks {
                    plant.add_task(TaskSpec::new(id, 1, now)).unwrap();
                }
                for id in 0..tasks {
                    black_box(plant.collect_task(id).unwrap());
                }
                plant.destroy().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_wide_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_tasks");

    for width in [2usize, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let plant = running_plant(&[width, width], 2 * width as u64);
                let now = now_ms();
                for id in 0..20 {
                    plant.add_task(TaskSpec::new(id, width, now)).unwrap();
                }
                for id in 0..20 {
                    black_box(plant.collect_task(id).unwrap());
                }
                plant.destroy().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_async_collect(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_collect");

    group.bench_function("collect_50_tasks", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async {
            let plant = running_plant(&[2, 2, 1], 5);
            let now = now_ms();
            for id in 0..50 {
                plant.add_task(TaskSpec::new(id, 1 + (id % 2) as usize, now)).unwrap();
            }
            for id in 0..50 {
                black_box(plant.collect_task_async(id).await.unwrap());
            }
            let destroyer = plant.clone();
            tokio::task::spawn_blocking(move || destroyer.destroy())
                .await
                .unwrap()
                .unwrap();
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_worker_tasks,
    bench_wide_tasks,
    bench_async_collect
);
criterion_main!(benches);
