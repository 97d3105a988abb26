//! Tests for utility functions

use plant_scheduler::util::{now_ms, Clock, ManualClock, SystemClock, TaskSpec, WorkerSpec};

#[test]
fn test_worker_window_is_half_open() {
    let worker = WorkerSpec::new(1, 10, 20);
    assert!(!worker.is_present_at(9));
    assert!(worker.is_present_at(10));
    assert!(worker.is_present_at(19));
    assert!(!worker.is_present_at(20));
}

#[test]
fn test_empty_worker_window() {
    let worker = WorkerSpec::new(1, 10, 10);
    assert!(!worker.is_present_at(10));
}

#[test]
fn test_specs_serialize() {
    let task = TaskSpec::new(3, 2, 1_000);
    let json = serde_json::to_string(&task).unwrap();
    assert_eq!(json, r#"{"id":3,"capacity":2,"start":1000}"#);

    let worker: WorkerSpec = serde_json::from_str(r#"{"id":1,"start":5,"end":9}"#).unwrap();
    assert_eq!(worker, WorkerSpec::new(1, 5, 9));
}

#[test]
fn test_manual_clock_moves_only_when_told() {
    let clock = ManualClock::new(100);
    assert_eq!(clock.now(), 100);
    assert_eq!(clock.advance(50), 150);
    assert_eq!(clock.now(), 150);
    clock.set(10);
    assert_eq!(clock.now(), 10);
}

#[test]
fn test_system_clock_tracks_now_ms() {
    let before = now_ms();
    let now = SystemClock.now();
    assert!(now >= before);
}
