//! Tests for audit sink

use plant_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(AuditAction::TaskAssigned, 42)
        .with_task(7)
        .with_station(1)
        .with_workers([3, 5]);
    sink.record(event);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::TaskAssigned);
    assert_eq!(events[0].task_id, Some(7));
    assert_eq!(events[0].station, Some(1));
    assert_eq!(events[0].worker_ids, vec![3, 5]);
    assert_eq!(events[0].at, 42);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(AuditAction::TaskRegistered, 1).with_task(1));
    sink.record(build_audit_event(AuditAction::TaskRegistered, 2).with_task(2));
    sink.record(build_audit_event(AuditAction::TaskRegistered, 3).with_task(3));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, Some(2)); // First one popped
    assert_eq!(events[1].task_id, Some(3));
}

#[test]
fn test_clones_share_buffer() {
    let observer = InMemoryAuditSink::new(10);
    let mut writer = observer.clone();

    writer.record(build_audit_event(AuditAction::WorkerRegistered, 5).with_workers([1]));
    writer.record(build_audit_event(AuditAction::WorkerExpired, 9).with_workers([1]));

    assert_eq!(observer.events().len(), 2);
    assert_eq!(observer.events_of(AuditAction::WorkerExpired).len(), 1);
    assert!(observer.events_of(AuditAction::TaskSkipped).is_empty());
}

#[test]
fn test_build_audit_event() {
    let a = build_audit_event(AuditAction::TaskFinished, 100);
    let b = build_audit_event(AuditAction::TaskFinished, 100);

    assert_ne!(a.event_id, b.event_id);
    assert!(a.task_id.is_none());
    assert!(a.worker_ids.is_empty());
    assert!(a.station.is_none());

    let json = serde_json::to_string(&a).unwrap();
    assert!(json.contains("\"task_finished\""));
}
