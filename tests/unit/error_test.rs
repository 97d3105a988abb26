//! Tests for error types

use plant_scheduler::core::PlantError;

#[test]
fn test_lifecycle_errors() {
    assert_eq!(format!("{}", PlantError::AlreadyInitialized), "plant already initialized");
    assert_eq!(format!("{}", PlantError::NotInitialized), "plant not initialized");
    assert_eq!(format!("{}", PlantError::ShuttingDown), "plant is shutting down");
}

#[test]
fn test_task_errors() {
    assert_eq!(format!("{}", PlantError::UnknownTask(9)), "unknown task: 9");
    assert_eq!(
        format!("{}", PlantError::TaskSkipped(4)),
        "task 4 skipped: not enough workers or station capacity"
    );
    assert_eq!(
        format!("{}", PlantError::InvalidTask("task 1 requires zero workers".to_string())),
        "invalid task: task 1 requires zero workers"
    );
}

#[test]
fn test_allocation_error_converts() {
    let mut v: Vec<u64> = Vec::new();
    let reserve = v.try_reserve(usize::MAX).unwrap_err();
    let err: PlantError = reserve.into();
    assert!(matches!(err, PlantError::Allocation(_)));
    assert!(format!("{err}").starts_with("allocation failed"));
}

#[test]
fn test_errors_lift_into_anyhow() {
    fn fails() -> plant_scheduler::core::AppResult<()> {
        let status: Result<(), PlantError> = Err(PlantError::NotInitialized);
        status?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(err.downcast_ref::<PlantError>(), Some(PlantError::NotInitialized)));
}
