//! Tests for configuration validation

use plant_scheduler::config::plant::{parse_capacities, MIN_THREAD_STACK_SIZE};
use plant_scheduler::config::PlantConfig;

#[test]
fn test_default_config_is_valid() {
    let cfg = PlantConfig::default();
    assert!(cfg.validate().is_ok());
    assert!(cfg.station_capacities.is_empty());
    assert_eq!(cfg.worker_count_hint, 0);
    assert_eq!(cfg.thread_name_prefix, "plant");
    assert_eq!(cfg.max_station_capacity(), 0);
}

#[test]
fn test_config_invalid_stack_size() {
    let cfg = PlantConfig::new().with_thread_stack_size(MIN_THREAD_STACK_SIZE - 1);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_invalid_prefix() {
    let cfg = PlantConfig::new().with_thread_name_prefix("  ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json_applies_defaults() {
    let cfg = PlantConfig::from_json_str(r#"{"station_capacities":[2,3]}"#).unwrap();
    assert_eq!(cfg.station_capacities, vec![2, 3]);
    assert_eq!(cfg.worker_count_hint, 0);
    assert_eq!(cfg.thread_stack_size, PlantConfig::new().thread_stack_size);
    assert_eq!(cfg.thread_name_prefix, "plant");
}

#[test]
fn test_config_from_json_full() {
    let json = r#"{
        "station_capacities": [4],
        "worker_count_hint": 8,
        "thread_stack_size": 131072,
        "thread_name_prefix": "line-a"
    }"#;
    let cfg = PlantConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.worker_count_hint, 8);
    assert_eq!(cfg.thread_stack_size, 131_072);
    assert_eq!(cfg.thread_name_prefix, "line-a");
}

#[test]
fn test_config_from_json_rejects_bad_input() {
    assert!(PlantConfig::from_json_str("{").is_err());
    assert!(PlantConfig::from_json_str(r#"{"worker_count_hint":1}"#).is_err());
    assert!(PlantConfig::from_json_str(r#"{"station_capacities":[1],"thread_stack_size":16}"#).is_err());
}

#[test]
fn test_config_from_env() {
    std::env::set_var("PLANT_STATIONS", "1, 2,5");
    std::env::set_var("PLANT_WORKER_HINT", "3");
    std::env::set_var("PLANT_THREAD_PREFIX", "env-plant");

    let cfg = PlantConfig::from_env().unwrap();
    assert_eq!(cfg.station_capacities, vec![1, 2, 5]);
    assert_eq!(cfg.worker_count_hint, 3);
    assert_eq!(cfg.thread_name_prefix, "env-plant");

    std::env::set_var("PLANT_WORKER_HINT", "many");
    assert!(PlantConfig::from_env().is_err());

    std::env::remove_var("PLANT_STATIONS");
    std::env::remove_var("PLANT_WORKER_HINT");
    std::env::remove_var("PLANT_THREAD_PREFIX");
    assert!(PlantConfig::from_env().is_err());
}

#[test]
fn test_parse_capacities_rejects_garbage() {
    assert_eq!(parse_capacities("3").unwrap(), vec![3]);
    assert!(parse_capacities("1,-2").is_err());
}
