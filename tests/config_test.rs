//! Tests for configuration parsing, environment overrides and validation.

use std::collections::HashMap;
use std::time::Duration;

use deferred_jobs::config::{ServiceConfig, WorkerPoolConfig};
use deferred_jobs::core::ConfigError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let cfg = ServiceConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.hello_job_work(), Duration::from_secs(5));
    assert!(cfg.pool.worker_count >= 1);
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(WorkerPoolConfig::new()
        .with_thread_stack_size(1024)
        .validate()
        .is_err());
}

#[test]
fn test_from_json_partial() {
    let cfg = ServiceConfig::from_json_str(
        r#"{ "bind_addr": "0.0.0.0:8080", "pool": { "worker_count": 3 }, "poll_interval_ms": 250 }"#,
    )
    .unwrap();
    assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.pool.worker_count, 3);
    assert_eq!(cfg.pool.max_queue_depth, WorkerPoolConfig::default().max_queue_depth);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(matches!(
        ServiceConfig::from_json_str("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        ServiceConfig::from_json_str(r#"{ "max_scheduled": 0 }"#),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        ServiceConfig::from_json_str(r#"{ "pool": { "worker_count": 0 } }"#),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_env_overrides() {
    let cfg = ServiceConfig::from_lookup(lookup(&[
        ("DEFERRED_JOBS_BIND_ADDR", "127.0.0.1:9999"),
        ("DEFERRED_JOBS_WORKER_COUNT", "7"),
        ("DEFERRED_JOBS_POLL_INTERVAL_MS", " 50 "),
        ("DEFERRED_JOBS_HELLO_JOB_WORK_MS", "10"),
    ]))
    .unwrap();
    assert_eq!(cfg.bind_addr, "127.0.0.1:9999");
    assert_eq!(cfg.pool.worker_count, 7);
    assert_eq!(cfg.poll_interval_ms, 50);
    assert_eq!(cfg.hello_job_work(), Duration::from_millis(10));
}

#[test]
fn test_env_rejects_garbage() {
    let err = ServiceConfig::from_lookup(lookup(&[("DEFERRED_JOBS_MAX_SCHEDULED", "lots")]))
        .unwrap_err();
    match err {
        ConfigError::InvalidEnv { key, value } => {
            assert_eq!(key, "DEFERRED_JOBS_MAX_SCHEDULED");
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_env_validates_result() {
    let result = ServiceConfig::from_lookup(lookup(&[("DEFERRED_JOBS_POLL_INTERVAL_MS", "0")]));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

fn env_file(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("deferred-jobs-{}-{name}.env", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_malformed_env_file_is_rejected() {
    let path = env_file("malformed", "!!! not a pair\n");
    let result = ServiceConfig::from_env_file(&path);
    std::fs::remove_file(&path).ok();
    match result {
        Err(ConfigError::Invalid(msg)) => assert!(msg.starts_with(".env:"), "{msg}"),
        other => panic!("expected invalid .env error, got {other:?}"),
    }
}

#[test]
fn test_missing_env_file_is_ignored() {
    let path = std::env::temp_dir().join(format!("deferred-jobs-{}-absent.env", std::process::id()));
    assert!(ServiceConfig::from_env_file(&path).is_ok());
}
