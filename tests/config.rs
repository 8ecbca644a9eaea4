// tests/config.rs

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::Level;

use calcdag::config::{
    ConfigFile, RawConfigFile, apply_env_overrides, load_and_validate, load_from_path,
};
use calcdag::errors::CalcError;
use calcdag::logging::level_from_env;
use calcdag::types::Operator;
use calcdag_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_cover_every_section() {
    let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();

    assert_eq!(cfg.orchestrator.bind, "0.0.0.0:8080");
    assert_eq!(cfg.readiness_interval(), Duration::from_millis(500));
    assert_eq!(cfg.claim_lease(), None);

    let times = cfg.operation_times();
    assert_eq!(times.for_operator(Operator::Add), Duration::from_millis(100));
    assert_eq!(times.for_operator(Operator::Subtract), Duration::from_millis(100));
    assert_eq!(times.for_operator(Operator::Multiply), Duration::from_millis(200));
    assert_eq!(times.for_operator(Operator::Divide), Duration::from_millis(300));

    assert_eq!(cfg.agent.computing_power, 10);
    assert_eq!(cfg.agent.retry.max_attempts, 5);
    assert_eq!(cfg.agent.retry.base_backoff_ms, 2_000);
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
[orchestrator]
bind = "127.0.0.1:9000"
claim_lease_ms = 30000

[operations]
division_ms = 5

[agent]
computing_power = 3

[agent.retry]
base_backoff_ms = 50
"#,
    );

    let cfg = load_and_validate(Some(file.path())).unwrap();
    assert_eq!(cfg.orchestrator.bind, "127.0.0.1:9000");
    assert_eq!(cfg.claim_lease(), Some(Duration::from_secs(30)));
    assert_eq!(cfg.operations.division_ms, 5);
    assert_eq!(cfg.operations.addition_ms, 100);
    assert_eq!(cfg.agent.computing_power, 3);
    assert_eq!(cfg.agent.retry.base_backoff_ms, 50);
    assert_eq!(cfg.agent.retry.max_attempts, 5);
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("[orchestrator\nbind = 1");
    assert!(matches!(
        load_from_path(file.path()),
        Err(CalcError::TomlError(_))
    ));
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    assert!(matches!(
        load_and_validate(Some(path.as_path())),
        Err(CalcError::IoError(_))
    ));
}

#[test]
fn environment_overrides_apply() {
    let mut raw = RawConfigFile::default();
    apply_env_overrides(
        &mut raw,
        env(&[
            ("PORT", "9090"),
            ("TIME_ADDITION_MS", "1"),
            ("TIME_SUBTRACTION_MS", "2"),
            ("TIME_MULTIPLICATIONS_MS", "3"),
            ("TIME_DIVISIONS_MS", "4"),
            ("COMPUTING_POWER", "16"),
            ("ORCHESTRATOR_URL", "http://orchestrator:9090"),
        ]),
    );

    assert_eq!(raw.orchestrator.bind, "0.0.0.0:9090");
    assert_eq!(raw.operations.addition_ms, 1);
    assert_eq!(raw.operations.subtraction_ms, 2);
    assert_eq!(raw.operations.multiplication_ms, 3);
    assert_eq!(raw.operations.division_ms, 4);
    assert_eq!(raw.agent.computing_power, 16);
    assert_eq!(raw.agent.orchestrator_url, "http://orchestrator:9090");
}

#[test]
fn orchestrator_host_is_used_when_no_url_is_set() {
    let mut raw = RawConfigFile::default();
    apply_env_overrides(&mut raw, env(&[("ORCHESTRATOR_HOST", "orchestrator")]));
    assert_eq!(raw.agent.orchestrator_url, "http://orchestrator:8080");

    let mut raw = RawConfigFile::default();
    apply_env_overrides(
        &mut raw,
        env(&[
            ("ORCHESTRATOR_HOST", "orchestrator"),
            ("ORCHESTRATOR_URL", "http://10.0.0.2:9000"),
        ]),
    );
    assert_eq!(raw.agent.orchestrator_url, "http://10.0.0.2:9000");
}

#[test]
fn log_level_falls_back_to_log_level_variable() {
    assert_eq!(level_from_env(env(&[])), None);
    assert_eq!(
        level_from_env(env(&[("LOG_LEVEL", "debug")])),
        Some(Level::DEBUG)
    );
    assert_eq!(
        level_from_env(env(&[("CALCDAG_LOG", "warn"), ("LOG_LEVEL", "debug")])),
        Some(Level::WARN)
    );
    assert_eq!(
        level_from_env(env(&[("CALCDAG_LOG", "loud"), ("LOG_LEVEL", "trace")])),
        Some(Level::TRACE)
    );
}

#[test]
fn invalid_environment_values_are_ignored() {
    let mut raw = RawConfigFile::default();
    apply_env_overrides(
        &mut raw,
        env(&[("PORT", "http"), ("TIME_DIVISIONS_MS", "-3"), ("COMPUTING_POWER", "")]),
    );

    assert_eq!(raw.orchestrator.bind, "0.0.0.0:8080");
    assert_eq!(raw.operations.division_ms, 300);
    assert_eq!(raw.agent.computing_power, 10);
}

#[test]
fn validation_rejects_bad_values() {
    let cases = [
        ConfigFileBuilder::new().bind("not-an-address").build_raw(),
        ConfigFileBuilder::new().readiness_interval_ms(0).build_raw(),
        ConfigFileBuilder::new().claim_lease_ms(0).build_raw(),
        ConfigFileBuilder::new().computing_power(0).build_raw(),
        ConfigFileBuilder::new().retry(0, 10).build_raw(),
        ConfigFileBuilder::new().orchestrator_url("localhost:8080").build_raw(),
    ];

    for raw in cases {
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(CalcError::ConfigError(_))
        ));
    }
}
