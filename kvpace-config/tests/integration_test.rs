//! Integration tests for kvpace-config

use kvpace_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

fn write_params(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Run with no KVPACE_* overrides visible
fn without_overrides<R>(f: impl FnOnce() -> R) -> R {
    with_vars(
        [
            ("KVPACE_ADDRESS", None::<&str>),
            ("KVPACE_RATE", None),
            ("KVPACE_WORKERS", None),
            ("KVPACE_RECONNECT_AFTER", None),
            ("KVPACE_LOG_LEVEL", None),
            ("KVPACE_LOG_FORMAT", None),
        ],
        f,
    )
}

#[test]
fn test_default_config_validation() {
    let config = KvpaceConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("KVPACE_ADDRESS", Some("10.1.2.3:6380")),
        ("KVPACE_RATE", Some("2000")),
        ("KVPACE_WORKERS", Some("4")),
        ("KVPACE_RECONNECT_AFTER", Some("1000")),
        ("KVPACE_LOG_LEVEL", Some("debug")),
        ("KVPACE_LOG_FORMAT", Some("json")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.target.address, "10.1.2.3:6380");
        assert_eq!(config.target.rate, 2000);
        assert_eq!(config.target.workers, 4);
        assert_eq!(config.target.reconnect_budget(), Some(1000));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    });
}

#[test]
fn test_invalid_env_value() {
    with_vars(vec![("KVPACE_RATE", Some("fast"))], || {
        match ConfigLoader::new().from_env() {
            Err(ConfigError::Override { var, value }) => {
                assert_eq!(var, "KVPACE_RATE");
                assert_eq!(value, "fast");
            }
            other => panic!("expected override error, got {:?}", other),
        }
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("LOADGEN_WORKERS", Some("8"))], || {
        let config = ConfigLoader::with_prefix("LOADGEN").from_env().unwrap();
        assert_eq!(config.target.workers, 8);
    });
}

#[test]
fn test_from_file_with_legacy_parameter_names() {
    let file = write_params(
        r#"
target:
  address: "127.0.0.1:7777"
  workers: 2
  rate: 1000
  connect_timeout: 500ms
workload:
  valuelen: 32
  keynum: 100
  hashnum: 0
  setnum: 10
  sortedsetnum: 10
"#,
    );

    without_overrides(|| {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.target.address, "127.0.0.1:7777");
        assert_eq!(config.target.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.workload.value_len, 32);
        assert_eq!(config.workload.key_num, 100);
        assert_eq!(config.workload.hash_num, 5000);
        assert_eq!(config.workload.set_num, 10);
    });
}

#[test]
fn test_from_file_rejects_too_few_keys() {
    let file = write_params("target:\n  workers: 50\nworkload:\n  keynum: 20\n");
    let result = without_overrides(|| ConfigLoader::new().from_file(file.path()));
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_from_file_surfaces_parse_errors() {
    let file = write_params("target: [this is not a mapping\n");
    let result = without_overrides(|| ConfigLoader::new().from_file(file.path()));
    assert!(matches!(result, Err(ConfigError::Malformed(_))));
}

#[test]
fn test_lenient_load_falls_back_to_defaults() {
    let missing = std::env::temp_dir().join("kvpace-missing-params.yaml");
    let broken = write_params("workload: {{{");

    without_overrides(|| {
        let (config, fallback) = ConfigLoader::new().load_lenient(Some(&missing)).unwrap();
        assert_eq!(config.workload, WorkloadConfig::default());
        assert!(matches!(fallback, Some(ConfigError::Unreadable(_))));

        let (config, fallback) = ConfigLoader::new().load_lenient(Some(broken.path())).unwrap();
        assert_eq!(config.target.rate, 10_000);
        assert!(matches!(fallback, Some(ConfigError::Malformed(_))));
    });
}

#[test]
fn test_lenient_load_does_not_validate() {
    let file = write_params("target:\n  workers: 0\n");
    let (config, fallback) =
        without_overrides(|| ConfigLoader::new().load_lenient(Some(file.path())).unwrap());
    assert!(fallback.is_none());
    assert_eq!(config.target.workers, 0);
    assert!(config.validate_all().is_err());
}

#[test]
fn test_yaml_config_serialization() {
    let config = KvpaceConfig::default();
    let yaml = config.to_yaml().unwrap();

    let parsed: KvpaceConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.target.report_interval, Duration::from_secs(1));
}
