use kvpace_config::{LogFormat, LogLevel, LoggingConfig};
use kvpace_logging::{build_filter, init_logging_from_config, init_simple_tracing};

#[test]
fn test_logging_config_integration() {
    let yaml_config = r#"
level: debug
format: json
include_location: true
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);

    assert!(init_logging_from_config(&config).is_ok());
    tracing::info!(worker = 3, "logging initialized");
    log::info!("records from the log facade are forwarded");

    // A second initialization is harmless
    assert!(init_simple_tracing("warn").is_ok());
    assert!(init_logging_from_config(&LoggingConfig::default()).is_ok());
}

#[test]
fn test_filter_falls_back_on_bad_directive() {
    let filter = build_filter("kvpace_core=[");
    let rendered = filter.to_string();
    assert!(!rendered.is_empty());

    assert_eq!(build_filter("debug").to_string(), "debug");
}
