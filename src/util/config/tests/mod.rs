//! 配置加载单元测试

use super::*;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = TickflowConfig::default();
    assert_eq!(config.host.tick_interval_ms, 16);
    assert_eq!(config.host.max_ticks, None);
    assert_eq!(config.runner.timeout(), None);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_empty_document_uses_defaults() {
    let config: TickflowConfig = toml::from_str("").unwrap();
    assert_eq!(config, TickflowConfig::default());
}

#[test]
fn test_partial_document_merges_defaults() {
    let config: TickflowConfig = toml::from_str(
        r#"
        [host]
        max_ticks = 120

        [runner]
        timeout_ms = 2500
        "#,
    )
    .unwrap();
    assert_eq!(config.host.tick_interval_ms, 16);
    assert_eq!(config.host.max_ticks, Some(120));
    assert_eq!(config.runner.timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_round_trip_through_toml() {
    let mut config = TickflowConfig::default();
    config.host.tick_interval_ms = 1;
    config.log.level = "debug".into();
    let rendered = to_toml(&config).unwrap();
    let parsed: TickflowConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[log]\nlevel = \"warn\"").unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.log.level, "warn");
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_invalid_document_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[host]\ntick_interval_ms = \"fast\"").unwrap();

    let err = load_config_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
