use helvetia_seed::{PipelineConfig, PipelineError};
use std::io::Write;

#[test]
fn test_load_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "connection:\n  host: 10.0.0.5\n  port: 3306\nseed:\n  users: 100\n  reads: 1000\n  base_time: 2018-01-01T00:00:00\n  truncate: true\nberead:\n  batch_size: 50\nretry:\n  max_attempts: 4"
    )
    .unwrap();

    let config = PipelineConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.connection.host, "10.0.0.5");
    assert_eq!(config.connection.port, 3306);
    assert_eq!(config.connection.user, "root");
    assert_eq!(config.seed.users, 100);
    assert_eq!(config.seed.articles, 10_000);
    assert_eq!(config.seed.base_time.to_string(), "2018-01-01 00:00:00");
    assert!(config.seed.truncate);
    assert_eq!(config.beread.batch_size, 50);
    assert_eq!(config.rank.top_n, 5);
    assert_eq!(config.retry.max_attempts, 4);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PipelineConfig::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let err = PipelineConfig::from_yaml_str("seed: [not, a, map]").unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn test_reads_without_entities_rejected() {
    let mut config = PipelineConfig::default();
    config.seed.users = 0;
    assert!(config.validate().is_err());
    config.seed.reads_only = true;
    assert!(config.validate().is_err());
    config.seed.reads = 0;
    assert!(config.validate().is_ok());
}
