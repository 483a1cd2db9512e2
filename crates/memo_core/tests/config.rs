use memo_core::config::DB_PATH_ENV;
use memo_core::{
    default_config_with_override, load_config, load_default_config, ConfigError, MemoConfig,
};
use std::path::PathBuf;

#[test]
fn config_file_is_loaded_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.json");
    std::fs::write(
        &path,
        r#"{
            "database_path": "/srv/memo/memo.sqlite3",
            "log_level": "WARNING",
            "import_batch_size": 25,
            "order_number_width": 4
        }"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.log_level, "WARNING");
    assert_eq!(config.import_batch_size, 25);
    assert_eq!(config.order_number_width, 4);
    if std::env::var(DB_PATH_ENV).map_or(true, |value| value.trim().is_empty()) {
        assert_eq!(config.database_path, PathBuf::from("/srv/memo/memo.sqlite3"));
    }
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    match load_config(&path).unwrap_err() {
        ConfigError::ReadFile { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_keys_and_relative_log_dir_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let typo = dir.path().join("typo.json");
    std::fs::write(&typo, r#"{"batch_size": 10}"#).unwrap();
    assert!(matches!(load_config(&typo), Err(ConfigError::Parse(_))));

    let relative = dir.path().join("relative.json");
    std::fs::write(&relative, r#"{"log_dir": "logs"}"#).unwrap();
    assert!(matches!(
        load_config(&relative),
        Err(ConfigError::Invalid { field: "log_dir", .. })
    ));
}

#[test]
fn default_config_honors_database_override() {
    let overridden = default_config_with_override(Some(" /var/lib/memo/memo.sqlite3 ")).unwrap();
    assert_eq!(overridden.database_path, PathBuf::from("/var/lib/memo/memo.sqlite3"));
    assert_eq!(overridden.import_batch_size, MemoConfig::default().import_batch_size);

    let blank = default_config_with_override(Some("  ")).unwrap();
    assert_eq!(blank.database_path, MemoConfig::default().database_path);

    let from_env = load_default_config().unwrap();
    match std::env::var(DB_PATH_ENV) {
        Ok(value) if !value.trim().is_empty() => {
            assert_eq!(from_env.database_path, PathBuf::from(value.trim()))
        }
        _ => assert_eq!(from_env.database_path, MemoConfig::default().database_path),
    }
}
