//! Runtime configuration loaded from JSON.
//!
//! # Invariants
//! - `import_batch_size` and `order_number_width` are at least 1.
//! - `MEMO_DB_PATH`, when set and non-blank, overrides `database_path`.

use crate::import::DEFAULT_BATCH_SIZE;
use crate::logging::{default_log_level, normalize_level};
use crate::service::order_service::DEFAULT_ORDER_NUMBER_WIDTH;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "MEMO_DB_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_level_string")]
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_batch_size")]
    pub import_batch_size: usize,
    #[serde(default = "default_number_width")]
    pub order_number_width: usize,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("memo.sqlite3")
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_number_width() -> usize {
    DEFAULT_ORDER_NUMBER_WIDTH
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_level_string(),
            log_dir: None,
            import_batch_size: default_batch_size(),
            order_number_width: default_number_width(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl MemoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database_path",
                message: "must not be empty".to_string(),
            });
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid {
            field: "log_level",
            message: err.to_string(),
        })?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "log_dir",
                    message: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        if self.import_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "import_batch_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.order_number_width == 0 {
            return Err(ConfigError::Invalid {
                field: "order_number_width",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Applies a database path override, ignoring blank values.
    pub fn with_database_override(mut self, value: Option<&str>) -> Self {
        if let Some(path) = value.map(str::trim).filter(|path| !path.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        self
    }
}

/// Loads, applies the `MEMO_DB_PATH` override and validates.
pub fn load_config(path: impl AsRef<Path>) -> Result<MemoConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let override_path = std::env::var(DB_PATH_ENV).ok();
    let config = parse_config(&content)?.with_database_override(override_path.as_deref());
    config.validate()?;
    Ok(config)
}

/// Defaults for runs without a config file, honoring `MEMO_DB_PATH`.
pub fn load_default_config() -> Result<MemoConfig, ConfigError> {
    let override_path = std::env::var(DB_PATH_ENV).ok();
    default_config_with_override(override_path.as_deref())
}

/// Defaults with an explicit database path override, validated.
pub fn default_config_with_override(value: Option<&str>) -> Result<MemoConfig, ConfigError> {
    let config = MemoConfig::default().with_database_override(value);
    config.validate()?;
    Ok(config)
}

/// Parses and validates without consulting the environment.
pub fn load_config_from_str(content: &str) -> Result<MemoConfig, ConfigError> {
    let config = parse_config(content)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<MemoConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::{load_config_from_str, ConfigError, MemoConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.import_batch_size, 50);
        assert_eq!(config.order_number_width, 3);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = load_config_from_str(r#"{"import_batch_size": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "import_batch_size",
                ..
            }
        ));
    }

    #[test]
    fn blank_override_keeps_configured_path() {
        let config = MemoConfig::default().with_database_override(Some("  "));
        assert_eq!(config.database_path, PathBuf::from("memo.sqlite3"));
        let config = config.with_database_override(Some("/var/lib/memo/db.sqlite3"));
        assert_eq!(config.database_path, PathBuf::from("/var/lib/memo/db.sqlite3"));
    }
}
