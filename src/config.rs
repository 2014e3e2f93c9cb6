//! Configuration file parser for propfeed.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! `DATABASE_URL` and `APP_URL` environment variables override their file
//! counterparts so deployments can keep connection strings out of the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// sqlx connection string for the listing store.
    pub database_url: String,

    /// Base application URL used to synthesize listing and company URLs.
    pub app_url: String,

    /// Working directory feed files are written to.
    pub feeds_dir: PathBuf,

    /// Whether completed feeds are transferred to `export_path` after a run.
    pub export_enabled: bool,

    /// Publication destination for completed feeds.
    pub export_path: Option<PathBuf>,

    /// Rows fetched per page worker.
    pub page_size: i64,

    /// Maximum number of page workers running at once.
    pub max_concurrent_pages: usize,

    /// Per-request timeout for the link validator, in seconds.
    pub request_timeout_secs: u64,

    /// Export audit log file.
    pub log_file: PathBuf,

    /// Link validator error log file.
    pub url_error_log: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:propfeed.db?mode=rwc".to_string(),
            app_url: "http://localhost".to_string(),
            feeds_dir: PathBuf::from("feeds"),
            export_enabled: false,
            export_path: None,
            page_size: 1000,
            max_concurrent_pages: 8,
            request_timeout_secs: 600,
            log_file: PathBuf::from("log.txt"),
            url_error_log: PathBuf::from("url-error-log.txt"),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Oversize file → `Err(ConfigError::TooLarge)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    ///
    /// After parsing, `DATABASE_URL` and `APP_URL` environment variables
    /// override the corresponding fields when set and non-empty.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // size check before reading so a corrupted file is never slurped whole
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default().with_env_overrides());
            }
            _ => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default().with_env_overrides());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default().with_env_overrides());
        }

        let config: Config = toml::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database_url = url;
            }
        }
        if let Ok(url) = std::env::var("APP_URL") {
            if !url.is_empty() {
                self.app_url = url;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.max_concurrent_pages, 8);
        assert_eq!(config.request_timeout_secs, 600);
        assert_eq!(config.feeds_dir, PathBuf::from("feeds"));
        assert!(!config.export_enabled);
        assert!(config.export_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            app_url = "https://example.org"
            max_concurrent_pages = 2
        "#,
        )
        .unwrap();
        assert_eq!(config.app_url, "https://example.org");
        assert_eq!(config.max_concurrent_pages, 2);
        // untouched keys keep their defaults
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.log_file, PathBuf::from("log.txt"));
    }

    #[test]
    fn test_oversize_file_is_rejected_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("propfeed.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result: Result<Config, toml::de::Error> = toml::from_str("page_size = [not toml");
        assert!(result.is_err());
    }
}
