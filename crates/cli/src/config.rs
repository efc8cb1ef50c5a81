//! Benchmark configuration via `lockbench.toml`
//!
//! Every field has a default, so a missing file or a partial file both work.
//! Command-line flags are applied on top of whatever the file says.

use lockbench_concurrency::RetryConfig;
use lockbench_storage::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "lockbench.toml";

/// Failure to load, validate or write `lockbench.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`BenchConfig`]
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The file could not be written
    #[error("Failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Benchmark configuration loaded from `lockbench.toml`.
///
/// # Example
///
/// ```toml
/// workers = 100
/// requests = 1000
/// quantity = 1
/// initial_stock = 1000
///
/// [store]
/// op_latency_us = 200
///
/// [retry]
/// max_retries = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Concurrent worker threads
    pub workers: usize,
    /// Total decrements issued per strategy
    pub requests: usize,
    /// Amount removed by each decrement
    pub quantity: i64,
    /// Stock every counter is reset to before a run
    pub initial_stock: i64,
    /// In-memory store settings
    pub store: StoreConfig,
    /// Optimistic retry policy
    pub retry: RetryConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            workers: 100,
            requests: 1000,
            quantity: 1,
            initial_stock: 1000,
            store: StoreConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# lockbench configuration
#
# Concurrent worker threads issuing decrements
workers = 100

# Total decrements per strategy (spread over the workers)
requests = 1000

# Amount removed by each decrement (must be positive)
quantity = 1

# Stock every counter is reset to before a run
initial_stock = 1000

[store]
# Simulated round-trip latency of every store call, in microseconds.
# Raise it to widen race windows, like a networked database would.
op_latency_us = 0
# Give up waiting for a row lock after this many milliseconds (default: wait forever)
# lock_timeout_ms = 2000

[retry]
# Attempts before the optimistic strategy gives up
max_retries = 5
# Exponential backoff between attempts (0 = retry immediately)
base_delay_ms = 0
max_delay_ms = 50
"#
    }

    /// Check values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.requests == 0 {
            return Err(ConfigError::Invalid("requests must be at least 1".into()));
        }
        if self.quantity <= 0 {
            return Err(ConfigError::Invalid(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BenchConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` if the file was created.
    pub fn write_default_if_missing(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_parses_to_default() {
        let config: BenchConfig = toml::from_str(BenchConfig::default_toml()).unwrap();
        assert_eq!(config, BenchConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "workers = 8\n[store]\nop_latency_us = 250\n").unwrap();

        let config = BenchConfig::from_file(&path).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.requests, 1000);
        assert_eq!(config.store.op_latency_us, 250);
        assert_eq!(config.store.lock_timeout_ms, None);
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "quantity = 0\n").unwrap();
        let err = BenchConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("quantity"));

        std::fs::write(&path, "workers = \"many\"\n").unwrap();
        let err = BenchConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = BenchConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn write_default_only_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(BenchConfig::write_default_if_missing(&path).unwrap());
        std::fs::write(&path, "workers = 3\n").unwrap();
        assert!(!BenchConfig::write_default_if_missing(&path).unwrap());
        assert_eq!(BenchConfig::from_file(&path).unwrap().workers, 3);
    }

    #[test]
    fn io_failures_are_not_validation_errors() {
        let dir = TempDir::new().unwrap();
        let err = BenchConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let unwritable = dir.path().join("missing-dir").join(CONFIG_FILE_NAME);
        let err = BenchConfig::write_default_if_missing(&unwritable).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));

        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "requests = 0\n").unwrap();
        let err = BenchConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
