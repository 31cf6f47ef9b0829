//! Runtime configuration for core policies and store behavior.
//!
//! # Responsibility
//! - Carry tunables shared by services (mutable window, retry budgets,
//!   listing caps, store timeouts).
//! - Load overrides from JSON with per-field defaults.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`from_json_file` has passed
//!   `validate()`.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Seven days in epoch milliseconds.
pub const DEFAULT_MUTABLE_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const DEFAULT_STORE_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_STORE_RETRY_BACKOFF_MS: u64 = 25;
const DEFAULT_ARCHIVE_DELETE_ATTEMPTS: u32 = 3;
const DEFAULT_ACTIVITY_LIST_LIMIT: u32 = 100;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Core tunables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// How long after creation a report may still be edited or deleted.
    pub mutable_window_ms: i64,
    /// Total attempts for a store call that fails with a busy/locked error.
    pub store_retry_attempts: u32,
    /// Base delay between store retries; doubles on every attempt.
    pub store_retry_backoff_ms: u64,
    /// Attempts for the delete step of report archival.
    pub archive_delete_attempts: u32,
    /// Maximum activity rows returned by one listing.
    pub activity_list_limit: u32,
    /// SQLite busy timeout applied to every connection.
    pub busy_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            mutable_window_ms: DEFAULT_MUTABLE_WINDOW_MS,
            store_retry_attempts: DEFAULT_STORE_RETRY_ATTEMPTS,
            store_retry_backoff_ms: DEFAULT_STORE_RETRY_BACKOFF_MS,
            archive_delete_attempts: DEFAULT_ARCHIVE_DELETE_ATTEMPTS,
            activity_list_limit: DEFAULT_ACTIVITY_LIST_LIMIT,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    /// Rejects values that would disable a policy outright.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mutable_window_ms <= 0 {
            return Err(ConfigError::Invalid {
                field: "mutable_window_ms",
                reason: "must be positive",
            });
        }
        if self.store_retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "store_retry_attempts",
                reason: "must be at least 1",
            });
        }
        if self.archive_delete_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "archive_delete_attempts",
                reason: "must be at least 1",
            });
        }
        if self.activity_list_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "activity_list_limit",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Config load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_MUTABLE_WINDOW_MS};

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.mutable_window_ms, DEFAULT_MUTABLE_WINDOW_MS);
        assert_eq!(config.activity_list_limit, 100);
    }

    #[test]
    fn partial_document_overrides_named_fields_only() {
        let config = CoreConfig::from_json_str(r#"{"mutable_window_ms": 3600000}"#)
            .expect("partial config should parse");
        assert_eq!(config.mutable_window_ms, 3_600_000);
        assert_eq!(config.store_retry_attempts, 3);
    }

    #[test]
    fn rejects_non_positive_window() {
        let err = CoreConfig::from_json_str(r#"{"mutable_window_ms": 0}"#)
            .expect_err("zero window must be rejected");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "mutable_window_ms",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = CoreConfig::from_json_str(r#"{"admin_bypass": true}"#)
            .expect_err("unknown field must be rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
