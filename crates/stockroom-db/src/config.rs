//! Application configuration.
//!
//! Settings come from environment variables with fallback to defaults.
//!
//! | Variable                       | Default          |
//! |--------------------------------|------------------|
//! | `STOCKROOM_DATABASE_PATH`      | `stockroom.db`   |
//! | `STOCKROOM_MAX_CONNECTIONS`    | `5`              |
//! | `STOCKROOM_BUSY_TIMEOUT_MS`    | `5000`           |
//! | `STOCKROOM_DEFAULT_LOAN_DAYS`  | `14`             |
//!
//! `RUST_LOG` controls log output (see [`init_tracing`]).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::pool::DbConfig;
use stockroom_core::validation::validate_loan_days;
use stockroom_core::DEFAULT_LOAN_DAYS;

const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

/// Stockroom settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Write-lock wait in milliseconds
    pub busy_timeout_ms: u64,

    /// Loan length when a borrow names none
    pub default_loan_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
            default_loan_days: DEFAULT_LOAN_DAYS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_path: lookup("STOCKROOM_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "STOCKROOM_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_or(&lookup, "STOCKROOM_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            default_loan_days: parse_or(
                &lookup,
                "STOCKROOM_DEFAULT_LOAN_DAYS",
                defaults.default_loan_days,
            )?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("STOCKROOM_MAX_CONNECTIONS".to_string()));
        }

        validate_loan_days(config.default_loan_days)
            .map_err(|_| ConfigError::InvalidValue("STOCKROOM_DEFAULT_LOAN_DAYS".to_string()))?;

        Ok(config)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// Installs the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; falls back to `info,stockroom=debug,sqlx=warn`.
/// A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
