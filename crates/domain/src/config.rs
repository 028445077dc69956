//! Configuration structures
//!
//! Loaded by `installsync_infra::config` from the environment or a JSON/TOML
//! file. Secrets never appear in `Debug` output.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_TIMEOUT_SECS, DEFAULT_BACKOFF_BASE_MS, DEFAULT_BATCH_SIZE, DEFAULT_DB_PORT,
    DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_RECORD_RETRIES, DEFAULT_SALES_TABLE,
    DEFAULT_WORKER_COUNT,
};
use crate::errors::{Result, SyncError};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    /// Returns `SyncError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(SyncError::Config("api.base_url must not be empty".into()));
        }
        if self.api.token_url.trim().is_empty() {
            return Err(SyncError::Config("api.token_url must not be empty".into()));
        }
        self.reconcile.validate()
    }
}

/// Payment-processor API access
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the lookup API (e.g. `https://api.example.com`)
    pub base_url: String,
    /// Full URL of the OAuth-style token endpoint
    pub token_url: String,
    pub username: String,
    pub password: String,
    /// Pre-shared value sent verbatim in the token request `Authorization`
    /// header
    pub authorization_header: String,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("authorization_header", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Relational store holding the sale records
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub server: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Table holding the sales; may be schema-qualified (`schema.table`)
    #[serde(default = "default_sales_table")]
    pub table: String,
}

impl DatabaseConfig {
    /// libpq key/value connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            quote_conn_value(&self.server),
            self.port,
            quote_conn_value(&self.database),
            quote_conn_value(&self.user),
            quote_conn_value(&self.password),
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

/// How the supervisor recovers from a circuit-breaker trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartMode {
    /// Rebuild all engine state and run again inside the same process.
    #[default]
    InProcess,
    /// Launch a fresh copy of the executable and exit this one.
    ReExec,
}

impl std::str::FromStr for RestartMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-process" | "in_process" | "inprocess" => Ok(Self::InProcess),
            "re-exec" | "re_exec" | "reexec" => Ok(Self::ReExec),
            other => Err(SyncError::Config(format!("Unknown restart mode: {other}"))),
        }
    }
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub batch_size: usize,
    pub workers: usize,
    /// Attempts per record (lookup + persist)
    pub record_retries: u32,
    /// Circuit breaker trips once consecutive lookup failures exceed this
    pub max_consecutive_errors: u32,
    /// First persistence backoff delay; doubled per attempt
    pub backoff_base_ms: u64,
    pub restart_mode: RestartMode,
    /// `None` restarts without limit
    pub max_restarts: Option<u32>,
    pub restart_delay_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKER_COUNT,
            record_retries: DEFAULT_RECORD_RETRIES,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            restart_mode: RestartMode::InProcess,
            max_restarts: None,
            restart_delay_secs: 0,
        }
    }
}

impl ReconcileConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// # Errors
    /// Returns `SyncError::Config` when a count that must be positive is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SyncError::Config("reconcile.batch_size must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(SyncError::Config("reconcile.workers must be at least 1".into()));
        }
        if self.record_retries == 0 {
            return Err(SyncError::Config("reconcile.record_retries must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_api_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_sales_table() -> String {
    DEFAULT_SALES_TABLE.to_string()
}

// libpq: values with spaces, quotes or backslashes must be single-quoted.
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> DatabaseConfig {
        DatabaseConfig {
            server: "db.internal".into(),
            port: 5433,
            database: "vendas".into(),
            user: "etl".into(),
            password: "s3cr3t".into(),
            table: DEFAULT_SALES_TABLE.into(),
        }
    }

    #[test]
    fn reconcile_defaults_match_engine_shape() {
        let config = ReconcileConfig::default();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.workers, 4);
        assert_eq!(config.record_retries, 3);
        assert_eq!(config.max_consecutive_errors, 20);
        assert_eq!(config.backoff_base(), Duration::from_secs(1));
        assert_eq!(config.restart_mode, RestartMode::InProcess);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let config = ReconcileConfig { workers: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn connection_string_quotes_awkward_values() {
        let mut db = database();
        db.password = "it's a pass".into();
        let conn = db.connection_string();
        assert!(conn.starts_with("host=db.internal port=5433 dbname=vendas user=etl"));
        assert!(conn.ends_with(r"password='it\'s a pass'"));
    }

    #[test]
    fn empty_value_is_quoted() {
        assert_eq!(quote_conn_value(""), "''");
    }

    #[test]
    fn debug_redacts_passwords() {
        let rendered = format!("{:?}", database());
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn restart_mode_parses_variants() {
        assert_eq!("re-exec".parse::<RestartMode>().unwrap(), RestartMode::ReExec);
        assert_eq!("In-Process".parse::<RestartMode>().unwrap(), RestartMode::InProcess);
        assert!("fork".parse::<RestartMode>().is_err());
    }
}
