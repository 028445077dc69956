//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. `INSTALLSYNC_CONFIG`, when set, names the file to load
//! 2. Otherwise, attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `API_BASE_URL`, `API_TOKEN_URL`: lookup API base and token endpoint
//! - `API_USERNAME`, `API_PASSWORD`: password-grant credentials
//! - `API_AUTHORIZATION_HEADER`: pre-shared token request header
//! - `DB_SERVER`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`: database access
//!
//! Optional:
//! - `API_TIMEOUT_SECS`, `DB_PORT`, `DB_TABLE`
//! - `RECONCILE_BATCH_SIZE`, `RECONCILE_WORKERS`, `RECONCILE_RECORD_RETRIES`
//! - `RECONCILE_MAX_CONSECUTIVE_ERRORS`, `RECONCILE_BACKOFF_BASE_MS`
//! - `RECONCILE_RESTART_MODE` (`in-process` or `re-exec`)
//! - `RECONCILE_MAX_RESTARTS`, `RECONCILE_RESTART_DELAY_SECS`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./installsync.{json,toml}` or `./config.{json,toml}`
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use installsync_domain::constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_DB_PORT, DEFAULT_SALES_TABLE};
use installsync_domain::{
    ApiConfig, Config, DatabaseConfig, ReconcileConfig, RestartMode, Result, SyncError,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "INSTALLSYNC_CONFIG";

/// Load and validate configuration with automatic fallback strategy
///
/// # Errors
/// Returns `SyncError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or values fail validation
pub fn load() -> Result<Config> {
    let config = if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        load_from_file(Some(PathBuf::from(path)))?
    } else {
        match load_from_env() {
            Ok(config) => {
                tracing::info!("Configuration loaded from environment variables");
                config
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to load from environment, trying file");
                load_from_file(None)?
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let defaults = ReconcileConfig::default();

    let api = ApiConfig {
        base_url: env_var("API_BASE_URL")?,
        token_url: env_var("API_TOKEN_URL")?,
        username: env_var("API_USERNAME")?,
        password: env_var("API_PASSWORD")?,
        authorization_header: env_var("API_AUTHORIZATION_HEADER")?,
        timeout_secs: env_parse("API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?,
    };

    let database = DatabaseConfig {
        server: env_var("DB_SERVER")?,
        port: env_parse("DB_PORT", DEFAULT_DB_PORT)?,
        database: env_var("DB_NAME")?,
        user: env_var("DB_USER")?,
        password: env_var("DB_PASSWORD")?,
        table: std::env::var("DB_TABLE").unwrap_or_else(|_| DEFAULT_SALES_TABLE.to_string()),
    };

    let reconcile = ReconcileConfig {
        batch_size: env_parse("RECONCILE_BATCH_SIZE", defaults.batch_size)?,
        workers: env_parse("RECONCILE_WORKERS", defaults.workers)?,
        record_retries: env_parse("RECONCILE_RECORD_RETRIES", defaults.record_retries)?,
        max_consecutive_errors: env_parse(
            "RECONCILE_MAX_CONSECUTIVE_ERRORS",
            defaults.max_consecutive_errors,
        )?,
        backoff_base_ms: env_parse("RECONCILE_BACKOFF_BASE_MS", defaults.backoff_base_ms)?,
        restart_mode: env_parse::<RestartMode>("RECONCILE_RESTART_MODE", defaults.restart_mode)?,
        max_restarts: env_optional("RECONCILE_MAX_RESTARTS")?,
        restart_delay_secs: env_parse(
            "RECONCILE_RESTART_DELAY_SECS",
            defaults.restart_delay_secs,
        )?,
    };

    Ok(Config { api, database, reconcile })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config(
                "No configuration in environment and no config file in any standard location"
                    .to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

const CONFIG_FILE_NAMES: [&str; 4] =
    ["installsync.json", "installsync.toml", "config.json", "config.toml"];

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    let mut candidates = Vec::new();
    for root in &roots {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| root.join(name)));
        for parent in ["..", "../.."] {
            candidates.push(root.join(parent).join("config.json"));
            candidates.push(root.join(parent).join("config.toml"));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `SyncError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SyncError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional environment variable, falling back to `default`.
///
/// # Errors
/// Returns `SyncError::Config` when the variable is set but unparseable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_optional(key)?.unwrap_or(default))
}

fn env_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SyncError::Config(format!("Invalid value for {key}: {e}"))),
        _ => Ok(None),
    }
}
