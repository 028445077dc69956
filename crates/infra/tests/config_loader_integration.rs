//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use installsync_domain::RestartMode;
use installsync_infra::config;
use tempfile::NamedTempFile;

fn write_with_extension(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[api]
base_url = "https://api.example.com"
token_url = "https://api.example.com/redelabs/oauth/token"
username = "integration"
password = "secret"
authorization_header = "Basic aW50ZWdyYXRpb24="
timeout_secs = 15

[database]
server = "sql.internal"
port = 15432
database = "vendas"
user = "etl"
password = "pw"
table = "finance.bd_vendas_rede"

[reconcile]
batch_size = 10
workers = 6
record_retries = 4
max_consecutive_errors = 50
backoff_base_ms = 250
restart_mode = "re-exec"
max_restarts = 5
restart_delay_secs = 30
"#;

    let path = write_with_extension(toml_content, "toml");
    let config = config::load_from_file(Some(path.clone())).expect("config should load");

    assert_eq!(config.api.token_url, "https://api.example.com/redelabs/oauth/token");
    assert_eq!(config.api.timeout().as_secs(), 15);
    assert_eq!(config.database.port, 15432);
    assert_eq!(config.database.table, "finance.bd_vendas_rede");
    assert_eq!(config.reconcile.batch_size, 10);
    assert_eq!(config.reconcile.workers, 6);
    assert_eq!(config.reconcile.record_retries, 4);
    assert_eq!(config.reconcile.max_consecutive_errors, 50);
    assert_eq!(config.reconcile.backoff_base().as_millis(), 250);
    assert_eq!(config.reconcile.restart_mode, RestartMode::ReExec);
    assert_eq!(config.reconcile.max_restarts, Some(5));
    assert_eq!(config.reconcile.restart_delay().as_secs(), 30);
    assert!(config.validate().is_ok());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_secrets_are_not_debug_printed() {
    let json_content = r#"{
        "api": {
            "base_url": "https://api.example.com",
            "token_url": "https://api.example.com/token",
            "username": "u",
            "password": "api-password-value",
            "authorization_header": "Basic header-value"
        },
        "database": {
            "server": "db",
            "database": "sales",
            "user": "u",
            "password": "db-password-value"
        }
    }"#;

    let path = write_with_extension(json_content, "json");
    let config = config::load_from_file(Some(path.clone())).expect("config should load");
    let printed = format!("{config:?}");

    assert!(!printed.contains("api-password-value"));
    assert!(!printed.contains("header-value"));
    assert!(!printed.contains("db-password-value"));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_required_section_is_rejected() {
    let path = write_with_extension("[api]\nbase_url = \"https://x\"\n", "toml");

    let result = config::load_from_file(Some(path.clone()));
    assert!(result.is_err(), "Config without a database section must not load");

    std::fs::remove_file(path).ok();
}
