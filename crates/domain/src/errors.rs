//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for installment reconciliation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization failure or deadlock reported by the store. The write can
    /// be replayed after a pause.
    #[error("Database conflict: {0}")]
    DatabaseConflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// True for the store-specific conflict class absorbed by backoff.
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(self, Self::DatabaseConflict(_))
    }
}

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, SyncError>;
