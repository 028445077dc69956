//! API-specific error types
//!
//! Errors raised by the HTTP adapters before they cross the port boundary as
//! [`SyncError`].

use installsync_domain::SyncError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Credentials or token rejected (401, 403)
    Authentication,
    /// Transport failure, no response
    Network,
    /// Bad local configuration (URL, header value)
    Config,
    /// Response body did not match the expected shape
    Payload,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected response payload: {0}")]
    Payload(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Payload(_) => ApiErrorCategory::Payload,
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::Authentication => SyncError::Auth(message),
            ApiErrorCategory::Network => SyncError::Network(message),
            ApiErrorCategory::Payload => SyncError::InvalidInput(message),
            ApiErrorCategory::Config => SyncError::Config(message),
        }
    }
}
