//! Application constants
//!
//! Defaults for the reconciliation engine. Every value here can be overridden
//! through [`crate::ReconcileConfig`].

// Engine shape
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_RECORD_RETRIES: u32 = 3;

// Circuit breaker: trips once the count goes past this value
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 20;

// Persistence backoff (attempt-indexed, doubled each attempt)
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
pub const MAX_BACKOFF_SHIFT: u32 = 16;

// External API
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const TOKEN_GRANT_TYPE: &str = "password";
pub const TOKEN_EXPIRED_MARKER: &str = "expired";
pub const INSTALLMENTS_PATH: &str = "/payments/installments";

// Storage
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_SALES_TABLE: &str = "bd_vendas_rede";
