//! # Installsync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - PostgreSQL sale repository (`tokio-postgres`)
//! - Token endpoint and installment lookup clients (`reqwest`)
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Implements traits defined in `installsync-core`
//! - Contains all "impure" code (network and database I/O)

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{ApiError, ApiErrorCategory, InstallmentClient, PasswordGrantClient};
pub use database::{PgSaleRepository, SaleStatements};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
