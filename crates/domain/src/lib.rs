//! # Installsync Domain
//!
//! Business domain types for installment reconciliation.
//!
//! This crate contains:
//! - Sale records, batches and installment quantities
//! - Access tokens and raw lookup responses
//! - Domain error types and Result definitions
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other installsync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
