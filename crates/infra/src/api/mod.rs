//! Payment-processor API adapters
//!
//! - [`PasswordGrantClient`]: token endpoint ([`installsync_core::TokenProvider`])
//! - [`InstallmentClient`]: installment lookup ([`installsync_core::InstallmentApi`])

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::PasswordGrantClient;
pub use client::InstallmentClient;
pub use errors::{ApiError, ApiErrorCategory};
