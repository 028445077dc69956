//! # Installsync Core
//!
//! Pure reconciliation logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the token endpoint, the lookup API and storage
//! - The batch reconciliation engine and its restart supervisor
//!
//! ## Architecture Principles
//! - Only depends on `installsync-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod ports;
pub mod reconcile;

pub use ports::{InstallmentApi, SaleRepository, TokenProvider};
pub use reconcile::{
    BatchOutcome, BatchRunner, ConsecutiveErrorCounter, FetchOutcome, InstallmentFetcher,
    Reconciler, ReconcilerSettings, RecordProcessor, RestartSignal, RunOutcome, RunSummary,
    SharedToken, Supervisor, SupervisorConfig, SupervisorExit, UnknownReason,
};
