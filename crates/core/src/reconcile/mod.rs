//! Batch reconciliation engine
//!
//! Dependency order, leaves first:
//! [`InstallmentFetcher`] → [`RecordProcessor`] → [`BatchRunner`] →
//! [`Reconciler`] → [`Supervisor`].

pub mod batch;
pub mod fetcher;
pub mod processor;
pub mod reconciler;
pub mod state;
pub mod supervisor;

pub use batch::{BatchOutcome, BatchRunner};
pub use fetcher::{FetchOutcome, InstallmentFetcher, UnknownReason};
pub use processor::RecordProcessor;
pub use reconciler::{Reconciler, ReconcilerSettings, RunOutcome, RunSummary};
pub use state::{ConsecutiveErrorCounter, RestartSignal, SharedToken};
pub use supervisor::{Supervisor, SupervisorConfig, SupervisorExit};
