//! Port interfaces for the reconciliation engine
//!
//! Implemented by `installsync-infra` (HTTP + Postgres) and by in-memory
//! mocks in tests.

use async_trait::async_trait;
use installsync_domain::{AccessToken, InstallmentQuantity, LookupResponse, Result, SaleRecord};

/// Credential exchange against the token endpoint
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh access/refresh pair.
    ///
    /// An `Err` or an empty access token means no usable credential.
    async fn acquire(&self) -> Result<AccessToken>;
}

/// Raw per-sale installment lookup
#[async_trait]
pub trait InstallmentApi: Send + Sync {
    /// Query the processor for one sale using the supplied bearer token.
    ///
    /// Every HTTP answer maps to a [`LookupResponse`]; `Err` is reserved for
    /// transport failures where no status was received.
    async fn lookup(&self, token: &AccessToken, record: &SaleRecord) -> Result<LookupResponse>;
}

/// Storage of sale records
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// All records without an installment value, ordered by sale date then NSU.
    async fn find_pending(&self) -> Result<Vec<SaleRecord>>;

    /// Set the installment value of the row matching the record's natural key
    /// and commit.
    ///
    /// Returns the number of rows touched. Serialization and deadlock
    /// failures surface as `SyncError::DatabaseConflict`.
    async fn update_installments(
        &self,
        record: &SaleRecord,
        quantity: InstallmentQuantity,
    ) -> Result<u64>;
}
