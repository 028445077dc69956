//! PostgreSQL implementation of [`SaleRepository`]
//!
//! Every call opens its own connection. Updates run in a short transaction
//! that commits a single statement, so a conflict never leaves a partial
//! write behind.

use async_trait::async_trait;
use chrono::NaiveDate;
use installsync_core::SaleRepository;
use installsync_domain::{DatabaseConfig, InstallmentQuantity, Result, SaleRecord, SyncError};
use regex::Regex;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$";

/// SQL text for one sales table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleStatements {
    pub select_pending: String,
    pub update_installments: String,
}

impl SaleStatements {
    /// Build the statements for `table` (optionally `schema.table`).
    ///
    /// # Errors
    /// Returns `SyncError::Config` when `table` is not a plain identifier.
    pub fn for_table(table: &str) -> Result<Self> {
        let pattern = Regex::new(IDENTIFIER_PATTERN)
            .map_err(|e| SyncError::Internal(format!("identifier pattern: {e}")))?;
        if !pattern.is_match(table) {
            return Err(SyncError::Config(format!("invalid table name: {table:?}")));
        }

        Ok(Self {
            select_pending: format!(
                "SELECT sale_date, nsu, merchant_id FROM {table} \
                 WHERE installments IS NULL ORDER BY sale_date, nsu"
            ),
            update_installments: format!(
                "UPDATE {table} SET installments = $1 \
                 WHERE sale_date = $2 AND nsu = $3 AND merchant_id = $4 \
                 AND installments IS NULL"
            ),
        })
    }
}

/// Sales table accessed through `tokio-postgres`.
pub struct PgSaleRepository {
    connection_string: String,
    statements: SaleStatements,
}

impl PgSaleRepository {
    /// # Errors
    /// Returns `SyncError::Config` for an invalid table name.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self {
            connection_string: config.connection_string(),
            statements: SaleStatements::for_table(&config.table)?,
        })
    }

    async fn connect(&self) -> Result<Client> {
        let (client, connection) =
            tokio_postgres::connect(&self.connection_string, NoTls).await.map_err(db_error)?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                warn!(error = %err, "Database connection closed with error");
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl SaleRepository for PgSaleRepository {
    #[instrument(skip(self))]
    async fn find_pending(&self) -> Result<Vec<SaleRecord>> {
        let client = self.connect().await?;
        let rows = client.query(&self.statements.select_pending, &[]).await.map_err(db_error)?;
        debug!(rows = rows.len(), "Loaded pending sales");
        rows.iter().map(map_sale_row).collect()
    }

    #[instrument(skip(self), fields(nsu = %record.nsu, installments = %quantity))]
    async fn update_installments(
        &self,
        record: &SaleRecord,
        quantity: InstallmentQuantity,
    ) -> Result<u64> {
        let mut client = self.connect().await?;
        let tx = client.transaction().await.map_err(db_error)?;

        let updated = tx
            .execute(
                &self.statements.update_installments,
                &[&quantity.as_sql_int(), &record.sale_date, &record.nsu, &record.merchant_id],
            )
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(updated)
    }
}

fn map_sale_row(row: &Row) -> Result<SaleRecord> {
    let sale_date: NaiveDate = row.try_get(0).map_err(db_error)?;
    let nsu: String = row.try_get(1).map_err(db_error)?;
    let merchant_id: String = row.try_get(2).map_err(db_error)?;
    Ok(SaleRecord { sale_date, nsu, merchant_id })
}

fn db_error(err: tokio_postgres::Error) -> SyncError {
    InfraError::from(err).into()
}
