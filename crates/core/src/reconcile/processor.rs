//! Per-record reconcile loop with deadlock-aware persistence

use std::sync::Arc;
use std::time::Duration;

use installsync_domain::constants::MAX_BACKOFF_SHIFT;
use installsync_domain::{Result, SaleRecord};
use tracing::{error, info, warn};

use super::fetcher::{FetchOutcome, InstallmentFetcher};
use crate::ports::SaleRepository;

/// Looks up one record and writes the result back.
pub struct RecordProcessor {
    fetcher: Arc<InstallmentFetcher>,
    repository: Arc<dyn SaleRepository>,
    retries: u32,
    base_backoff: Duration,
}

impl RecordProcessor {
    pub fn new(
        fetcher: Arc<InstallmentFetcher>,
        repository: Arc<dyn SaleRepository>,
        retries: u32,
        base_backoff: Duration,
    ) -> Self {
        Self { fetcher, repository, retries: retries.max(1), base_backoff }
    }

    /// Reconcile `record`, trying up to `retries` times.
    ///
    /// Returns `Ok(true)` once a known value is committed and `Ok(false)` when
    /// every attempt ended without one. An unknown lookup moves straight to the
    /// next attempt; a persistence conflict waits `base * 2^attempt` first.
    ///
    /// # Errors
    /// Any persistence error other than a conflict is returned immediately.
    pub async fn process(&self, record: &SaleRecord) -> Result<bool> {
        for attempt in 0..self.retries {
            let quantity = match self.fetcher.fetch_current(record).await {
                FetchOutcome::Known(quantity) => quantity,
                FetchOutcome::Unknown(reason) => {
                    warn!(
                        nsu = %record.nsu,
                        attempt = attempt + 1,
                        retries = self.retries,
                        reason = %reason,
                        "Could not obtain installments"
                    );
                    continue;
                }
            };

            match self.repository.update_installments(record, quantity).await {
                Ok(0) => {
                    info!(nsu = %record.nsu, "Installments already set, row left unchanged");
                    return Ok(true);
                }
                Ok(rows) => {
                    info!(
                        nsu = %record.nsu,
                        installments = %quantity,
                        rows,
                        "Updated installments"
                    );
                    return Ok(true);
                }
                Err(err) if err.is_retryable_conflict() => {
                    warn!(
                        nsu = %record.nsu,
                        attempt = attempt + 1,
                        retries = self.retries,
                        error = %err,
                        "Deadlock detected, retrying"
                    );
                    if attempt + 1 < self.retries {
                        self.sleep_with_backoff(attempt).await;
                    }
                }
                Err(err) => {
                    error!(nsu = %record.nsu, error = %err, "Persisting installments failed");
                    return Err(err);
                }
            }
        }

        warn!(nsu = %record.nsu, retries = self.retries, "Giving up on record");
        Ok(false)
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1u32 << attempt.min(MAX_BACKOFF_SHIFT);
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, attempt: u32) {
        let delay = self.backoff_delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
