//! Sequential processing of one batch

use std::sync::Arc;

use installsync_domain::{Batch, FailureSet, SyncError};
use tracing::debug;

use super::processor::RecordProcessor;

/// What happened to the records of one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records whose value was committed, including those before an abort
    pub committed: usize,
    pub failed: FailureSet,
    /// Fatal persistence error that stopped the batch
    pub aborted: Option<SyncError>,
}

/// Runs the records of a batch one after another.
pub struct BatchRunner {
    processor: Arc<RecordProcessor>,
}

impl BatchRunner {
    pub fn new(processor: Arc<RecordProcessor>) -> Self {
        Self { processor }
    }

    /// Process every record in order.
    ///
    /// A fatal persistence error stops the batch; the remaining records are
    /// not attempted and the error is kept in [`BatchOutcome::aborted`].
    pub async fn run_batch(&self, batch: &Batch) -> BatchOutcome {
        debug!(batch = batch.index, size = batch.len(), "Running batch");

        let mut outcome = BatchOutcome::default();
        for record in &batch.records {
            match self.processor.process(record).await {
                Ok(true) => outcome.committed += 1,
                Ok(false) => outcome.failed.push(record.clone()),
                Err(err) => {
                    outcome.aborted = Some(err);
                    break;
                }
            }
        }

        outcome
    }
}
