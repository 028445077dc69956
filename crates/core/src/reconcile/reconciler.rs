//! Reconciliation orchestrator
//!
//! Loads the candidate set, obtains the first token, and runs the batches on
//! a fixed pool of workers. Each worker takes one batch, runs it to
//! completion, then takes the next. Failures are reported, never requeued
//! within the run.
//!
//! When the circuit breaker trips, in-flight workers are aborted and the run
//! ends with [`RunOutcome::RestartRequested`]; the [`super::Supervisor`]
//! decides how to start over.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use installsync_domain::{Batch, FailureSet, ReconcileConfig, Result, SyncError};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::batch::{BatchOutcome, BatchRunner};
use super::fetcher::InstallmentFetcher;
use super::processor::RecordProcessor;
use super::state::{ConsecutiveErrorCounter, RestartSignal, SharedToken};
use crate::ports::{InstallmentApi, SaleRepository, TokenProvider};

/// Engine shape for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub batch_size: usize,
    pub workers: usize,
    pub record_retries: u32,
    pub max_consecutive_errors: u32,
    pub backoff_base: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for ReconcilerSettings {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            workers: config.workers,
            record_retries: config.record_retries,
            max_consecutive_errors: config.max_consecutive_errors,
            backoff_base: config.backoff_base(),
        }
    }
}

/// Totals of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub batches: usize,
    /// Records committed, aborted batches included
    pub reconciled: usize,
    pub failed: FailureSet,
    /// Indexes of batches stopped by a fatal persistence error
    pub aborted_batches: Vec<usize>,
}

impl RunSummary {
    fn record(&mut self, report: BatchReport) {
        let BatchReport { index, outcome } = report;
        self.reconciled += outcome.committed;

        if !outcome.failed.is_empty() {
            warn!(batch = index, failed = outcome.failed.len(), "Records failed in batch");
            self.failed.extend(outcome.failed);
        }

        match outcome.aborted {
            Some(err) => {
                error!(
                    batch = index,
                    committed = outcome.committed,
                    error = %err,
                    "Batch aborted"
                );
                self.aborted_batches.push(index);
            }
            None => debug!(batch = index, "Batch completed"),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    RestartRequested,
}

struct BatchReport {
    index: usize,
    outcome: BatchOutcome,
}

/// Reconciliation orchestrator.
pub struct Reconciler {
    repository: Arc<dyn SaleRepository>,
    api: Arc<dyn InstallmentApi>,
    tokens: Arc<dyn TokenProvider>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        repository: Arc<dyn SaleRepository>,
        api: Arc<dyn InstallmentApi>,
        tokens: Arc<dyn TokenProvider>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self { repository, api, tokens, settings }
    }

    /// Run one full reconciliation pass.
    ///
    /// # Errors
    /// Fails when the candidate query fails or no initial token can be
    /// obtained. Record and batch failures are reported in the summary.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunOutcome> {
        let records = self.repository.find_pending().await?;
        if records.is_empty() {
            info!("No records to update");
            return Ok(RunOutcome::Completed(RunSummary::default()));
        }
        info!(candidates = records.len(), "Loaded records without installments");

        let token = match self.tokens.acquire().await {
            Ok(token) if !token.is_empty() => token,
            Ok(_) => {
                error!("Token endpoint returned an empty access token");
                return Err(SyncError::Auth("empty access token".into()));
            }
            Err(err) => {
                error!(error = %err, "Could not obtain initial access token");
                return Err(err);
            }
        };

        let restart = RestartSignal::new();
        let runner = Arc::new(self.build_runner(SharedToken::new(token), restart.clone()));

        let candidates = records.len();
        let batches = Batch::partition(records, self.settings.batch_size);
        let mut summary =
            RunSummary { candidates, batches: batches.len(), ..RunSummary::default() };

        let worker_count = self.settings.workers.clamp(1, batches.len());
        let queue = Arc::new(Mutex::new(VecDeque::from(batches)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for worker_id in 0..worker_count {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&runner),
                tx.clone(),
                restart.clone(),
            ));
        }
        drop(tx);

        loop {
            tokio::select! {
                biased;
                () = restart.requested() => {
                    warn!("Circuit breaker tripped, abandoning in-flight batches");
                    workers.abort_all();
                    return Ok(RunOutcome::RestartRequested);
                }
                report = rx.recv() => match report {
                    Some(report) => summary.record(report),
                    None => break,
                },
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Worker task failed");
            }
        }

        if restart.is_requested() {
            warn!("Circuit breaker tripped on the final batch");
            return Ok(RunOutcome::RestartRequested);
        }

        info!(
            candidates = summary.candidates,
            reconciled = summary.reconciled,
            failed = summary.failed.len(),
            aborted_batches = summary.aborted_batches.len(),
            "Reconciliation finished"
        );
        Ok(RunOutcome::Completed(summary))
    }

    fn build_runner(&self, token: SharedToken, restart: RestartSignal) -> BatchRunner {
        let errors = Arc::new(ConsecutiveErrorCounter::new(self.settings.max_consecutive_errors));
        let fetcher = Arc::new(InstallmentFetcher::new(
            Arc::clone(&self.api),
            Arc::clone(&self.tokens),
            token,
            errors,
            restart,
        ));
        let processor = Arc::new(RecordProcessor::new(
            fetcher,
            Arc::clone(&self.repository),
            self.settings.record_retries,
            self.settings.backoff_base,
        ));
        BatchRunner::new(processor)
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<Batch>>>,
    runner: Arc<BatchRunner>,
    reports: mpsc::UnboundedSender<BatchReport>,
    restart: RestartSignal,
) {
    while !restart.is_requested() {
        let Some(batch) = next_batch(&queue) else {
            break;
        };

        let outcome = runner.run_batch(&batch).await;
        let report = BatchReport { index: batch.index, outcome };
        if reports.send(report).is_err() {
            break;
        }
    }
    debug!(worker_id, "Worker finished");
}

fn next_batch(queue: &Mutex<VecDeque<Batch>>) -> Option<Batch> {
    queue.lock().pop_front()
}
