//! Installsync - installment-count reconciliation for card sales
//!
//! Main entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use installsync_app::{logging, relaunch, AppContext};
use installsync_core::SupervisorExit;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before logging so LOG_FORMAT and RUST_LOG can live there
    let dotenv = dotenvy::dotenv();
    logging::init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => warn!(error = %e, "Could not load .env file"),
    }

    match run().await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Reconciliation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let config = installsync_infra::config::load().context("loading configuration")?;
    info!(
        table = %config.database.table,
        batch_size = config.reconcile.batch_size,
        workers = config.reconcile.workers,
        restart_mode = ?config.reconcile.restart_mode,
        "Starting installment reconciliation"
    );

    let ctx = Arc::new(AppContext::new(&config).context("wiring adapters")?);

    match ctx.supervisor().run().await? {
        SupervisorExit::Completed { summary, restarts } => {
            info!(
                candidates = summary.candidates,
                reconciled = summary.reconciled,
                failed = summary.failed.len(),
                aborted_batches = summary.aborted_batches.len(),
                restarts,
                "Process complete"
            );
            Ok(ExitCode::SUCCESS)
        }
        SupervisorExit::ReExecRequested => {
            let child = relaunch::spawn_self()?;
            info!(pid = child.id(), "Started replacement process");
            Ok(ExitCode::SUCCESS)
        }
        SupervisorExit::RestartLimitReached { restarts } => {
            error!(restarts, "Gave up after repeated circuit-breaker trips");
            Ok(ExitCode::FAILURE)
        }
    }
}
