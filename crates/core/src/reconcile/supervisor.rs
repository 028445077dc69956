//! Restart supervisor
//!
//! Owns recovery from circuit-breaker trips. Each round builds a brand-new
//! [`Reconciler`] through the factory, so tokens, counters and signals never
//! leak from one round into the next.

use std::time::Duration;

use installsync_domain::{ReconcileConfig, RestartMode, Result};
use tracing::{error, info, warn};

use super::reconciler::{Reconciler, RunOutcome, RunSummary};

/// Restart behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub mode: RestartMode,
    /// `None` restarts without limit
    pub max_restarts: Option<u32>,
    pub restart_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for SupervisorConfig {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            mode: config.restart_mode,
            max_restarts: config.max_restarts,
            restart_delay: config.restart_delay(),
        }
    }
}

/// Why the supervisor returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorExit {
    Completed { summary: RunSummary, restarts: u32 },
    /// The caller should launch a fresh copy of the process and exit.
    ReExecRequested,
    RestartLimitReached { restarts: u32 },
}

/// Drives reconciler rounds until one completes.
pub struct Supervisor<F>
where
    F: Fn() -> Result<Reconciler> + Send + Sync,
{
    factory: F,
    config: SupervisorConfig,
}

impl<F> Supervisor<F>
where
    F: Fn() -> Result<Reconciler> + Send + Sync,
{
    pub fn new(factory: F, config: SupervisorConfig) -> Self {
        Self { factory, config }
    }

    /// Run until a round completes, a re-exec is needed, or the restart limit
    /// is hit.
    ///
    /// # Errors
    /// Propagates factory errors and fatal reconciler errors (candidate query,
    /// initial authentication).
    pub async fn run(&self) -> Result<SupervisorExit> {
        let mut restarts = 0u32;

        loop {
            let engine = (self.factory)()?;

            match engine.run().await? {
                RunOutcome::Completed(summary) => {
                    info!(restarts, "Reconciliation completed");
                    return Ok(SupervisorExit::Completed { summary, restarts });
                }
                RunOutcome::RestartRequested => {
                    if self.config.mode == RestartMode::ReExec {
                        warn!("Restart requested, handing over to a new process");
                        return Ok(SupervisorExit::ReExecRequested);
                    }

                    if let Some(max) = self.config.max_restarts {
                        if restarts >= max {
                            error!(restarts, max, "Restart limit reached, giving up");
                            return Ok(SupervisorExit::RestartLimitReached { restarts });
                        }
                    }

                    restarts += 1;
                    warn!(restarts, "Restarting reconciliation from scratch");

                    if !self.config.restart_delay.is_zero() {
                        tokio::time::sleep(self.config.restart_delay).await;
                    }
                }
            }
        }
    }
}
