//! Restart handling of the `Supervisor`.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use installsync_core::{Reconciler, Supervisor, SupervisorConfig, SupervisorExit};
use installsync_domain::{InstallmentQuantity, RestartMode, SyncError};
use support::{
    failed, fast_settings, ok, sales, CountingTokenProvider, InMemorySaleRepository, ScriptedApi,
};

/// Builds reconcilers whose API fails for the first `failing_rounds` rounds.
fn factory(
    repo: &InMemorySaleRepository,
    failing_rounds: usize,
    rounds: Arc<AtomicUsize>,
) -> impl Fn() -> installsync_domain::Result<Reconciler> + Send + Sync {
    let repo = repo.clone();
    move || {
        let round = rounds.fetch_add(1, Ordering::SeqCst);
        let api = if round < failing_rounds {
            ScriptedApi::new().fallback(failed(500))
        } else {
            ScriptedApi::new().fallback(ok(2))
        };
        Ok(Reconciler::new(
            Arc::new(repo.clone()),
            Arc::new(api),
            Arc::new(CountingTokenProvider::new()),
            fast_settings(),
        ))
    }
}

fn config(mode: RestartMode, max_restarts: Option<u32>) -> SupervisorConfig {
    SupervisorConfig { mode, max_restarts, restart_delay: Duration::ZERO }
}

#[tokio::test]
async fn in_process_restart_builds_a_fresh_reconciler() {
    let records = sales(10);
    let repo = InMemorySaleRepository::with_pending(&records);
    let rounds = Arc::new(AtomicUsize::new(0));
    let supervisor = Supervisor::new(
        factory(&repo, 1, Arc::clone(&rounds)),
        config(RestartMode::InProcess, None),
    );

    let exit = supervisor.run().await.unwrap();

    match exit {
        SupervisorExit::Completed { summary, restarts } => {
            assert_eq!(restarts, 1);
            assert_eq!(summary.reconciled, 10);
        }
        other => panic!("unexpected exit {other:?}"),
    }
    assert_eq!(rounds.load(Ordering::SeqCst), 2);
    assert!(records.iter().all(|r| repo.stored(r) == Some(InstallmentQuantity::new(2))));
}

#[tokio::test]
async fn restart_limit_stops_the_loop() {
    let repo = InMemorySaleRepository::with_pending(&sales(10));
    let rounds = Arc::new(AtomicUsize::new(0));
    let supervisor = Supervisor::new(
        factory(&repo, usize::MAX, Arc::clone(&rounds)),
        config(RestartMode::InProcess, Some(2)),
    );

    let exit = supervisor.run().await.unwrap();

    assert_eq!(exit, SupervisorExit::RestartLimitReached { restarts: 2 });
    assert_eq!(rounds.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn re_exec_mode_hands_control_back_to_the_caller() {
    let repo = InMemorySaleRepository::with_pending(&sales(10));
    let rounds = Arc::new(AtomicUsize::new(0));
    let supervisor = Supervisor::new(
        factory(&repo, usize::MAX, Arc::clone(&rounds)),
        config(RestartMode::ReExec, None),
    );

    let exit = supervisor.run().await.unwrap();

    assert_eq!(exit, SupervisorExit::ReExecRequested);
    assert_eq!(rounds.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_delay_is_observed_between_rounds() {
    let repo = InMemorySaleRepository::with_pending(&sales(10));
    let rounds = Arc::new(AtomicUsize::new(0));
    let supervisor = Supervisor::new(
        factory(&repo, 1, Arc::clone(&rounds)),
        SupervisorConfig {
            mode: RestartMode::InProcess,
            max_restarts: None,
            restart_delay: Duration::from_secs(30),
        },
    );

    let started = tokio::time::Instant::now();
    let exit = supervisor.run().await.unwrap();

    assert!(matches!(exit, SupervisorExit::Completed { restarts: 1, .. }));
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test]
async fn factory_errors_are_propagated() {
    let supervisor = Supervisor::new(
        || Err(SyncError::Config("missing API_BASE_URL".into())),
        config(RestartMode::InProcess, None),
    );

    let err = supervisor.run().await.unwrap_err();

    assert!(matches!(err, SyncError::Config(_)));
}
