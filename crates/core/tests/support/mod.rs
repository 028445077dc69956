//! Shared test helpers for `installsync-core` integration tests.
//!
//! Lightweight mocks for every port so engine tests can focus on behaviour
//! instead of boilerplate.

#![allow(dead_code)]

pub mod api;
pub mod repositories;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use installsync_core::{
    ConsecutiveErrorCounter, InstallmentFetcher, ReconcilerSettings, RestartSignal, SharedToken,
};
use installsync_domain::{AccessToken, SaleRecord};

pub use api::{expired, failed, ok, CountingTokenProvider, ScriptedApi};
pub use repositories::InMemorySaleRepository;

pub fn sale(day: u32, nsu: &str, merchant_id: &str) -> SaleRecord {
    SaleRecord::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), nsu, merchant_id)
}

/// A run of records on 2024-01-01 for merchant `M1`: `NSU0`, `NSU1`, ...
pub fn sales(count: usize) -> Vec<SaleRecord> {
    (0..count).map(|i| sale(1, &format!("NSU{i:02}"), "M1")).collect()
}

/// Fast settings: default shape, millisecond backoff.
pub fn fast_settings() -> ReconcilerSettings {
    ReconcilerSettings { backoff_base: Duration::from_millis(1), ..ReconcilerSettings::default() }
}

/// Fetcher wired to the given mocks plus the handles a test wants to inspect.
pub struct FetcherHarness {
    pub fetcher: Arc<InstallmentFetcher>,
    pub token: SharedToken,
    pub errors: Arc<ConsecutiveErrorCounter>,
    pub restart: RestartSignal,
}

pub fn fetcher(
    api: &ScriptedApi,
    tokens: &CountingTokenProvider,
    threshold: u32,
) -> FetcherHarness {
    let token = SharedToken::new(AccessToken::new("initial", "initial-refresh"));
    let errors = Arc::new(ConsecutiveErrorCounter::new(threshold));
    let restart = RestartSignal::new();
    let fetcher = Arc::new(InstallmentFetcher::new(
        Arc::new(api.clone()),
        Arc::new(tokens.clone()),
        token.clone(),
        Arc::clone(&errors),
        restart.clone(),
    ));
    FetcherHarness { fetcher, token, errors, restart }
}
