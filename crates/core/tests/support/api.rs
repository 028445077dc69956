//! Scripted mocks for `InstallmentApi` and `TokenProvider`

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use installsync_core::{InstallmentApi, TokenProvider};
use installsync_domain::{
    AccessToken, InstallmentQuantity, LookupResponse, Result as DomainResult, SaleRecord, SyncError,
};
use parking_lot::Mutex;

pub fn ok(quantity: u16) -> LookupResponse {
    LookupResponse::Ok(Some(InstallmentQuantity::new(quantity)))
}

pub fn failed(status: u16) -> LookupResponse {
    LookupResponse::Failed { status, body: String::new() }
}

pub fn expired() -> LookupResponse {
    LookupResponse::Unauthorized { message: "Access token expired".into() }
}

#[derive(Default)]
struct ApiState {
    scripted: HashMap<String, VecDeque<DomainResult<LookupResponse>>>,
    fallback: Option<LookupResponse>,
    calls: Vec<(String, String)>,
}

/// Answers lookups from a per-NSU queue, then from a fallback response.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    state: Arc<Mutex<ApiState>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, nsu: &str, responses: Vec<LookupResponse>) -> Self {
        self.state
            .lock()
            .scripted
            .entry(nsu.to_string())
            .or_default()
            .extend(responses.into_iter().map(Ok));
        self
    }

    pub fn transport_error(self, nsu: &str) -> Self {
        self.state
            .lock()
            .scripted
            .entry(nsu.to_string())
            .or_default()
            .push_back(Err(SyncError::Network("connection refused".into())));
        self
    }

    pub fn fallback(self, response: LookupResponse) -> Self {
        self.state.lock().fallback = Some(response);
        self
    }

    /// `(nsu, access_token)` for every lookup, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }
}

#[async_trait]
impl InstallmentApi for ScriptedApi {
    async fn lookup(
        &self,
        token: &AccessToken,
        record: &SaleRecord,
    ) -> DomainResult<LookupResponse> {
        let mut state = self.state.lock();
        state.calls.push((record.nsu.clone(), token.access_token.clone()));

        if let Some(next) = state.scripted.get_mut(&record.nsu).and_then(VecDeque::pop_front) {
            return next;
        }
        Ok(state.fallback.clone().unwrap_or(LookupResponse::NoContent))
    }
}

/// Hands out `token-1`, `token-2`, ... unless scripted to fail.
#[derive(Clone, Default)]
pub struct CountingTokenProvider {
    calls: Arc<AtomicUsize>,
    failures: Arc<Mutex<VecDeque<SyncError>>>,
}

impl CountingTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_next(self, errors: Vec<SyncError>) -> Self {
        self.failures.lock().extend(errors);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn acquire(&self) -> DomainResult<AccessToken> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        Ok(AccessToken::new(format!("token-{call}"), format!("refresh-{call}")))
    }
}
