//! Process-wide mutable state shared by every worker of one engine run
//!
//! - [`SharedToken`]: the single authoritative bearer token
//! - [`ConsecutiveErrorCounter`]: circuit-breaker counter
//! - [`RestartSignal`]: raised when the breaker trips
//!
//! A worker may still be using a stale token copy while another one replaces
//! it; the stale request just takes the 401 path again.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use installsync_domain::AccessToken;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Current access token, replaced in place on expiry.
#[derive(Clone)]
pub struct SharedToken {
    inner: Arc<RwLock<AccessToken>>,
}

impl SharedToken {
    pub fn new(token: AccessToken) -> Self {
        Self { inner: Arc::new(RwLock::new(token)) }
    }

    /// Snapshot of the current token.
    pub fn current(&self) -> AccessToken {
        self.inner.read().clone()
    }

    pub fn replace(&self, token: AccessToken) {
        *self.inner.write() = token;
    }
}

/// Consecutive non-success lookup responses.
#[derive(Debug)]
pub struct ConsecutiveErrorCounter {
    count: AtomicU32,
    threshold: u32,
}

impl ConsecutiveErrorCounter {
    pub fn new(threshold: u32) -> Self {
        Self { count: AtomicU32::new(0), threshold }
    }

    /// Count one failure. Returns `true` once the count exceeds the threshold.
    pub fn record_failure(&self) -> bool {
        let count = self.count.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        count > self.threshold
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// One-shot restart request observed by the reconciler.
#[derive(Clone, Default)]
pub struct RestartSignal {
    token: CancellationToken,
}

impl RestartSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`request`](Self::request) has been called.
    pub async fn requested(&self) {
        self.token.cancelled().await;
    }
}
