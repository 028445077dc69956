//! Installment lookup with transparent re-authentication
//!
//! Applies the reconciliation rules to a raw [`LookupResponse`]:
//!
//! | response | outcome | counter |
//! |---|---|---|
//! | 200 with quantity | known | reset |
//! | 200 without quantity | unknown | reset |
//! | 204 | known zero | reset |
//! | 401 "expired" | refresh, retry once | untouched |
//! | other 401 | unknown | untouched |
//! | anything else | unknown | +1, may trip |
//!
//! The fetcher never writes to storage.

use std::fmt;
use std::sync::Arc;

use installsync_domain::{AccessToken, InstallmentQuantity, LookupResponse, SaleRecord};
use tracing::{debug, error, info, instrument, warn};

use super::state::{ConsecutiveErrorCounter, RestartSignal, SharedToken};
use crate::ports::{InstallmentApi, TokenProvider};

/// Result of one lookup after the rules have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Known(InstallmentQuantity),
    Unknown(UnknownReason),
}

/// Why a lookup produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    /// 200 without `content.installments[0].installmentQuantity`
    MalformedPayload,
    /// 401 for a reason other than expiry
    Unauthorized(String),
    /// Token expired and a new one could not be obtained
    RefreshFailed(String),
    /// Retry after a successful refresh did not return 200/204
    RetryRejected(String),
    /// Non-success status
    Status(u16),
    /// No HTTP response at all
    Transport(String),
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload => write!(f, "response without installment quantity"),
            Self::Unauthorized(message) => write!(f, "unauthorized: {message}"),
            Self::RefreshFailed(message) => write!(f, "token refresh failed: {message}"),
            Self::RetryRejected(message) => write!(f, "retry after refresh rejected: {message}"),
            Self::Status(status) => write!(f, "API returned status {status}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

/// Per-record installment lookup shared by all workers.
pub struct InstallmentFetcher {
    api: Arc<dyn InstallmentApi>,
    tokens: Arc<dyn TokenProvider>,
    shared_token: SharedToken,
    errors: Arc<ConsecutiveErrorCounter>,
    restart: RestartSignal,
}

impl InstallmentFetcher {
    pub fn new(
        api: Arc<dyn InstallmentApi>,
        tokens: Arc<dyn TokenProvider>,
        shared_token: SharedToken,
        errors: Arc<ConsecutiveErrorCounter>,
        restart: RestartSignal,
    ) -> Self {
        Self { api, tokens, shared_token, errors, restart }
    }

    /// Look up `record` with whatever token is current right now.
    pub async fn fetch_current(&self, record: &SaleRecord) -> FetchOutcome {
        let token = self.shared_token.current();
        self.fetch(&token, record).await
    }

    /// Look up `record` with the given token.
    #[instrument(skip(self, token), fields(nsu = %record.nsu, merchant_id = %record.merchant_id))]
    pub async fn fetch(&self, token: &AccessToken, record: &SaleRecord) -> FetchOutcome {
        let response = match self.api.lookup(token, record).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Installment lookup transport failure");
                return self.count_failure(UnknownReason::Transport(err.to_string()));
            }
        };

        let expired = response.is_expired_token();
        match response {
            LookupResponse::Ok(payload) => {
                self.errors.reset();
                Self::from_payload(payload)
            }
            LookupResponse::NoContent => {
                self.errors.reset();
                debug!("No installment data, defaulting to zero");
                FetchOutcome::Known(InstallmentQuantity::ZERO)
            }
            LookupResponse::Unauthorized { .. } if expired => self.refresh_and_retry(record).await,
            LookupResponse::Unauthorized { message } => {
                warn!(message = %message, "Lookup unauthorized");
                FetchOutcome::Unknown(UnknownReason::Unauthorized(message))
            }
            LookupResponse::Failed { status, body } => {
                warn!(status, body = %body, "Installment lookup failed");
                self.count_failure(UnknownReason::Status(status))
            }
        }
    }

    async fn refresh_and_retry(&self, record: &SaleRecord) -> FetchOutcome {
        info!("Access token expired, requesting a new one");

        let fresh = match self.tokens.acquire().await {
            Ok(token) if !token.is_empty() => token,
            Ok(_) => {
                warn!("Token endpoint returned an empty access token");
                return FetchOutcome::Unknown(UnknownReason::RefreshFailed(
                    "empty access token".into(),
                ));
            }
            Err(err) => {
                warn!(error = %err, "Failed to renew access token");
                return FetchOutcome::Unknown(UnknownReason::RefreshFailed(err.to_string()));
            }
        };

        self.shared_token.replace(fresh.clone());

        match self.api.lookup(&fresh, record).await {
            Ok(LookupResponse::Ok(payload)) => {
                self.errors.reset();
                Self::from_payload(payload)
            }
            Ok(LookupResponse::NoContent) => {
                self.errors.reset();
                FetchOutcome::Known(InstallmentQuantity::ZERO)
            }
            Ok(other) => {
                warn!(response = ?other, "Lookup still failing after token refresh");
                FetchOutcome::Unknown(UnknownReason::RetryRejected(format!("{other:?}")))
            }
            Err(err) => {
                warn!(error = %err, "Lookup retry after token refresh failed");
                FetchOutcome::Unknown(UnknownReason::RetryRejected(err.to_string()))
            }
        }
    }

    fn from_payload(payload: Option<InstallmentQuantity>) -> FetchOutcome {
        payload.map_or(FetchOutcome::Unknown(UnknownReason::MalformedPayload), FetchOutcome::Known)
    }

    fn count_failure(&self, reason: UnknownReason) -> FetchOutcome {
        if self.errors.record_failure() && !self.restart.is_requested() {
            error!(
                consecutive_errors = self.errors.count(),
                threshold = self.errors.threshold(),
                "Too many consecutive API errors, requesting restart"
            );
            self.restart.request();
        }
        FetchOutcome::Unknown(reason)
    }
}
