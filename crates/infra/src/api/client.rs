//! Installment lookup client
//!
//! One GET per sale against `{base}/payments/installments/{merchant_id}`,
//! translated into a raw [`LookupResponse`]. Interpretation of the response
//! (refresh, counting, defaults) belongs to the engine.

use async_trait::async_trait;
use installsync_core::InstallmentApi;
use installsync_domain::constants::INSTALLMENTS_PATH;
use installsync_domain::{
    AccessToken, ApiConfig, InstallmentQuantity, LookupResponse, Result, SaleRecord,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::errors::ApiError;
use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct InstallmentsEnvelope {
    content: Option<InstallmentsContent>,
}

#[derive(Debug, Deserialize)]
struct InstallmentsContent {
    #[serde(default)]
    installments: Vec<InstallmentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallmentEntry {
    installment_quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP implementation of [`InstallmentApi`].
pub struct InstallmentClient {
    http: HttpClient,
    base_url: Url,
}

impl InstallmentClient {
    /// # Errors
    /// Returns `SyncError::Config` when `base_url` is not an absolute URL.
    pub fn new(http: HttpClient, config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid API base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(
                ApiError::Config(format!("API base URL cannot be a base: {base_url}")).into()
            );
        }
        Ok(Self { http, base_url })
    }

    /// Lookup URL for one merchant; the merchant id is percent-encoded as a
    /// single path segment.
    pub fn lookup_url(&self, merchant_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(INSTALLMENTS_PATH.split('/').filter(|s| !s.is_empty()));
            segments.push(merchant_id);
        }
        url
    }

    /// `None` for any payload without a usable quantity, including one too
    /// large for the installments column.
    fn parse_quantity(body: &str) -> Option<InstallmentQuantity> {
        let envelope: InstallmentsEnvelope = serde_json::from_str(body).ok()?;
        envelope
            .content?
            .installments
            .first()?
            .installment_quantity
            .and_then(|quantity| InstallmentQuantity::try_from(quantity).ok())
    }

    fn parse_message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body).map(|b| b.message).unwrap_or_default()
    }
}

#[async_trait]
impl InstallmentApi for InstallmentClient {
    #[instrument(skip(self, token), fields(nsu = %record.nsu, merchant_id = %record.merchant_id))]
    async fn lookup(&self, token: &AccessToken, record: &SaleRecord) -> Result<LookupResponse> {
        let sale_date = record.sale_date_param();
        let request = self
            .http
            .request(Method::GET, self.lookup_url(&record.merchant_id))
            .header(AUTHORIZATION, token.bearer())
            .header(CONTENT_TYPE, "application/json")
            .query(&[("saleDate", sale_date.as_str()), ("nsu", record.nsu.as_str())]);

        let response = self.http.send(request).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Installment lookup answered");

        if status == StatusCode::NO_CONTENT {
            return Ok(LookupResponse::NoContent);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read lookup response: {e}")))?;

        Ok(match status {
            StatusCode::OK => LookupResponse::Ok(Self::parse_quantity(&body)),
            StatusCode::UNAUTHORIZED => {
                LookupResponse::Unauthorized { message: Self::parse_message(&body) }
            }
            other => LookupResponse::Failed { status: other.as_u16(), body },
        })
    }
}
