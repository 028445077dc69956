//! Token endpoint client
//!
//! Exchanges the configured username/password for an access token using the
//! resource-owner password grant. The pre-shared `Authorization` value is
//! sent verbatim; it is not a bearer token.

use async_trait::async_trait;
use installsync_core::TokenProvider;
use installsync_domain::constants::TOKEN_GRANT_TYPE;
use installsync_domain::{AccessToken, ApiConfig, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use tracing::{info, instrument, warn};

use super::errors::ApiError;
use crate::http::HttpClient;

/// Password-grant token client.
pub struct PasswordGrantClient {
    http: HttpClient,
    token_url: String,
    username: String,
    password: String,
    authorization_header: String,
}

impl PasswordGrantClient {
    pub fn new(http: HttpClient, config: &ApiConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            authorization_header: config.authorization_header.clone(),
        }
    }

    #[instrument(skip(self), fields(url = %self.token_url))]
    async fn request_token(&self) -> Result<AccessToken> {
        let form = [
            ("grant_type", TOKEN_GRANT_TYPE),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let request = self
            .http
            .request(Method::POST, &self.token_url)
            .header(AUTHORIZATION, &self.authorization_header)
            .form(&form);

        let response = self.http.send(request).await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token request rejected");
            return Err(ApiError::Auth(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            ))
            .into());
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| ApiError::Payload(format!("invalid token response: {e}")))?;

        info!("Access token obtained");
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for PasswordGrantClient {
    async fn acquire(&self) -> Result<AccessToken> {
        self.request_token().await
    }
}
