//! Token lifecycle management
//!
//! Decides whether to reuse or refresh the stored bearer token and performs
//! the Basic-Auth password-grant exchange against the configured token
//! endpoint. Token rows are append-only; expiry is purely time-based and
//! there is no explicit invalidation path.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use simobridge_core::{ApiConfigStore, TokenStore};
use simobridge_domain::{NewToken, Result, SimoBridgeError, StoredToken};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::dispatcher::AccessTokenProvider;
use crate::http::HttpClient;

/// Logical endpoint name of the token exchange.
const TOKEN_ENDPOINT: &str = "token";

/// Wire shape of a successful token exchange response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Manages the bearer token used to authorize submission calls.
///
/// Per call the manager is in one of three states: no token stored yet,
/// stored token still valid, or stored token expired. Only the first and
/// last trigger a network exchange.
pub struct TokenManager {
    tokens: Arc<dyn TokenStore>,
    config: Arc<dyn ApiConfigStore>,
    http: HttpClient,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        config: Arc<dyn ApiConfigStore>,
        http: HttpClient,
    ) -> Self {
        Self { tokens, config, http, refresh_lock: Mutex::new(()) }
    }

    /// A currently valid access token, refreshing first when needed.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.current_valid_token().await? {
            return Ok(token.access_token);
        }

        let refreshed = self.refresh().await?;
        Ok(refreshed.access_token)
    }

    /// Fetch a new token from the auth endpoint and persist it.
    ///
    /// Refresh is single-flight: concurrent callers that all observed an
    /// expired token collapse into one exchange, and late arrivals reuse
    /// the row the winner inserted.
    pub async fn refresh(&self) -> Result<StoredToken> {
        let _guard = self.refresh_lock.lock().await;

        // Re-check under the lock: another caller may have refreshed while
        // we were waiting.
        if let Some(token) = self.current_valid_token().await? {
            return Ok(token);
        }

        self.exchange().await
    }

    async fn current_valid_token(&self) -> Result<Option<StoredToken>> {
        match self.tokens.latest_token().await? {
            None => {
                debug!("no token stored yet");
                Ok(None)
            }
            Some(token) => {
                let remaining = token.remaining_seconds(Utc::now());
                if remaining > 0 {
                    debug!(remaining, "reusing stored token");
                    Ok(Some(token))
                } else {
                    info!(expired_for = -remaining, "stored token expired");
                    Ok(None)
                }
            }
        }
    }

    async fn exchange(&self) -> Result<StoredToken> {
        let credentials = self.config.credentials().await?;
        let token_url = self
            .config
            .endpoint_url(TOKEN_ENDPOINT)
            .await?
            .ok_or_else(|| SimoBridgeError::EndpointNotConfigured(TOKEN_ENDPOINT.to_string()))?;

        let basic = BASE64
            .encode(format!("{}:{}", credentials.consumer_key, credentials.consumer_secret));

        info!(%token_url, "requesting new access token");

        let request = self
            .http
            .request(Method::POST, &token_url)
            .header("Authorization", format!("Basic {basic}"))
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ]);

        let response = self.http.send(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if status != 200 {
            let message = match status {
                401 => "invalid API credentials".to_string(),
                404 => "token endpoint URL is wrong".to_string(),
                _ => body,
            };
            warn!(status, "token exchange failed");
            return Err(SimoBridgeError::TokenAcquisition { status, body: message });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            SimoBridgeError::TokenAcquisition {
                status,
                body: format!("response did not contain an access_token: {body}"),
            }
        })?;

        let stored = self
            .tokens
            .insert_token(&NewToken {
                access_token: parsed.access_token,
                token_type: parsed.token_type,
                expires_in: parsed.expires_in,
                refresh_token: parsed.refresh_token,
            })
            .await?;

        info!(token_id = stored.id, expires_in = stored.expires_in, "access token refreshed");
        Ok(stored)
    }
}

/// Allow `TokenManager` (and `Arc<TokenManager>`) to be used anywhere an
/// `AccessTokenProvider` is required.
#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String> {
        Self::access_token(self).await
    }
}
