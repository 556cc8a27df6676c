//! Submission dispatch
//!
//! Composes the submission request for a record type — bearer token,
//! request id and reporting period headers — issues the HTTP call and
//! classifies the outcome. Each batch is a single best-effort call: it
//! either fully succeeds or fails as a whole.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Method;
use serde_json::Value;
use simobridge_core::ApiConfigStore;
use simobridge_domain::{RecordType, Result, SimoBridgeError, TargetRecord};
use tracing::{info, warn};

use crate::http::HttpClient;

/// Provides bearer tokens to authorize reporting API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Dispatches converted record batches to the reporting API.
pub struct RequestDispatcher {
    config: Arc<dyn ApiConfigStore>,
    tokens: Arc<dyn AccessTokenProvider>,
    http: HttpClient,
}

impl RequestDispatcher {
    pub fn new(
        config: Arc<dyn ApiConfigStore>,
        tokens: Arc<dyn AccessTokenProvider>,
        http: HttpClient,
    ) -> Self {
        Self { config, tokens, http }
    }

    /// Submit a converted batch for `record_type`.
    ///
    /// # Errors
    /// - `EndpointNotConfigured` when no URL is stored for the record type
    /// - `RemoteRejection` when the API answers 200 with an `error` field
    /// - `Http{status, message}` for any non-200 answer
    /// - token acquisition errors from the token provider
    pub async fn submit(
        &self,
        record_type: RecordType,
        payload: &[TargetRecord],
    ) -> Result<Value> {
        let token = self.tokens.access_token().await?;

        let endpoint_name = record_type.endpoint_name();
        let url = self
            .config
            .endpoint_url(endpoint_name)
            .await?
            .ok_or_else(|| SimoBridgeError::EndpointNotConfigured(endpoint_name.to_string()))?;

        let now = Local::now();
        let ma_yeu_cau = request_id(record_type, now);
        let ky_bao_cao = reporting_period(now);

        info!(
            %record_type,
            %url,
            request_id = %ma_yeu_cau,
            period = %ky_bao_cao,
            records = payload.len(),
            "submitting batch"
        );

        let request = self
            .http
            .request(Method::POST, &url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .header("maYeuCau", ma_yeu_cau)
            .header("kyBaoCao", ky_bao_cao)
            .json(payload);

        let response = self.http.send(request).await?;
        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();

        if status != 200 {
            let message = match status {
                401 => "token is invalid or has expired".to_string(),
                400 => format!("payload rejected as malformed: {body_text}"),
                504 => "reporting API did not respond (upstream timeout)".to_string(),
                _ => body_text,
            };
            warn!(status, %record_type, "submission failed");
            return Err(SimoBridgeError::Http { status, message });
        }

        let body: Value = serde_json::from_str(&body_text).map_err(|e| {
            SimoBridgeError::Internal(format!("failed to parse submission response: {e}"))
        })?;

        if let Some(error) = body.get("error") {
            let message = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warn!(%record_type, %message, "submission rejected by reporting API");
            return Err(SimoBridgeError::RemoteRejection(message));
        }

        info!(%record_type, "submission accepted");
        Ok(body)
    }
}

/// Request id header value: `{endpoint_name}_{ddMMyyyy.HHmmss}`.
pub fn request_id(record_type: RecordType, now: DateTime<Local>) -> String {
    format!("{}_{}", record_type.endpoint_name(), now.format("%d%m%Y.%H%M%S"))
}

/// Reporting period header value: `MM/yyyy` of the current month.
pub fn reporting_period(now: DateTime<Local>) -> String {
    now.format("%m/%Y").to_string()
}
