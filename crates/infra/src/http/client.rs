//! Thin reqwest wrapper with the outbound defaults used by the token
//! exchange and submission calls: fixed timeout, optional TLS verification
//! (the reporting API sits behind an internally-issued certificate), no
//! proxy. Each call is a single best-effort request; there is no retry
//! layer.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use simobridge_domain::{HttpConfig, SimoBridgeError};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with fixed timeout and configurable TLS verification.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the application HTTP configuration.
    pub fn from_config(config: &HttpConfig) -> Result<Self, SimoBridgeError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .verify_tls(config.verify_tls)
            .build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SimoBridgeError> {
        let request = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            SimoBridgeError::from(infra)
        })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = response.status().as_u16(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                let infra: InfraError = err.into();
                Err(SimoBridgeError::from(infra))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    verify_tls: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None, verify_tls: false }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Enable or disable TLS certificate verification. Disabled by default;
    /// the destination's certificate chain is not publicly anchored.
    pub fn verify_tls(mut self, enabled: bool) -> Self {
        self.verify_tls = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, SimoBridgeError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if !self.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            SimoBridgeError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
