//! Port interfaces for token and API configuration storage
//!
//! Implemented by the SQLite-backed stores in `simobridge-infra`;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use simobridge_domain::{ApiCredentials, NewToken, Result, StoredToken};

/// Append-only persistence for issued bearer tokens.
///
/// The "current" token is the row with the highest id. Rows are never
/// updated in place; a refresh inserts a new row that supersedes the old
/// one.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The most recently inserted token, if any.
    async fn latest_token(&self) -> Result<Option<StoredToken>>;

    /// Persist a freshly issued token as a new row and return it with its
    /// assigned id and creation timestamp.
    async fn insert_token(&self, token: &NewToken) -> Result<StoredToken>;
}

/// Read access to API credentials and endpoint configuration.
#[async_trait]
pub trait ApiConfigStore: Send + Sync {
    /// The single active credential row.
    ///
    /// # Errors
    /// Returns `SimoBridgeError::NotFound` when no credentials are stored.
    async fn credentials(&self) -> Result<ApiCredentials>;

    /// URL for a logical endpoint name (`token`, `simo_001`, ...), or
    /// `None` when the endpoint is not configured.
    async fn endpoint_url(&self, endpoint_name: &str) -> Result<Option<String>>;
}
