//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for SimoBridge
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SimoBridgeError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported SIMO record type: {0}")]
    UnsupportedRecordType(String),

    #[error("No endpoint configured for '{0}'")]
    EndpointNotConfigured(String),

    #[error("Token acquisition failed (HTTP {status}): {body}")]
    TokenAcquisition { status: u16, body: String },

    #[error("Submission rejected by reporting API: {0}")]
    RemoteRejection(String),

    #[error("API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SimoBridge operations
pub type Result<T> = std::result::Result<T, SimoBridgeError>;
