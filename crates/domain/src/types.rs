//! Common data types used throughout the application

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SimoBridgeError};

/// The six SIMO record types accepted by the reporting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Simo001,
    Simo002,
    Simo003,
    Simo004,
    Simo011,
    Simo012,
}

impl RecordType {
    /// All record types, in reporting order.
    pub const ALL: [RecordType; 6] = [
        RecordType::Simo001,
        RecordType::Simo002,
        RecordType::Simo003,
        RecordType::Simo004,
        RecordType::Simo011,
        RecordType::Simo012,
    ];

    /// Logical endpoint name, also the key in the endpoint configuration
    /// table (`simo_001` .. `simo_012`).
    pub const fn endpoint_name(self) -> &'static str {
        match self {
            Self::Simo001 => "simo_001",
            Self::Simo002 => "simo_002",
            Self::Simo003 => "simo_003",
            Self::Simo004 => "simo_004",
            Self::Simo011 => "simo_011",
            Self::Simo012 => "simo_012",
        }
    }

    /// Parse a record type from its wire name (`simo_001`) or bare code
    /// (`001`).
    ///
    /// # Errors
    /// Returns `SimoBridgeError::UnsupportedRecordType` for any other value.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "simo_001" | "001" => Ok(Self::Simo001),
            "simo_002" | "002" => Ok(Self::Simo002),
            "simo_003" | "003" => Ok(Self::Simo003),
            "simo_004" | "004" => Ok(Self::Simo004),
            "simo_011" | "011" => Ok(Self::Simo011),
            "simo_012" | "012" => Ok(Self::Simo012),
            other => Err(SimoBridgeError::UnsupportedRecordType(other.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint_name())
    }
}

/// A loosely-typed scalar as produced by the spreadsheet/database row layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Text(String),
    Number(f64),
    /// Native date/time cell value.
    DateTime(NaiveDateTime),
    Null,
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for SourceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for SourceValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<NaiveDateTime> for SourceValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// One source row: field name to loosely-typed scalar. Immutable once handed
/// to the mapper.
pub type SourceRow = HashMap<String, SourceValue>;

/// One converted record, ready for JSON submission. Only fields that
/// survived coercion are present.
pub type TargetRecord = serde_json::Map<String, serde_json::Value>;

/// API credentials for the token exchange (single active row, id = 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub username: String,
    pub password: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// A bearer token as persisted in the append-only token table.
///
/// The "current" token is always the row with the highest id; rows are
/// never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub id: i64,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub created_at: DateTime<Utc>,
    pub refresh_token: Option<String>,
}

impl StoredToken {
    /// Seconds until expiry at `now` (negative when already expired).
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.created_at.timestamp() + self.expires_in - now.timestamp()
    }

    /// Whether the token has expired at `now`. Expiry is purely time-based;
    /// there is no explicit invalidation path.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) <= 0
    }
}

/// A freshly issued token, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Database / connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_pool_seed")]
    pub pool_seed: u32,
    #[serde(default = "default_borrow_timeout")]
    pub borrow_timeout_secs: u64,
}

/// Outbound HTTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// TLS verification for the reporting API. Disabled by default: the
    /// destination uses an internally-issued certificate (operational trust
    /// decision, kept as configuration).
    #[serde(default)]
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_http_timeout(), verify_tls: false }
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_pool_seed() -> u32 {
    3
}

fn default_borrow_timeout() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    30
}
