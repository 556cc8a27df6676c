//! SQLite-backed token store.
//!
//! Implements the append-only `TokenStore` port: a refresh inserts a new
//! row and the current token is always the one with the highest id. Rows
//! are never updated or deleted, which keeps the store race-tolerant: two
//! concurrent refreshes insert two rows and only the later one is ever
//! read again.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use simobridge_core::TokenStore;
use simobridge_domain::{NewToken, Result, SimoBridgeError, StoredToken};
use tokio::task;
use tracing::debug;

use super::pool::DbPool;

/// SQLite-backed append-only token store.
pub struct SqliteTokenStore {
    pool: Arc<DbPool>,
}

impl SqliteTokenStore {
    /// Create a new store on top of the shared connection pool.
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// The most recently inserted token (highest id), if any.
    pub async fn latest_token(&self) -> Result<Option<StoredToken>> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || pool.with_connection(query_latest_token))
            .await
            .map_err(map_join_error)?
    }

    /// Append a freshly issued token and return the persisted row.
    pub async fn insert_token(&self, token: &NewToken) -> Result<StoredToken> {
        let pool = Arc::clone(&self.pool);
        let token = token.clone();

        let stored = task::spawn_blocking(move || {
            pool.with_connection(|conn| append_token(conn, &token))
        })
        .await
        .map_err(map_join_error)??;

        debug!(token_id = stored.id, expires_in = stored.expires_in, "token persisted");
        Ok(stored)
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn latest_token(&self) -> Result<Option<StoredToken>> {
        Self::latest_token(self).await
    }

    async fn insert_token(&self, token: &NewToken) -> Result<StoredToken> {
        Self::insert_token(self, token).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_latest_token(conn: &Connection) -> rusqlite::Result<Option<StoredToken>> {
    conn.query_row(
        "SELECT id, access_token, token_type, expires_in, created_at, refresh_token \
         FROM api_tokens WHERE id = (SELECT MAX(id) FROM api_tokens)",
        [],
        token_from_row,
    )
    .optional()
}

fn append_token(conn: &Connection, token: &NewToken) -> rusqlite::Result<StoredToken> {
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO api_tokens (access_token, token_type, expires_in, created_at, refresh_token) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            token.access_token,
            token.token_type,
            token.expires_in,
            created_at.to_rfc3339(),
            token.refresh_token
        ],
    )?;

    Ok(StoredToken {
        id: conn.last_insert_rowid(),
        access_token: token.access_token.clone(),
        token_type: token.token_type.clone(),
        expires_in: token.expires_in,
        created_at,
        refresh_token: token.refresh_token.clone(),
    })
}

fn token_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredToken> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(StoredToken {
        id: row.get(0)?,
        access_token: row.get(1)?,
        token_type: row.get(2)?,
        expires_in: row.get(3)?,
        created_at,
        refresh_token: row.get(5)?,
    })
}

fn map_join_error(err: task::JoinError) -> SimoBridgeError {
    SimoBridgeError::Internal(format!("blocking task failed: {err}"))
}
