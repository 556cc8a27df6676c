//! SQLite-backed API configuration store.
//!
//! Implements the `ApiConfigStore` port for the credential row and the
//! endpoint-name → URL table. All database operations run in
//! `spawn_blocking` to avoid blocking the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use simobridge_core::ApiConfigStore;
use simobridge_domain::{ApiCredentials, Result, SimoBridgeError};
use tokio::task;

use super::pool::DbPool;

/// SQLite-backed configuration store.
pub struct SqliteApiConfigStore {
    pool: Arc<DbPool>,
}

impl SqliteApiConfigStore {
    /// Create a new store on top of the shared connection pool.
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// The single active credential row (id = 1).
    pub async fn credentials(&self) -> Result<ApiCredentials> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || pool.with_connection(query_credentials))
            .await
            .map_err(map_join_error)?
            .and_then(|creds| {
                creds.ok_or_else(|| {
                    SimoBridgeError::NotFound("no API credentials configured".into())
                })
            })
    }

    /// URL for a logical endpoint name, or `None` when not configured.
    pub async fn endpoint_url(&self, endpoint_name: &str) -> Result<Option<String>> {
        let pool = Arc::clone(&self.pool);
        let endpoint_name = endpoint_name.to_string();

        task::spawn_blocking(move || {
            pool.with_connection(|conn| query_endpoint_url(conn, &endpoint_name))
        })
        .await
        .map_err(map_join_error)?
    }

    /// Replace the active credential row.
    pub async fn save_credentials(&self, credentials: ApiCredentials) -> Result<()> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            pool.with_connection(|conn| replace_credentials(conn, &credentials))
        })
        .await
        .map_err(map_join_error)?
    }

    /// Insert or update the URL for a logical endpoint name.
    pub async fn set_endpoint(&self, endpoint_name: &str, url: &str) -> Result<()> {
        let pool = Arc::clone(&self.pool);
        let endpoint_name = endpoint_name.to_string();
        let url = url.to_string();

        task::spawn_blocking(move || {
            pool.with_connection(|conn| upsert_endpoint(conn, &endpoint_name, &url))
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ApiConfigStore for SqliteApiConfigStore {
    async fn credentials(&self) -> Result<ApiCredentials> {
        Self::credentials(self).await
    }

    async fn endpoint_url(&self, endpoint_name: &str) -> Result<Option<String>> {
        Self::endpoint_url(self, endpoint_name).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_credentials(conn: &Connection) -> rusqlite::Result<Option<ApiCredentials>> {
    conn.query_row(
        "SELECT username, password, consumer_key, consumer_secret FROM api_id WHERE id = 1",
        [],
        |row| {
            Ok(ApiCredentials {
                username: row.get(0)?,
                password: row.get(1)?,
                consumer_key: row.get(2)?,
                consumer_secret: row.get(3)?,
            })
        },
    )
    .optional()
}

fn query_endpoint_url(conn: &Connection, endpoint_name: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT url FROM api_endpoint WHERE endpoint_name = ?1",
        params![endpoint_name],
        |row| row.get(0),
    )
    .optional()
}

fn replace_credentials(conn: &Connection, credentials: &ApiCredentials) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM api_id WHERE id = 1", [])?;
    conn.execute(
        "INSERT INTO api_id (id, username, password, consumer_key, consumer_secret) \
         VALUES (1, ?1, ?2, ?3, ?4)",
        params![
            credentials.username,
            credentials.password,
            credentials.consumer_key,
            credentials.consumer_secret
        ],
    )?;
    Ok(())
}

fn upsert_endpoint(conn: &Connection, endpoint_name: &str, url: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO api_endpoint (endpoint_name, url) VALUES (?1, ?2)",
        params![endpoint_name, url],
    )?;
    Ok(())
}

fn map_join_error(err: task::JoinError) -> SimoBridgeError {
    SimoBridgeError::Internal(format!("blocking task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::database::pool::PoolConfig;
    use crate::database::schema::init_schema;

    fn test_store() -> (TempDir, SqliteApiConfigStore) {
        let temp_dir = TempDir::new().unwrap();
        let pool = Arc::new(
            DbPool::new(temp_dir.path().join("config.db"), PoolConfig::default()).unwrap(),
        );
        init_schema(&pool).unwrap();
        (temp_dir, SqliteApiConfigStore::new(pool))
    }

    fn test_credentials() -> ApiCredentials {
        ApiCredentials {
            username: "reporter".to_string(),
            password: "secret".to_string(),
            consumer_key: "key".to_string(),
            consumer_secret: "key-secret".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_credentials_report_not_found() {
        let (_guard, store) = test_store();

        let result = store.credentials().await;
        assert!(matches!(result, Err(SimoBridgeError::NotFound(_))));
    }

    #[tokio::test]
    async fn saves_and_reads_credentials() {
        let (_guard, store) = test_store();

        store.save_credentials(test_credentials()).await.unwrap();
        let creds = store.credentials().await.unwrap();
        assert_eq!(creds.username, "reporter");
        assert_eq!(creds.consumer_secret, "key-secret");

        // Saving again replaces the single active row.
        let mut updated = test_credentials();
        updated.username = "reporter2".to_string();
        store.save_credentials(updated).await.unwrap();

        let creds = store.credentials().await.unwrap();
        assert_eq!(creds.username, "reporter2");
    }

    #[tokio::test]
    async fn endpoint_upsert_and_lookup() {
        let (_guard, store) = test_store();

        assert_eq!(store.endpoint_url("simo_001").await.unwrap(), None);

        store.set_endpoint("simo_001", "https://reports.example/simo-001").await.unwrap();
        assert_eq!(
            store.endpoint_url("simo_001").await.unwrap().as_deref(),
            Some("https://reports.example/simo-001")
        );

        store.set_endpoint("simo_001", "https://reports.example/v2/simo-001").await.unwrap();
        assert_eq!(
            store.endpoint_url("simo_001").await.unwrap().as_deref(),
            Some("https://reports.example/v2/simo-001")
        );
    }
}
