//! SQLite connection pool
//!
//! r2d2-based pool of rusqlite connections with a liveness probe on borrow
//! and a graceful overflow fallback: when the idle queue stays empty past
//! the borrow timeout, the pool opens an ad-hoc connection outside its own
//! accounting instead of failing the caller. Under sustained contention the
//! nominal cap can therefore be exceeded; that is a deliberate trade-off,
//! logged each time it happens.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use simobridge_domain::{DatabaseConfig, Result, SimoBridgeError};
use tracing::{debug, info, warn};

use crate::errors::InfraError;

/// Pool sizing and borrow behavior.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Soft cap on pooled connections.
    pub max_size: u32,
    /// Connections opened eagerly at startup and kept idle.
    pub seed_count: u32,
    /// Bounded wait for a pooled connection before the overflow fallback.
    pub borrow_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_size: 10, seed_count: 3, borrow_timeout: Duration::from_secs(5) }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_size: config.pool_size,
            seed_count: config.pool_seed.min(config.pool_size),
            borrow_timeout: Duration::from_secs(config.borrow_timeout_secs),
        }
    }
}

/// A borrowed database connection.
///
/// `Pooled` connections return to the idle queue on drop (or are closed
/// when the queue is already at capacity); `Direct` connections live
/// outside the pool's accounting and close on drop.
pub enum DbConnection {
    Pooled(PooledConnection<SqliteConnectionManager>),
    Direct(Connection),
}

impl Deref for DbConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Self::Pooled(conn) => conn,
            Self::Direct(conn) => conn,
        }
    }
}

impl DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        match self {
            Self::Pooled(conn) => conn,
            Self::Direct(conn) => conn,
        }
    }
}

/// SQLite connection pool.
///
/// A connection is either checked out (owned by exactly one caller) or idle
/// in the pool, never both. Dropping the pool drains and closes every idle
/// connection.
pub struct DbPool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbPool {
    /// Create a pool for the database at `path`.
    ///
    /// Seed connections are opened eagerly; every borrow runs a trivial
    /// liveness probe, and connections failing the probe are discarded and
    /// replaced.
    ///
    /// # Errors
    /// Returns `SimoBridgeError::Database` when the database file cannot be
    /// opened.
    pub fn new<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), max_size = config.max_size, "creating connection pool");

        let manager = SqliteConnectionManager::file(&path);
        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.seed_count.min(config.max_size)))
            .connection_timeout(config.borrow_timeout)
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                warn!(error = %e, "failed to create connection pool");
                let infra: InfraError = e.into();
                SimoBridgeError::from(infra)
            })?;

        Ok(Self { pool, path })
    }

    /// Borrow a connection, waiting up to the borrow timeout.
    ///
    /// When the pool is exhausted past the timeout this opens an ad-hoc
    /// connection outside the pool instead of failing.
    pub fn get(&self) -> Result<DbConnection> {
        match self.pool.get() {
            Ok(conn) => Ok(DbConnection::Pooled(conn)),
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "pool exhausted past borrow timeout; opening ad-hoc connection"
                );
                let conn = Connection::open(&self.path).map_err(|e| {
                    let infra: InfraError = e.into();
                    SimoBridgeError::from(infra)
                })?;
                Ok(DbConnection::Direct(conn))
            }
        }
    }

    /// Run `f` on a borrowed connection.
    ///
    /// On error, any transaction the failed operation left open is rolled
    /// back before the connection is returned and the error re-raised, so
    /// connections are never leaked in a dirty state.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.get()?;
        match f(&conn) {
            Ok(value) => Ok(value),
            Err(err) => {
                if !conn.is_autocommit() {
                    if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                        debug!(error = %rollback_err, "rollback after failed operation also failed");
                    }
                }
                let infra: InfraError = err.into();
                Err(infra.into())
            }
        }
    }

    /// Current (open, idle) connection counts, for diagnostics.
    pub fn state(&self) -> (u32, u32) {
        let state = self.pool.state();
        (state.connections, state.idle_connections)
    }
}
