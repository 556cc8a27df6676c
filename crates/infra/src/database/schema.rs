//! Configuration store schema
//!
//! The schema of the three configuration tables is owned by this crate:
//! `api_id` (single credential row), `api_endpoint` (one row per logical
//! endpoint name) and the append-only `api_tokens`.

use rusqlite::Connection;
use simobridge_domain::Result;

use crate::database::pool::DbPool;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS api_id (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    password TEXT NOT NULL,
    consumer_key TEXT NOT NULL,
    consumer_secret TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS api_endpoint (
    id INTEGER PRIMARY KEY,
    endpoint_name TEXT UNIQUE NOT NULL,
    url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS api_tokens (
    id INTEGER PRIMARY KEY,
    access_token TEXT NOT NULL,
    token_type TEXT NOT NULL,
    expires_in INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    refresh_token TEXT
);
";

/// Create the configuration tables when they do not exist yet.
pub fn init_schema(pool: &DbPool) -> Result<()> {
    pool.with_connection(apply_schema)
}

fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
