//! Database implementations

pub mod config_store;
pub mod pool;
pub mod schema;
pub mod token_store;

pub use config_store::SqliteApiConfigStore;
pub use pool::{DbConnection, DbPool, PoolConfig};
pub use schema::init_schema;
pub use token_store::SqliteTokenStore;
