//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use simobridge_domain::SimoBridgeError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SimoBridgeError);

impl From<InfraError> for SimoBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SimoBridgeError> for InfraError {
    fn from(value: SimoBridgeError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SimoBridgeError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain = match value {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        SimoBridgeError::Database("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        SimoBridgeError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => {
                        SimoBridgeError::Database(format!("constraint violation: {message}"))
                    }
                    _ => SimoBridgeError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                SimoBridgeError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                SimoBridgeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SimoBridgeError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidQuery => SimoBridgeError::Database("invalid SQL query".into()),
            other => SimoBridgeError::Database(other.to_string()),
        };

        InfraError(domain)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SimoBridgeError */
/* -------------------------------------------------------------------------- */

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(SimoBridgeError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SimoBridgeError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let domain = if value.is_timeout() {
            SimoBridgeError::Network(format!("http request timed out: {value}"))
        } else if value.is_connect() {
            SimoBridgeError::Network(format!("http connection failed: {value}"))
        } else if value.is_builder() {
            SimoBridgeError::Internal(format!("failed to build http request: {value}"))
        } else {
            SimoBridgeError::Network(format!("http error: {value}"))
        };

        InfraError(domain)
    }
}
