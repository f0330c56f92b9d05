//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tenantlink_domain::{NetworkError, StoreError, TenantLinkError};
use tokio::task::JoinError;

/// Label used when an infrastructure failure is not tied to one integration.
const INFRA_SCOPE: &str = "infrastructure";

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TenantLinkError);

impl From<InfraError> for TenantLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TenantLinkError> for InfraError {
    fn from(value: TenantLinkError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Conversion into the store error carried by the config-store port.
pub(crate) trait IntoStoreError {
    fn into_store_error(self) -> StoreError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → StoreError */
/* -------------------------------------------------------------------------- */

impl IntoStoreError for SqlError {
    fn into_store_error(self) -> StoreError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => StoreError::backend("database is busy"),
                    (ErrorCode::DatabaseLocked, _) => StoreError::backend("database is locked"),
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        StoreError::backend("unique constraint violation")
                    }
                    (ErrorCode::CannotOpen, _) => {
                        StoreError::backend(format!("unable to open database: {message}"))
                    }
                    _ => StoreError::backend(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => StoreError::backend("no rows returned by query"),
            RE::FromSqlConversionFailure(_, _, cause) => {
                StoreError::Serialization { message: format!("failed to convert sqlite value: {cause}") }
            }
            RE::InvalidColumnType(_, name, ty) => {
                StoreError::backend(format!("invalid column type for '{name}': {ty}"))
            }
            RE::InvalidPath(path) => {
                StoreError::backend(format!("invalid database path: {}", path.to_string_lossy()))
            }
            other => StoreError::backend(other),
        }
    }
}

impl IntoStoreError for PoolError {
    fn into_store_error(self) -> StoreError {
        StoreError::backend(format!("connection pool: {self}"))
    }
}

impl IntoStoreError for serde_json::Error {
    fn into_store_error(self) -> StoreError {
        StoreError::Serialization { message: self.to_string() }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(TenantLinkError::store(INFRA_SCOPE, value.into_store_error()))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TenantLinkError */
/* -------------------------------------------------------------------------- */

/// Short, credential-free description of a transport failure.
pub(crate) fn describe_http_error(err: &HttpError) -> String {
    if err.is_timeout() {
        return "HTTP request timed out".into();
    }
    if err.is_connect() {
        return "HTTP connection failure".into();
    }
    if let Some(status) = err.status() {
        return format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status")
        );
    }
    if err.is_builder() {
        return format!("invalid HTTP request: {err}");
    }
    err.to_string()
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let message = describe_http_error(&value);
        InfraError(TenantLinkError::Network(NetworkError::Remote {
            integration: INFRA_SCOPE.to_string(),
            status: value.status().map(|status| status.as_u16()),
            message,
        }))
    }
}

/* -------------------------------------------------------------------------- */
/* JoinError → StoreError */
/* -------------------------------------------------------------------------- */

/// Map JoinError from spawn_blocking to a store failure.
pub(crate) fn map_join_error(err: JoinError) -> StoreError {
    if err.is_cancelled() {
        StoreError::backend("blocking task cancelled")
    } else {
        StoreError::backend(format!("blocking task failed: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
