//! Error types used throughout the application
//!
//! The taxonomy separates failures the caller can fix (validation) from
//! failures of the config store and of the remote test endpoint, so that a
//! caller can tell "bad credentials" from "service unavailable" from "test
//! timed out". Audit failures have their own type but never leave the
//! lifecycle manager.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TenantLink
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum TenantLinkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error for {integration}: {source}")]
    Store { integration: String, source: StoreError },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TenantLinkError {
    /// Wrap a store failure with the integration the operation targeted.
    pub fn store(integration: impl Into<String>, source: StoreError) -> Self {
        Self::Store { integration: integration.into(), source }
    }

    /// Stable label suitable for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Store { source: StoreError::ConflictRetriesExhausted { .. }, .. } => {
                "store_conflict"
            }
            Self::Store { .. } => "store",
            Self::Network(NetworkError::Timeout { .. }) => "network_timeout",
            Self::Network(NetworkError::Cancelled { .. }) => "network_cancelled",
            Self::Network(NetworkError::Remote { .. }) => "network_remote",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Input rejected before any store access.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("unknown integration '{id}'")]
    UnknownIntegration { id: String },

    #[error("{integration}: required credential '{field}' is missing or empty")]
    MissingCredential { integration: String, field: String },

    #[error("{integration}: credential '{field}' is not declared by this integration")]
    UnknownCredential { integration: String, field: String },

    #[error("{integration}: setting '{key}' is not declared by this integration")]
    UnknownSetting { integration: String, key: String },

    #[error("{integration}: setting '{key}' must be {expected}")]
    InvalidSetting { integration: String, key: String, expected: String },

    #[error("tenant '{tenant_id}' has no internal record id")]
    MissingTenantRecord { tenant_id: String },
}

/// Failure reading or writing the tenant configuration document.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreError {
    #[error("tenant '{tenant_id}' has no configuration record")]
    NotFound { tenant_id: String },

    #[error("version conflict for tenant '{tenant_id}': expected {expected}, found {actual}")]
    Conflict { tenant_id: String, expected: u64, actual: u64 },

    #[error("tenant '{tenant_id}' kept changing underneath {attempts} write attempts")]
    ConflictRetriesExhausted { tenant_id: String, attempts: u32 },

    #[error("document could not be (de)serialized: {message}")]
    Serialization { message: String },

    #[error("{message}")]
    Backend { message: String },
}

impl StoreError {
    /// Build a backend failure from any displayable error.
    pub fn backend(message: impl ToString) -> Self {
        Self::Backend { message: message.to_string() }
    }

    /// Whether re-reading and re-applying the patch may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Failure talking to an integration's external test endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkError {
    #[error("{integration}: test endpoint did not answer within {timeout_ms} ms")]
    Timeout { integration: String, timeout_ms: u64 },

    #[error("{integration}: test endpoint failed ({}): {message}", describe_status(.status))]
    Remote { integration: String, status: Option<u16>, message: String },

    #[error("{integration}: connection test cancelled")]
    Cancelled { integration: String },
}

fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "unreachable".to_string(), |code| format!("HTTP {code}"))
}

/// Failure handing an event to the audit trail.
///
/// Never surfaced to users; callers log it and move on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit queue is full")]
    QueueFull,

    #[error("audit queue is closed")]
    Closed,
}

/// Result type alias for TenantLink operations
pub type Result<T> = std::result::Result<T, TenantLinkError>;
