//! Port interfaces for the connection lifecycle
//!
//! These traits define the boundaries between the lifecycle manager and the
//! infrastructure that persists tenant documents, records audit events and
//! calls integration test endpoints.

use std::time::Duration;

use async_trait::async_trait;
use tenantlink_domain::{
    AuditError, AuditEvent, StoreError, TenantIntegrationConfig, VersionedConfig,
};

/// Per-tenant document store with optimistic concurrency.
///
/// Writes replace the whole document. An adapter must reject a write whose
/// `expected_version` no longer matches the stored version with
/// [`StoreError::Conflict`]; otherwise concurrent mutations of different
/// integrations of one tenant can silently overwrite each other.
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    /// Read the tenant's document and the version it is at.
    async fn read(&self, tenant_id: &str) -> Result<VersionedConfig, StoreError>;

    /// Replace the tenant's document if it is still at `expected_version`.
    ///
    /// Returns the new version.
    async fn write(
        &self,
        tenant_id: &str,
        config: &TenantIntegrationConfig,
        expected_version: u64,
    ) -> Result<u64, StoreError>;
}

/// Append-only, best-effort audit trail.
///
/// Implementations must not block: enqueue and return. Errors are reported so
/// the caller can log them, never so it can fail the operation.
pub trait AuditLogger: Send + Sync {
    /// Hand `event` to the trail without waiting for it to be persisted.
    fn append(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Raw answer from a test endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status returned by the endpoint
    pub status_code: u16,
    /// Reason phrase, when the status has one
    pub reason: Option<String>,
}

impl ProbeResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Transport-level failure of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No answer within the allotted time
    TimedOut,
    /// Connection could not be made or broke off; carries a short,
    /// credential-free description
    Unreachable(String),
}

/// Issues `POST` requests to integration test endpoints.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    /// Send one request to `url`, giving up after `timeout`.
    ///
    /// Any HTTP status is an `Ok`; classification into success or failure
    /// happens in the lifecycle manager.
    async fn post(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, ProbeFailure>;
}
