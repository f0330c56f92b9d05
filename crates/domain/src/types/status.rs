//! Derived connection status and lifecycle results

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::integration::{IntegrationDefinition, IntegrationId};
use super::tenant_config::{HealthRecord, HealthStatus};
use crate::impl_wire_name_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl_wire_name_conversions!(ConnectionStatus {
    Connected => "connected",
    Disconnected => "disconnected",
});

/// Per-integration lifecycle state.
///
/// `Disconnected` is initial; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Connected, but the last health record says unhealthy
    Degraded,
}

/// Status of one integration as derived from a tenant document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStatus {
    /// The id as requested; may name an integration the catalog lacks
    pub integration_id: String,
    pub status: ConnectionStatus,
    pub health: Option<HealthRecord>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl ResolvedStatus {
    pub fn disconnected(integration_id: impl Into<String>) -> Self {
        Self {
            integration_id: integration_id.into(),
            status: ConnectionStatus::Disconnected,
            health: None,
            connected_at: None,
            last_sync_at: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn state(&self) -> ConnectionState {
        match (self.status, self.health.map(|record| record.status)) {
            (ConnectionStatus::Disconnected, _) => ConnectionState::Disconnected,
            (ConnectionStatus::Connected, Some(HealthStatus::Unhealthy)) => {
                ConnectionState::Degraded
            }
            (ConnectionStatus::Connected, _) => ConnectionState::Connected,
        }
    }
}

/// Successful answer from an integration's test endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub integration_id: IntegrationId,
    pub status_code: u16,
    pub latency_ms: u64,
}

/// One catalog entry as seen by a specific tenant.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationSummary {
    pub definition: &'static IntegrationDefinition,
    pub status: ResolvedStatus,
    /// `None` until the tenant has an internal record id
    pub webhook_url: Option<String>,
}
