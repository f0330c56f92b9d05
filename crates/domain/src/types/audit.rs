//! Audit events emitted by lifecycle operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::integration::IntegrationId;
use crate::impl_wire_name_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Connected,
    Disconnected,
    SettingsUpdated,
    HealthChanged,
}

impl_wire_name_conversions!(AuditAction {
    Connected => "connected",
    Disconnected => "disconnected",
    SettingsUpdated => "settings_updated",
    HealthChanged => "health_changed",
});

/// Append-only record of a lifecycle change.
///
/// `details` carries keys and flags only, never credential values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub tenant_id: String,
    pub integration_id: IntegrationId,
    pub action: AuditAction,
    pub details: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        tenant_id: impl Into<String>,
        integration_id: IntegrationId,
        action: AuditAction,
        details: Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: tenant_id.into(),
            integration_id,
            action,
            details,
            occurred_at: Utc::now(),
        }
    }
}
