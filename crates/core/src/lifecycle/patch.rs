//! Document patches applied by lifecycle operations
//!
//! Each patch receives one integration's definition and touches only that
//! integration's entries in the document. They are re-applied verbatim to a
//! freshly read document whenever a versioned write loses a race, so they
//! must be deterministic in their inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tenantlink_domain::{
    HealthRecord, HealthStatus, IntegrationDefinition, IntegrationId, SettingsMap,
    TenantIntegrationConfig,
};

pub(crate) fn connect(
    config: &mut TenantIntegrationConfig,
    definition: &IntegrationDefinition,
    credentials: &BTreeMap<String, String>,
    settings: Option<&SettingsMap>,
    now: DateTime<Utc>,
) {
    let id = definition.id;

    let stored = config.credential_fields.entry(id).or_default();
    for (key, value) in credentials {
        stored.insert(key.clone(), Some(value.clone()));
    }

    config.connection_flags.insert(definition.flag_key.to_string(), true);

    if let Some(settings) = settings {
        merge_settings(config, id, settings);
    }

    config.integration_health.insert(id, Some(HealthRecord::new(HealthStatus::Healthy, now)));
    config.connected_at.insert(id, Some(now));
}

/// Null out the integration's state. Keys stay in place.
pub(crate) fn disconnect(config: &mut TenantIntegrationConfig, definition: &IntegrationDefinition) {
    let id = definition.id;

    config.connection_flags.insert(definition.flag_key.to_string(), false);

    let stored = config.credential_fields.entry(id).or_default();
    for field in definition.credential_fields {
        stored.insert(field.key.to_string(), None);
    }
    // Keys written by older catalog versions are cleared too.
    for value in stored.values_mut() {
        *value = None;
    }

    config.integration_health.insert(id, None);
    config.connected_at.insert(id, None);
}

/// Two-level merge: find or create the inner map, then shallow-merge.
pub(crate) fn merge_settings(
    config: &mut TenantIntegrationConfig,
    id: IntegrationId,
    partial: &SettingsMap,
) {
    let inner = config.integration_settings.entry(id).or_default();
    for (key, value) in partial {
        inner.insert(key.clone(), value.clone());
    }
}

/// Store a health observation for a connected integration.
///
/// Returns `None` (and leaves the document alone) when the integration is not
/// connected, otherwise the previously recorded status.
pub(crate) fn record_health(
    config: &mut TenantIntegrationConfig,
    definition: &IntegrationDefinition,
    status: HealthStatus,
    now: DateTime<Utc>,
) -> Option<Option<HealthStatus>> {
    if !config.flag(definition.flag_key) {
        return None;
    }

    let previous = config.health(definition.id).map(|record| record.status);
    config.integration_health.insert(definition.id, Some(HealthRecord::new(status, now)));
    Some(previous)
}

/// Stamp `last_sync_at` for a connected integration.
pub(crate) fn record_sync(
    config: &mut TenantIntegrationConfig,
    definition: &IntegrationDefinition,
    now: DateTime<Utc>,
) -> bool {
    if !config.flag(definition.flag_key) {
        return false;
    }
    config.last_sync_at.insert(definition.id, Some(now));
    true
}
