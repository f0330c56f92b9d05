//! Derives the connection status of one integration from a tenant document
//!
//! Pure and deterministic: no store or network access, so it is safe to call
//! on every render or poll. The connection flag is the only signal for
//! `connected`; health is reported verbatim and never defaulted.

use tenantlink_domain::{
    ConnectionStatus, IntegrationId, ResolvedStatus, TenantIntegrationConfig,
};

use crate::registry::IntegrationRegistry;

/// Resolve the status of `integration_id` within `config`.
///
/// Ids outside the catalog resolve to `disconnected` rather than failing.
pub fn resolve(config: &TenantIntegrationConfig, integration_id: &str) -> ResolvedStatus {
    match integration_id.parse::<IntegrationId>() {
        Ok(id) => resolve_id(config, id),
        Err(_) => ResolvedStatus::disconnected(integration_id),
    }
}

/// Resolve the status of a catalog integration.
pub fn resolve_id(config: &TenantIntegrationConfig, id: IntegrationId) -> ResolvedStatus {
    let flag_key = IntegrationRegistry::definition(id).flag_key;
    let status = if config.flag(flag_key) {
        ConnectionStatus::Connected
    } else {
        ConnectionStatus::Disconnected
    };

    ResolvedStatus {
        integration_id: id.to_string(),
        status,
        health: config.health(id).copied(),
        connected_at: config.connected_at(id),
        last_sync_at: config.last_sync_at(id),
    }
}
