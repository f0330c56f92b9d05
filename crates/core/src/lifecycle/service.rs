//! Connection lifecycle service - core business logic
//!
//! Orchestrates connect / disconnect / settings updates / connection tests for
//! a tenant's integrations.
//!
//! # Write discipline
//!
//! Every mutation is validated against the registry before the store is
//! touched. It then reads the tenant document, applies a patch scoped to one
//! integration, and writes the whole document back guarded by the version it
//! read. When another writer got there first the store answers with a
//! conflict; the patch is re-applied to a fresh read, up to
//! `max_write_attempts` times. Store failures leave nothing applied.
//!
//! Successful writes are followed by a best-effort audit append. Callers
//! should refetch (see [`ConnectionLifecycleManager::fetch_config`]) rather
//! than patch local state: the document may have changed again by then.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tenantlink_domain::{
    AuditAction, AuditEvent, HealthStatus, IntegrationDefinition, IntegrationId,
    IntegrationSummary, NetworkError, ResolvedStatus, Result, SettingsMap, StoreError,
    TenantIntegrationConfig, TenantLinkConfig, TenantLinkError, TestReport, ValidationError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::patch;
use super::ports::{AuditLogger, ConnectionTester, ProbeFailure, TenantConfigStore};
use crate::registry::IntegrationRegistry;
use crate::status_resolver;
use crate::webhook_routes::WebhookRouteBuilder;

/// Label used for store errors of tenant-wide reads.
const ALL_INTEGRATIONS: &str = "all integrations";

/// Connection lifecycle manager
pub struct ConnectionLifecycleManager {
    store: Arc<dyn TenantConfigStore>,
    audit: Arc<dyn AuditLogger>,
    tester: Arc<dyn ConnectionTester>,
    routes: WebhookRouteBuilder,
    test_timeout: Duration,
    max_write_attempts: u32,
    retry_backoff: Duration,
}

impl ConnectionLifecycleManager {
    /// Create a manager with default timeouts and retry policy.
    pub fn new(
        store: Arc<dyn TenantConfigStore>,
        audit: Arc<dyn AuditLogger>,
        tester: Arc<dyn ConnectionTester>,
        routes: WebhookRouteBuilder,
    ) -> Self {
        let defaults = TenantLinkConfig::default();
        Self {
            store,
            audit,
            tester,
            routes,
            test_timeout: Duration::from_millis(defaults.webhooks.test_timeout_ms),
            max_write_attempts: defaults.store.max_write_attempts,
            retry_backoff: Duration::from_millis(defaults.store.retry_backoff_ms),
        }
    }

    /// Create a manager wired from loaded configuration.
    pub fn from_config(
        store: Arc<dyn TenantConfigStore>,
        audit: Arc<dyn AuditLogger>,
        tester: Arc<dyn ConnectionTester>,
        config: &TenantLinkConfig,
    ) -> Self {
        Self::new(store, audit, tester, WebhookRouteBuilder::new(config.webhooks.base_url.clone()))
            .with_test_timeout(Duration::from_millis(config.webhooks.test_timeout_ms))
            .with_write_retry(
                config.store.max_write_attempts,
                Duration::from_millis(config.store.retry_backoff_ms),
            )
    }

    /// Upper bound for one call to a test endpoint.
    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Configure the total number of write attempts (initial try + retries)
    /// and the base backoff between them.
    pub fn with_write_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.max_write_attempts = attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    pub fn routes(&self) -> &WebhookRouteBuilder {
        &self.routes
    }

    /// Enable an integration for a tenant.
    ///
    /// Credentials are merged into the integration's credential namespace,
    /// `settings` (if any) are shallow-merged into its settings, and it is
    /// marked connected and healthy.
    pub async fn connect(
        &self,
        tenant_id: &str,
        integration_id: &str,
        credentials: BTreeMap<String, String>,
        settings: Option<SettingsMap>,
    ) -> Result<()> {
        let definition = lookup(integration_id)?;
        IntegrationRegistry::validate_credentials(definition, &credentials)?;
        if let Some(settings) = &settings {
            IntegrationRegistry::validate_settings(definition, settings)?;
        }

        let now = Utc::now();
        self.mutate(tenant_id, definition, |config| {
            patch::connect(config, definition, &credentials, settings.as_ref(), now);
            Some(())
        })
        .await?;

        let credential_keys: Vec<&String> = credentials.keys().collect();
        let setting_keys: Vec<&String> =
            settings.as_ref().map(|s| s.keys().collect()).unwrap_or_default();
        info!(
            tenant_id,
            integration = %definition.id,
            credential_count = credential_keys.len(),
            "integration connected"
        );
        self.emit(AuditEvent::new(
            tenant_id,
            definition.id,
            AuditAction::Connected,
            json!({
                "integration_id": definition.id,
                "credential_keys": credential_keys,
                "setting_keys": setting_keys,
            }),
        ));
        Ok(())
    }

    /// Disable an integration for a tenant.
    ///
    /// Its flag is cleared, its credential values and connection timestamp
    /// are nulled (keys kept), and its health entry is tombstoned.
    pub async fn disconnect(&self, tenant_id: &str, integration_id: &str) -> Result<()> {
        let definition = lookup(integration_id)?;

        self.mutate(tenant_id, definition, |config| {
            patch::disconnect(config, definition);
            Some(())
        })
        .await?;

        info!(tenant_id, integration = %definition.id, "integration disconnected");
        self.emit(AuditEvent::new(
            tenant_id,
            definition.id,
            AuditAction::Disconnected,
            json!({ "integration_id": definition.id }),
        ));
        Ok(())
    }

    /// Merge `partial_settings` into the integration's settings.
    ///
    /// New keys are added, existing keys overwritten, unrelated keys kept.
    pub async fn update_settings(
        &self,
        tenant_id: &str,
        integration_id: &str,
        partial_settings: SettingsMap,
    ) -> Result<()> {
        let definition = lookup(integration_id)?;
        IntegrationRegistry::validate_settings(definition, &partial_settings)?;

        self.mutate(tenant_id, definition, |config| {
            patch::merge_settings(config, definition.id, &partial_settings);
            Some(())
        })
        .await?;

        let keys: Vec<&String> = partial_settings.keys().collect();
        info!(tenant_id, integration = %definition.id, ?keys, "integration settings updated");
        self.emit(AuditEvent::new(
            tenant_id,
            definition.id,
            AuditAction::SettingsUpdated,
            json!({ "integration_id": definition.id, "setting_keys": keys }),
        ));
        Ok(())
    }

    /// Call the integration's test endpoint.
    ///
    /// Reads the tenant document for its record id but never writes it.
    /// Bounded by the configured timeout and abandoned as soon as `cancel`
    /// fires.
    pub async fn test_connection(
        &self,
        tenant_id: &str,
        integration_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TestReport> {
        let definition = lookup(integration_id)?;
        let id = definition.id;

        let config = self.read(tenant_id, id.as_str()).await?;
        let url = self.routes.test_url(config.record_id(), id).ok_or_else(|| {
            ValidationError::MissingTenantRecord { tenant_id: tenant_id.to_string() }
        })?;

        let started = Instant::now();
        let timeout_ms = u64::try_from(self.test_timeout.as_millis()).unwrap_or(u64::MAX);
        debug!(tenant_id, integration = %id, timeout_ms, "testing integration connection");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(tenant_id, integration = %id, "connection test cancelled");
                return Err(NetworkError::Cancelled { integration: id.to_string() }.into());
            }
            outcome = tokio::time::timeout(self.test_timeout, self.tester.post(&url, self.test_timeout)) => outcome,
        };

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let response = match outcome {
            Err(_) | Ok(Err(ProbeFailure::TimedOut)) => {
                warn!(tenant_id, integration = %id, timeout_ms, "connection test timed out");
                return Err(NetworkError::Timeout { integration: id.to_string(), timeout_ms }.into());
            }
            Ok(Err(ProbeFailure::Unreachable(message))) => {
                warn!(tenant_id, integration = %id, %message, "test endpoint unreachable");
                return Err(NetworkError::Remote { integration: id.to_string(), status: None, message }
                    .into());
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            warn!(
                tenant_id,
                integration = %id,
                status = response.status_code,
                "test endpoint rejected connection"
            );
            return Err(NetworkError::Remote {
                integration: id.to_string(),
                status: Some(response.status_code),
                message: response.reason.unwrap_or_else(|| "non-success status".to_string()),
            }
            .into());
        }

        info!(tenant_id, integration = %id, latency_ms, "connection test succeeded");
        Ok(TestReport { integration_id: id, status_code: response.status_code, latency_ms })
    }

    /// Store a health observation from the out-of-band health poller.
    ///
    /// Only connected integrations take health records; for a disconnected one
    /// nothing is written and `false` is returned. An unhealthy record moves
    /// the integration to `Degraded`, a healthy one back to `Connected`.
    pub async fn record_health(
        &self,
        tenant_id: &str,
        id: IntegrationId,
        status: HealthStatus,
    ) -> Result<bool> {
        let definition = IntegrationRegistry::definition(id);
        let now = Utc::now();

        let Some(previous) = self
            .mutate(tenant_id, definition, |config| {
                patch::record_health(config, definition, status, now)
            })
            .await?
        else {
            debug!(tenant_id, integration = %id, "skipping health record for disconnected integration");
            return Ok(false);
        };

        if previous != Some(status) {
            info!(
                tenant_id,
                integration = %id,
                previous = ?previous,
                current = %status,
                "integration health changed"
            );
            self.emit(AuditEvent::new(
                tenant_id,
                id,
                AuditAction::HealthChanged,
                json!({ "integration_id": id, "previous": previous, "current": status }),
            ));
        }
        Ok(true)
    }

    /// Stamp the last successful sync of a connected integration.
    pub async fn record_sync(&self, tenant_id: &str, id: IntegrationId) -> Result<bool> {
        let definition = IntegrationRegistry::definition(id);
        let now = Utc::now();

        let written = self
            .mutate(tenant_id, definition, |config| {
                patch::record_sync(config, definition, now).then_some(())
            })
            .await?;
        Ok(written.is_some())
    }

    /// Every catalog integration with its status for this tenant.
    pub async fn list_integrations(&self, tenant_id: &str) -> Result<Vec<IntegrationSummary>> {
        let config = self.read(tenant_id, ALL_INTEGRATIONS).await?;

        Ok(IntegrationRegistry::definitions()
            .iter()
            .map(|definition| IntegrationSummary {
                definition,
                status: status_resolver::resolve_id(&config, definition.id),
                webhook_url: self.routes.build(config.record_id(), definition.id),
            })
            .collect())
    }

    /// Inbound webhook URL of an integration, `None` while the tenant has no
    /// internal record id.
    pub async fn webhook_url(&self, tenant_id: &str, integration_id: &str) -> Result<Option<String>> {
        let definition = lookup(integration_id)?;
        let config = self.read(tenant_id, definition.id.as_str()).await?;
        Ok(self.routes.build(config.record_id(), definition.id))
    }

    /// Derive the status of one integration from a fetched document.
    pub fn resolve_status(config: &TenantIntegrationConfig, integration_id: &str) -> ResolvedStatus {
        status_resolver::resolve(config, integration_id)
    }

    /// Fresh copy of the tenant document; use after every successful write.
    pub async fn fetch_config(&self, tenant_id: &str) -> Result<TenantIntegrationConfig> {
        self.read(tenant_id, ALL_INTEGRATIONS).await
    }

    async fn read(&self, tenant_id: &str, integration: &str) -> Result<TenantIntegrationConfig> {
        self.store
            .read(tenant_id)
            .await
            .map(|versioned| versioned.config)
            .map_err(|err| TenantLinkError::store(integration, err))
    }

    /// Versioned read-modify-write of the tenant document.
    ///
    /// `patch` returns `None` to skip the write altogether.
    async fn mutate<T, F>(
        &self,
        tenant_id: &str,
        definition: &IntegrationDefinition,
        mut patch: F,
    ) -> Result<Option<T>>
    where
        F: FnMut(&mut TenantIntegrationConfig) -> Option<T>,
    {
        let integration = definition.id.as_str();
        let attempts = self.max_write_attempts.max(1);

        for attempt in 1..=attempts {
            let versioned = self
                .store
                .read(tenant_id)
                .await
                .map_err(|err| TenantLinkError::store(integration, err))?;

            let mut config = versioned.config;
            let Some(outcome) = patch(&mut config) else {
                return Ok(None);
            };

            match self.store.write(tenant_id, &config, versioned.version).await {
                Ok(version) => {
                    debug!(tenant_id, integration, attempt, version, "tenant document written");
                    return Ok(Some(outcome));
                }
                Err(err) if err.is_conflict() && attempt < attempts => {
                    warn!(tenant_id, integration, attempt, error = %err, "write conflict, retrying");
                    self.sleep_with_backoff(attempt).await;
                }
                Err(err) if err.is_conflict() => {
                    warn!(tenant_id, integration, attempts, "write conflicts exhausted retries");
                    return Err(TenantLinkError::store(
                        integration,
                        StoreError::ConflictRetriesExhausted {
                            tenant_id: tenant_id.to_string(),
                            attempts,
                        },
                    ));
                }
                Err(err) => {
                    warn!(tenant_id, integration, error = %err, "tenant document write failed");
                    return Err(TenantLinkError::store(integration, err));
                }
            }
        }

        Err(TenantLinkError::Internal("write loop exhausted attempts without a result".into()))
    }

    async fn sleep_with_backoff(&self, attempt: u32) {
        let shift = attempt.saturating_sub(1).min(8);
        let delay = self.retry_backoff.saturating_mul(1u32 << shift);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn emit(&self, event: AuditEvent) {
        let action = event.action;
        if let Err(err) = self.audit.append(event) {
            warn!(%action, error = %err, "audit append failed; continuing");
        }
    }
}

fn lookup(integration_id: &str) -> Result<&'static IntegrationDefinition> {
    IntegrationRegistry::parse(integration_id)
        .map(IntegrationRegistry::definition)
        .map_err(TenantLinkError::from)
}
