//! Integration health monitoring with explicit lifecycle management
//!
//! Periodically tests every connected integration of the configured tenants
//! and records the outcome through the lifecycle manager:
//! - a successful test records `healthy` (Degraded -> Connected)
//! - a remote failure or timeout records `unhealthy` (Connected -> Degraded)
//! - validation and store failures are logged and leave health untouched
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tenantlink_core::ConnectionLifecycleManager;
//! use tenantlink_domain::{HealthConfig, Result};
//! use tenantlink_infra::health::HealthMonitor;
//!
//! # async fn example(manager: Arc<ConnectionLifecycleManager>) -> Result<()> {
//! let config = HealthConfig { enabled: true, interval_secs: 60, tenants: vec!["acme".into()] };
//! let mut monitor = HealthMonitor::from_config(manager, &config);
//!
//! monitor.start()?;
//! // ... do work ...
//! monitor.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tenantlink_core::ConnectionLifecycleManager;
use tenantlink_domain::{
    HealthConfig, HealthStatus, NetworkError, Result, TenantLinkError,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub healthy: usize,
    pub unhealthy: usize,
    pub skipped: usize,
}

/// Background health monitor with explicit lifecycle
pub struct HealthMonitor {
    manager: Arc<ConnectionLifecycleManager>,
    tenants: Arc<[String]>,
    interval: Duration,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl HealthMonitor {
    pub fn new(
        manager: Arc<ConnectionLifecycleManager>,
        tenants: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            manager,
            tenants: tenants.into(),
            interval,
            task_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn from_config(manager: Arc<ConnectionLifecycleManager>, config: &HealthConfig) -> Self {
        Self::new(manager, config.tenants.clone(), Duration::from_secs(config.interval_secs.max(1)))
    }

    /// Spawn the polling task. It runs until [`stop`](Self::stop); a stopped
    /// monitor may be started again.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(TenantLinkError::Internal("Health monitor already running".to_string()));
        }

        let manager = self.manager.clone();
        let tenants = self.tenants.clone();
        let interval = self.interval;
        let cancel = self.cancellation.clone();

        info!(
            interval_secs = interval.as_secs(),
            tenants = tenants.len(),
            "Starting integration health monitor"
        );

        self.task_handle = Some(tokio::spawn(async move {
            health_worker(manager, tenants, interval, cancel).await;
        }));
        Ok(())
    }

    /// Cancel in-flight tests and wait for the task to finish.
    ///
    /// The monitor can be started again afterwards.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();
        let handle = self.task_handle.take();
        // The stopped worker keeps its clone of the cancelled token.
        self.cancellation = CancellationToken::new();

        if let Some(handle) = handle {
            tokio::time::timeout(SHUTDOWN_TIMEOUT, handle)
                .await
                .map_err(|_| {
                    TenantLinkError::Internal("Health monitor shutdown timeout".to_string())
                })?
                .map_err(|e| TenantLinkError::Internal(format!("Task join failed: {e}")))?;
        }

        info!("Integration health monitor stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }

    /// Run one sweep over all configured tenants right now.
    pub async fn sweep(&self) -> SweepSummary {
        sweep(&self.manager, &self.tenants, &self.cancellation).await
    }
}

async fn health_worker(
    manager: Arc<ConnectionLifecycleManager>,
    tenants: Arc<[String]>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Health monitor worker shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let summary = sweep(&manager, &tenants, &cancel).await;
                debug!(
                    healthy = summary.healthy,
                    unhealthy = summary.unhealthy,
                    skipped = summary.skipped,
                    "health sweep finished"
                );
            }
        }
    }
}

async fn sweep(
    manager: &ConnectionLifecycleManager,
    tenants: &[String],
    cancel: &CancellationToken,
) -> SweepSummary {
    let mut summary = SweepSummary::default();

    for tenant_id in tenants {
        if cancel.is_cancelled() {
            break;
        }
        if let Err(err) = check_tenant(manager, tenant_id, cancel, &mut summary).await {
            warn!(tenant_id = %tenant_id, error = %err, "health sweep skipped tenant");
        }
    }
    summary
}

async fn check_tenant(
    manager: &ConnectionLifecycleManager,
    tenant_id: &str,
    cancel: &CancellationToken,
    summary: &mut SweepSummary,
) -> Result<()> {
    let connected: Vec<_> = manager
        .list_integrations(tenant_id)
        .await?
        .into_iter()
        .filter(|entry| entry.status.is_connected())
        .map(|entry| entry.definition.id)
        .collect();

    for id in connected {
        let status = match manager.test_connection(tenant_id, id.as_str(), cancel).await {
            Ok(_) => HealthStatus::Healthy,
            Err(TenantLinkError::Network(NetworkError::Cancelled { .. })) => return Ok(()),
            Err(TenantLinkError::Network(err)) => {
                debug!(tenant_id, integration = %id, error = %err, "integration test failed");
                HealthStatus::Unhealthy
            }
            Err(err) => {
                warn!(tenant_id, integration = %id, error = %err, "integration could not be tested");
                summary.skipped += 1;
                continue;
            }
        };

        if manager.record_health(tenant_id, id, status).await? {
            match status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
            }
        } else {
            summary.skipped += 1;
        }
    }
    Ok(())
}
