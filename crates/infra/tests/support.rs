#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tenantlink_core::ConnectionLifecycleManager;
use tenantlink_domain::{AuditConfig, TenantLinkConfig};
use tenantlink_infra::audit::{AuditWorker, ChannelAuditLogger};
use tenantlink_infra::database::{DbManager, SqliteAuditSink, SqliteTenantConfigStore};
use tenantlink_infra::WebhookConnectionTester;

pub const TENANT: &str = "acme-dental";
pub const RECORD_ID: &str = "rec_8f2c";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::open(temp_dir.path().join("tenantlink.db"), 4)
            .expect("db manager should be created");
        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// The full production wiring against a temp database and a webhook base URL
/// (usually a wiremock server).
pub struct TestStack {
    pub db: TestDatabase,
    pub store: Arc<SqliteTenantConfigStore>,
    pub sink: Arc<SqliteAuditSink>,
    pub worker: AuditWorker,
    pub logger: ChannelAuditLogger,
    pub manager: Arc<ConnectionLifecycleManager>,
}

impl TestStack {
    pub async fn new(webhook_base_url: &str) -> Self {
        let db = TestDatabase::new();
        let store = Arc::new(SqliteTenantConfigStore::new(db.manager.clone()));
        store.provision(TENANT, Some(RECORD_ID.to_string())).await.expect("tenant provisioned");

        let sink = Arc::new(SqliteAuditSink::new(db.manager.clone()));
        let (mut worker, logger) = AuditWorker::new(sink.clone(), &AuditConfig::default());
        worker.start().expect("audit worker started");

        let mut config = TenantLinkConfig::default();
        config.webhooks.base_url = webhook_base_url.to_string();
        config.webhooks.test_timeout_ms = 500;
        config.store.max_write_attempts = 8;
        config.store.retry_backoff_ms = 1;

        let manager = ConnectionLifecycleManager::from_config(
            store.clone(),
            Arc::new(logger.clone()),
            Arc::new(WebhookConnectionTester::new().expect("tester built")),
            &config,
        );

        Self { db, store, sink, worker, logger, manager: Arc::new(manager) }
    }

    /// Stop the audit worker so every queued event is persisted.
    pub async fn flush_audit(&mut self) {
        self.worker.stop().await.expect("audit worker stopped");
    }
}

/// Poll until `check` holds or the deadline passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Credentials map from literal pairs.
pub fn creds(pairs: &[(&str, &str)]) -> std::collections::BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}
