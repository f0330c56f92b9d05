//! Shared test helpers for `tenantlink-core` integration tests.
//!
//! In-memory stand-ins for every lifecycle port so tests can focus on
//! behaviour instead of infrastructure.

#![allow(dead_code)]

pub mod audit;
pub mod store;
pub mod tester;

use std::collections::BTreeMap;
use std::sync::Arc;

use tenantlink_core::{ConnectionLifecycleManager, WebhookRouteBuilder};

pub use audit::{FailingAuditLogger, RecordingAuditLogger};
pub use store::InMemoryTenantConfigStore;
pub use tester::ScriptedTester;

pub const TENANT: &str = "acme-dental";
pub const RECORD_ID: &str = "rec_8f2c";
pub const BASE_URL: &str = "https://hooks.test/webhooks";

/// Credentials map from literal pairs.
pub fn creds(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

/// Settings map from a JSON object literal.
pub fn settings(value: serde_json::Value) -> tenantlink_domain::SettingsMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("settings must be a JSON object, got {other}"),
    }
}

/// Everything a lifecycle test needs, wired together.
pub struct Harness {
    pub store: Arc<InMemoryTenantConfigStore>,
    pub audit: Arc<RecordingAuditLogger>,
    pub tester: Arc<ScriptedTester>,
    pub manager: ConnectionLifecycleManager,
}

impl Harness {
    /// Provisioned tenant with an internal record id, tester answering 200.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTenantConfigStore::with_tenant(TENANT, Some(RECORD_ID)));
        Self::with_store(store)
    }

    pub fn with_store(store: Arc<InMemoryTenantConfigStore>) -> Self {
        let audit = Arc::new(RecordingAuditLogger::default());
        let tester = Arc::new(ScriptedTester::responding(200));
        let manager = ConnectionLifecycleManager::new(
            store.clone(),
            audit.clone(),
            tester.clone(),
            WebhookRouteBuilder::new(BASE_URL),
        )
        .with_write_retry(3, std::time::Duration::from_millis(1));
        Self { store, audit, tester, manager }
    }
}
