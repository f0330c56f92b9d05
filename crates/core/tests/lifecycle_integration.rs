//! Integration tests for `ConnectionLifecycleManager`
//!
//! **Coverage:**
//! - Validation happens before the store is touched
//! - Connect / disconnect / settings merge against a versioned store
//! - Connection tests: success, remote failure, timeout, cancellation
//! - Optimistic concurrency: conflicting writers both survive
//! - Health records driving Connected <-> Degraded
//! - Best-effort audit trail

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use support::{creds, settings, FailingAuditLogger, Harness, InMemoryTenantConfigStore, RECORD_ID, TENANT};
use tenantlink_core::{ConnectionLifecycleManager, ProbeFailure, WebhookRouteBuilder};
use tenantlink_domain::{
    AuditAction, ConnectionState, ConnectionStatus, HealthStatus, IntegrationId, NetworkError,
    StoreError, TenantLinkError, ValidationError,
};
use tokio_util::sync::CancellationToken;

fn email_creds() -> std::collections::BTreeMap<String, String> {
    creds(&[("smtp_key", "SG.secret-value"), ("from_address", "front@acme.test")])
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn unknown_integration_is_rejected_without_touching_the_store() {
    let h = Harness::new();

    let connect = h.manager.connect(TENANT, "fax", creds(&[("number", "1")]), None).await;
    let disconnect = h.manager.disconnect(TENANT, "fax").await;
    let update = h.manager.update_settings(TENANT, "fax", settings(json!({ "a": 1 }))).await;

    for result in [connect, disconnect, update] {
        assert_eq!(
            result,
            Err(TenantLinkError::Validation(ValidationError::UnknownIntegration { id: "fax".into() }))
        );
    }
    assert_eq!(h.store.read_count(), 0);
    assert_eq!(h.store.write_count(), 0);
    assert!(h.audit.events().is_empty());
}

#[tokio::test]
async fn missing_required_credential_writes_nothing() {
    let h = Harness::new();

    let err = h
        .manager
        .connect(TENANT, "sms", creds(&[("account_sid", "AC123")]), None)
        .await
        .expect_err("auth_token is required");

    assert_eq!(err.label(), "validation");
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn invalid_setting_value_writes_nothing() {
    let h = Harness::new();

    let err = h
        .manager
        .update_settings(TENANT, "sms", settings(json!({ "daily_limit": "many" })))
        .await
        .expect_err("daily_limit is an integer");

    assert!(matches!(
        err,
        TenantLinkError::Validation(ValidationError::InvalidSetting { ref key, .. }) if key == "daily_limit"
    ));
    assert_eq!(h.store.write_count(), 0);
}

// ============================================================================
// Connect / disconnect / settings
// ============================================================================

#[tokio::test]
async fn connect_marks_integration_connected_and_healthy() {
    let h = Harness::new();

    h.manager
        .connect(TENANT, "email", email_creds(), Some(settings(json!({ "from_name": "Acme" }))))
        .await
        .expect("connect should succeed");

    let config = h.manager.fetch_config(TENANT).await.expect("fetch should succeed");
    let status = ConnectionLifecycleManager::resolve_status(&config, "email");

    assert_eq!(status.status, ConnectionStatus::Connected);
    assert_eq!(status.health.map(|record| record.status), Some(HealthStatus::Healthy));
    assert!(status.connected_at.is_some());
    assert_eq!(config.credential(IntegrationId::Email, "smtp_key"), Some("SG.secret-value"));
    assert_eq!(config.settings(IntegrationId::Email).unwrap()["from_name"], json!("Acme"));
    assert_eq!(h.audit.actions(), vec![AuditAction::Connected]);
}

#[tokio::test]
async fn disconnect_nulls_credentials_and_tombstones_health() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    h.manager.disconnect(TENANT, "email").await.expect("disconnect should succeed");

    let config = h.store.snapshot(TENANT);
    let status = ConnectionLifecycleManager::resolve_status(&config, "email");
    assert_eq!(status.status, ConnectionStatus::Disconnected);
    assert!(status.health.is_none());

    let stored = &config.credential_fields[&IntegrationId::Email];
    assert_eq!(stored.get("smtp_key"), Some(&None), "key kept, value nulled");
    assert_eq!(config.integration_health.get(&IntegrationId::Email), Some(&None));
    assert_eq!(config.connected_at(IntegrationId::Email), None);
    assert_eq!(h.audit.actions(), vec![AuditAction::Connected, AuditAction::Disconnected]);
}

#[tokio::test]
async fn disconnect_leaves_other_integrations_connected() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();
    h.manager
        .connect(TENANT, "sms", creds(&[("account_sid", "AC1"), ("auth_token", "tok")]), None)
        .await
        .unwrap();

    h.manager.disconnect(TENANT, "email").await.unwrap();

    let config = h.store.snapshot(TENANT);
    let sms = ConnectionLifecycleManager::resolve_status(&config, "sms");
    assert!(sms.is_connected());
    assert_eq!(config.credential(IntegrationId::Sms, "auth_token"), Some("tok"));
}

#[tokio::test]
async fn settings_updates_are_merged() {
    let h = Harness::new();

    h.manager.update_settings(TENANT, "sms", settings(json!({ "daily_limit": 100 }))).await.unwrap();
    h.manager.update_settings(TENANT, "sms", settings(json!({ "retries": 3 }))).await.unwrap();

    let config = h.store.snapshot(TENANT);
    assert_eq!(
        serde_json::Value::Object(config.settings(IntegrationId::Sms).unwrap().clone()),
        json!({ "daily_limit": 100, "retries": 3 })
    );
    assert_eq!(h.audit.actions(), vec![AuditAction::SettingsUpdated, AuditAction::SettingsUpdated]);
}

#[tokio::test]
async fn repeated_connect_is_idempotent() {
    let h = Harness::new();

    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    let config = h.store.snapshot(TENANT);
    assert!(ConnectionLifecycleManager::resolve_status(&config, "email").is_connected());
    assert_eq!(config.credential_fields[&IntegrationId::Email].len(), 2);
}

#[tokio::test]
async fn unknown_tenant_surfaces_store_error() {
    let h = Harness::new();

    let err = h.manager.disconnect("ghost", "voice").await.expect_err("tenant was never provisioned");

    assert_eq!(
        err,
        TenantLinkError::Store {
            integration: "voice".into(),
            source: StoreError::NotFound { tenant_id: "ghost".into() },
        }
    );
}

#[tokio::test]
async fn store_failure_names_the_integration() {
    let h = Harness::new();
    h.store.fail_writes(true);

    let err = h.manager.connect(TENANT, "email", email_creds(), None).await.expect_err("write fails");

    match err {
        TenantLinkError::Store { integration, source } => {
            assert_eq!(integration, "email");
            assert!(matches!(source, StoreError::Backend { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.audit.events().is_empty(), "failed writes are not audited");
}

// ============================================================================
// Optimistic concurrency
// ============================================================================

#[tokio::test]
async fn concurrent_writer_changes_survive_a_retry() {
    let h = Harness::new();
    h.store.interfere(|config| {
        config.connection_flags.insert("voice_enabled".into(), true);
    });

    h.manager.connect(TENANT, "email", email_creds(), None).await.expect("retry should succeed");

    let config = h.store.snapshot(TENANT);
    assert!(config.flag("email_enabled"));
    assert!(config.flag("voice_enabled"), "other writer's change was overwritten");
    assert_eq!(h.store.write_count(), 2);
}

#[tokio::test]
async fn parallel_mutations_of_different_integrations_both_land() {
    let h = Arc::new(Harness::new());

    let a = {
        let h = h.clone();
        tokio::spawn(async move { h.manager.connect(TENANT, "email", email_creds(), None).await })
    };
    let b = {
        let h = h.clone();
        tokio::spawn(async move {
            h.manager.update_settings(TENANT, "voice", settings(json!({ "record_calls": true }))).await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let config = h.store.snapshot(TENANT);
    assert!(config.flag("email_enabled"));
    assert_eq!(config.settings(IntegrationId::Voice).unwrap()["record_calls"], json!(true));
}

#[tokio::test]
async fn persistent_conflicts_exhaust_retries() {
    let h = Harness::new();
    for _ in 0..3 {
        h.store.interfere(|config| {
            config.last_sync_at.insert(IntegrationId::Sms, None);
        });
    }

    let err = h.manager.connect(TENANT, "email", email_creds(), None).await.expect_err("always loses");

    assert_eq!(
        err,
        TenantLinkError::Store {
            integration: "email".into(),
            source: StoreError::ConflictRetriesExhausted { tenant_id: TENANT.into(), attempts: 3 },
        }
    );
    assert_eq!(err.label(), "store_conflict");
    assert!(!h.store.snapshot(TENANT).flag("email_enabled"));
    assert!(h.audit.events().is_empty());
}

// ============================================================================
// Connection tests
// ============================================================================

#[tokio::test]
async fn successful_test_reports_status_and_posts_to_test_route() {
    let h = Harness::new();

    let report = h
        .manager
        .test_connection(TENANT, "whatsapp", &CancellationToken::new())
        .await
        .expect("200 is a success");

    assert_eq!(report.integration_id, IntegrationId::Whatsapp);
    assert_eq!(report.status_code, 200);
    assert_eq!(
        h.tester.calls(),
        vec![format!("{}/test/{RECORD_ID}/whatsapp", support::BASE_URL)]
    );
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn remote_failure_leaves_document_unchanged() {
    let h = Harness::new();
    h.manager.connect(TENANT, "voice", creds(&[("api_key", "k"), ("caller_id", "+15550100")]), None)
        .await
        .unwrap();
    let before = h.store.snapshot(TENANT);
    let writes = h.store.write_count();
    h.tester.respond_with(500, Some("upstream exploded"));

    let err = h
        .manager
        .test_connection(TENANT, "voice", &CancellationToken::new())
        .await
        .expect_err("500 is a failure");

    assert!(matches!(
        err,
        TenantLinkError::Network(NetworkError::Remote { status: Some(500), ref message, .. })
            if message == "upstream exploded"
    ));
    assert_eq!(err.label(), "network_remote");
    assert_eq!(h.store.snapshot(TENANT), before);
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn unreachable_endpoint_has_no_status() {
    let h = Harness::new();
    h.tester.fail_with(ProbeFailure::Unreachable("connection refused".into()));

    let err = h.manager.test_connection(TENANT, "sms", &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, TenantLinkError::Network(NetworkError::Remote { status: None, .. })));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let h = Harness::new();
    let manager = ConnectionLifecycleManager::new(
        h.store.clone(),
        h.audit.clone(),
        h.tester.clone(),
        WebhookRouteBuilder::new(support::BASE_URL),
    )
    .with_test_timeout(Duration::from_millis(20));
    h.tester.delay_by(Duration::from_millis(500));

    let err = manager.test_connection(TENANT, "email", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(
        err,
        TenantLinkError::Network(NetworkError::Timeout { integration: "email".into(), timeout_ms: 20 })
    );
}

#[tokio::test]
async fn cancelled_test_returns_cancelled() {
    let h = Harness::new();
    h.tester.delay_by(Duration::from_millis(500));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h.manager.test_connection(TENANT, "facebook", &cancel).await.unwrap_err();

    assert_eq!(
        err,
        TenantLinkError::Network(NetworkError::Cancelled { integration: "facebook".into() })
    );
}

#[tokio::test]
async fn cancelling_mid_flight_abandons_the_request() {
    let h = Harness::new();
    h.tester.delay_by(Duration::from_secs(5));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = h.manager.test_connection(TENANT, "instagram", &cancel).await.unwrap_err();
    assert_eq!(err.label(), "network_cancelled");
}

#[tokio::test]
async fn test_without_record_id_fails_validation() {
    let store = Arc::new(InMemoryTenantConfigStore::with_tenant(TENANT, None));
    let h = Harness::with_store(store);

    let err = h.manager.test_connection(TENANT, "email", &CancellationToken::new()).await.unwrap_err();

    assert_eq!(
        err,
        TenantLinkError::Validation(ValidationError::MissingTenantRecord { tenant_id: TENANT.into() })
    );
    assert!(h.tester.calls().is_empty());
}

// ============================================================================
// Health and sync
// ============================================================================

#[tokio::test]
async fn health_records_move_between_connected_and_degraded() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    assert!(h.manager.record_health(TENANT, IntegrationId::Email, HealthStatus::Unhealthy).await.unwrap());
    let config = h.store.snapshot(TENANT);
    assert_eq!(
        ConnectionLifecycleManager::resolve_status(&config, "email").state(),
        ConnectionState::Degraded
    );

    assert!(h.manager.record_health(TENANT, IntegrationId::Email, HealthStatus::Healthy).await.unwrap());
    let config = h.store.snapshot(TENANT);
    assert_eq!(
        ConnectionLifecycleManager::resolve_status(&config, "email").state(),
        ConnectionState::Connected
    );

    assert_eq!(
        h.audit.actions(),
        vec![AuditAction::Connected, AuditAction::HealthChanged, AuditAction::HealthChanged]
    );
}

#[tokio::test]
async fn unchanged_health_is_not_audited() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    h.manager.record_health(TENANT, IntegrationId::Email, HealthStatus::Healthy).await.unwrap();

    assert_eq!(h.audit.actions(), vec![AuditAction::Connected]);
}

#[tokio::test]
async fn health_for_disconnected_integration_is_skipped() {
    let h = Harness::new();

    let recorded =
        h.manager.record_health(TENANT, IntegrationId::Sms, HealthStatus::Unhealthy).await.unwrap();

    assert!(!recorded);
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn sync_is_stamped_only_while_connected() {
    let h = Harness::new();
    assert!(!h.manager.record_sync(TENANT, IntegrationId::Email).await.unwrap());

    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();
    assert!(h.manager.record_sync(TENANT, IntegrationId::Email).await.unwrap());

    let config = h.store.snapshot(TENANT);
    assert!(ConnectionLifecycleManager::resolve_status(&config, "email").last_sync_at.is_some());
}

// ============================================================================
// Listing and webhook URLs
// ============================================================================

#[tokio::test]
async fn list_integrations_covers_the_whole_catalog() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    let summaries = h.manager.list_integrations(TENANT).await.unwrap();

    assert_eq!(summaries.len(), IntegrationId::ALL.len());
    for summary in &summaries {
        let expected = format!("{}/{RECORD_ID}/{}", support::BASE_URL, summary.definition.id);
        assert_eq!(summary.webhook_url.as_deref(), Some(expected.as_str()));
        assert_eq!(summary.status.is_connected(), summary.definition.id == IntegrationId::Email);
    }
}

#[tokio::test]
async fn webhook_url_is_absent_without_record_id() {
    let store = Arc::new(InMemoryTenantConfigStore::with_tenant(TENANT, Some("   ")));
    let h = Harness::with_store(store);

    assert_eq!(h.manager.webhook_url(TENANT, "sms").await.unwrap(), None);
    assert!(h.manager.webhook_url(TENANT, "pager").await.is_err());
}

// ============================================================================
// Audit trail
// ============================================================================

#[tokio::test]
async fn audit_failure_does_not_fail_the_operation() {
    let store = Arc::new(InMemoryTenantConfigStore::with_tenant(TENANT, Some(RECORD_ID)));
    let h = Harness::with_store(store.clone());
    let manager = ConnectionLifecycleManager::new(
        store.clone(),
        Arc::new(FailingAuditLogger),
        h.tester.clone(),
        WebhookRouteBuilder::new(support::BASE_URL),
    );

    manager.connect(TENANT, "email", email_creds(), None).await.expect("audit is best effort");

    assert!(store.snapshot(TENANT).flag("email_enabled"));
}

#[tokio::test]
async fn audit_details_name_keys_but_never_values() {
    let h = Harness::new();
    h.manager.connect(TENANT, "email", email_creds(), None).await.unwrap();

    let event = &h.audit.events()[0];
    assert_eq!(event.tenant_id, TENANT);
    assert_eq!(event.integration_id, IntegrationId::Email);
    assert_eq!(event.details["credential_keys"], json!(["from_address", "smtp_key"]));

    let rendered = event.details.to_string();
    assert!(!rendered.contains("SG.secret-value"));
}
