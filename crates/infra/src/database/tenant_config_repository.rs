//! SQLite-backed tenant configuration store.
//!
//! Implements the `TenantConfigStore` port. Each tenant is one row holding
//! the JSON document and its version; writes are a compare-and-swap on the
//! version column. All database operations run in `spawn_blocking` to avoid
//! blocking the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tenantlink_core::TenantConfigStore;
use tenantlink_domain::{StoreError, TenantIntegrationConfig, VersionedConfig};
use tokio::task;
use tracing::debug;

use super::manager::DbManager;
use crate::errors::{map_join_error, IntoStoreError};

/// SQLite-backed tenant configuration store.
pub struct SqliteTenantConfigStore {
    db: Arc<DbManager>,
}

impl SqliteTenantConfigStore {
    /// Create a new store with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Create the tenant's document if it does not exist yet.
    ///
    /// Existing documents are left alone. Returns the current version.
    pub async fn provision(
        &self,
        tenant_id: &str,
        tenant_record_id: Option<String>,
    ) -> Result<u64, StoreError> {
        let db = Arc::clone(&self.db);
        let config = TenantIntegrationConfig::new(tenant_id, tenant_record_id);

        task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = db.get_connection()?;
            insert_if_absent(&conn, &config)?;
            query_version(&conn, &config.tenant_id)?
                .ok_or_else(|| StoreError::NotFound { tenant_id: config.tenant_id.clone() })
        })
        .await
        .map_err(map_join_error)?
    }

    /// Tenant ids with a stored document, ordered.
    pub async fn tenant_ids(&self) -> Result<Vec<String>, StoreError> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<String>, StoreError> {
            let conn = db.get_connection()?;
            query_tenant_ids(&conn).map_err(IntoStoreError::into_store_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl TenantConfigStore for SqliteTenantConfigStore {
    async fn read(&self, tenant_id: &str) -> Result<VersionedConfig, StoreError> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.to_string();

        task::spawn_blocking(move || -> Result<VersionedConfig, StoreError> {
            let conn = db.get_connection()?;
            query_document(&conn, &tenant_id)?.ok_or(StoreError::NotFound { tenant_id })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn write(
        &self,
        tenant_id: &str,
        config: &TenantIntegrationConfig,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.to_string();
        let document = serde_json::to_string(config).map_err(IntoStoreError::into_store_error)?;

        task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = db.get_connection()?;
            compare_and_swap(&conn, &tenant_id, &document, expected_version)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn insert_if_absent(conn: &Connection, config: &TenantIntegrationConfig) -> Result<(), StoreError> {
    let document = serde_json::to_string(config).map_err(IntoStoreError::into_store_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO tenant_integration_configs (tenant_id, document, version, updated_at)
         VALUES (?1, ?2, 1, ?3)",
        params![config.tenant_id, document, Utc::now().timestamp()],
    )
    .map_err(IntoStoreError::into_store_error)?;
    Ok(())
}

fn query_document(conn: &Connection, tenant_id: &str) -> Result<Option<VersionedConfig>, StoreError> {
    let row = conn
        .query_row(
            "SELECT document, version FROM tenant_integration_configs WHERE tenant_id = ?1",
            params![tenant_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .map_err(IntoStoreError::into_store_error)?;

    let Some((document, version)) = row else {
        return Ok(None);
    };

    let config: TenantIntegrationConfig =
        serde_json::from_str(&document).map_err(IntoStoreError::into_store_error)?;
    Ok(Some(VersionedConfig { config, version: to_version(version)? }))
}

fn query_version(conn: &Connection, tenant_id: &str) -> Result<Option<u64>, StoreError> {
    conn.query_row(
        "SELECT version FROM tenant_integration_configs WHERE tenant_id = ?1",
        params![tenant_id],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map_err(IntoStoreError::into_store_error)?
    .map(to_version)
    .transpose()
}

/// Replace the document only if the stored version still matches.
fn compare_and_swap(
    conn: &Connection,
    tenant_id: &str,
    document: &str,
    expected_version: u64,
) -> Result<u64, StoreError> {
    let expected = i64::try_from(expected_version)
        .map_err(|_| StoreError::backend(format!("version {expected_version} out of range")))?;

    let updated = conn
        .execute(
            "UPDATE tenant_integration_configs
             SET document = ?1, version = version + 1, updated_at = ?2
             WHERE tenant_id = ?3 AND version = ?4",
            params![document, Utc::now().timestamp(), tenant_id, expected],
        )
        .map_err(IntoStoreError::into_store_error)?;

    if updated == 1 {
        debug!(tenant_id, version = expected_version + 1, "tenant document replaced");
        return Ok(expected_version + 1);
    }

    match query_version(conn, tenant_id)? {
        Some(actual) => Err(StoreError::Conflict {
            tenant_id: tenant_id.to_string(),
            expected: expected_version,
            actual,
        }),
        None => Err(StoreError::NotFound { tenant_id: tenant_id.to_string() }),
    }
}

fn query_tenant_ids(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tenant_id FROM tenant_integration_configs ORDER BY tenant_id")?;
    let rows = stmt.query_map(params![], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn to_version(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::backend(format!("negative version {raw}")))
}

// ============================================================================
// Tests
// ============================================================================
