//! SQLite sink for lifecycle audit events.
//!
//! Rows are only ever inserted. The sink is driven by the audit worker, so
//! batches arrive from a single task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tenantlink_domain::{AuditAction, AuditEvent, IntegrationId, StoreError};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::{map_join_error, IntoStoreError};

/// Append-only `integration_audit_log` writer.
pub struct SqliteAuditSink {
    db: Arc<DbManager>,
}

impl SqliteAuditSink {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Persist a batch in one transaction. Returns the number of rows written.
    pub async fn persist(&self, events: Vec<AuditEvent>) -> Result<usize, StoreError> {
        if events.is_empty() {
            return Ok(0);
        }
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<usize, StoreError> {
            let mut conn = db.get_connection()?;
            insert_batch(&mut conn, &events)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Most recent events for a tenant, newest first.
    pub async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let db = Arc::clone(&self.db);
        let tenant_id = tenant_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        task::spawn_blocking(move || -> Result<Vec<AuditEvent>, StoreError> {
            let conn = db.get_connection()?;
            query_recent(&conn, &tenant_id, limit)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn insert_batch(conn: &mut Connection, events: &[AuditEvent]) -> Result<usize, StoreError> {
    let tx = conn.transaction().map_err(IntoStoreError::into_store_error)?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO integration_audit_log
                    (id, tenant_id, integration_id, action, details, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(IntoStoreError::into_store_error)?;

        for event in events {
            let details =
                serde_json::to_string(&event.details).map_err(IntoStoreError::into_store_error)?;
            stmt.execute(params![
                event.id.to_string(),
                event.tenant_id,
                event.integration_id.as_str(),
                event.action.as_str(),
                details,
                event.occurred_at.timestamp_millis(),
            ])
            .map_err(IntoStoreError::into_store_error)?;
        }
    }
    tx.commit().map_err(IntoStoreError::into_store_error)?;
    Ok(events.len())
}

type AuditRow = (String, String, String, String, String, i64);

fn query_recent(conn: &Connection, tenant_id: &str, limit: i64) -> Result<Vec<AuditEvent>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, tenant_id, integration_id, action, details, occurred_at
             FROM integration_audit_log
             WHERE tenant_id = ?1
             ORDER BY occurred_at DESC, id DESC
             LIMIT ?2",
        )
        .map_err(IntoStoreError::into_store_error)?;

    let rows = stmt
        .query_map(params![tenant_id, limit], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
        })
        .map_err(IntoStoreError::into_store_error)?
        .collect::<rusqlite::Result<Vec<AuditRow>>>()
        .map_err(IntoStoreError::into_store_error)?;

    rows.into_iter().map(row_to_event).collect()
}

fn row_to_event(row: AuditRow) -> Result<AuditEvent, StoreError> {
    let (id, tenant_id, integration_id, action, details, occurred_at) = row;
    let corrupt = |what: &str, value: &str| StoreError::Serialization {
        message: format!("audit row has invalid {what}: {value}"),
    };

    Ok(AuditEvent {
        id: Uuid::parse_str(&id).map_err(|_| corrupt("id", &id))?,
        tenant_id,
        integration_id: integration_id
            .parse::<IntegrationId>()
            .map_err(|_| corrupt("integration", &integration_id))?,
        action: action.parse::<AuditAction>().map_err(|_| corrupt("action", &action))?,
        details: serde_json::from_str(&details).map_err(IntoStoreError::into_store_error)?,
        occurred_at: DateTime::<Utc>::from_timestamp_millis(occurred_at)
            .ok_or_else(|| corrupt("timestamp", &occurred_at.to_string()))?,
    })
}
