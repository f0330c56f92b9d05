//! The per-tenant integration configuration document
//!
//! One document per tenant holds the state of every integration. It is read
//! before each mutation and written back whole, guarded by a version token
//! (see [`VersionedConfig`]).

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::integration::IntegrationId;
use crate::impl_wire_name_conversions;

/// Credential values of one integration. `None` marks a field cleared by
/// disconnect; the key itself stays.
pub type CredentialMap = BTreeMap<String, Option<String>>;

/// Settings of one integration.
pub type SettingsMap = serde_json::Map<String, Value>;

/// Last-known liveness of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl_wire_name_conversions!(HealthStatus {
    Healthy => "healthy",
    Unhealthy => "unhealthy",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl HealthRecord {
    pub fn new(status: HealthStatus, last_check: DateTime<Utc>) -> Self {
        Self { status, last_check }
    }
}

/// Per-integration section of the tenant document.
///
/// Entries for catalog integrations are typed. Entries under any other id
/// (an integration retired from the catalog, or written by a newer release)
/// are carried along untouched as raw JSON, so reading such a document never
/// fails and writing it back never drops them.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMap<V> {
    known: BTreeMap<IntegrationId, V>,
    unrecognized: BTreeMap<String, Value>,
}

impl<V> Default for CatalogMap<V> {
    fn default() -> Self {
        Self { known: BTreeMap::new(), unrecognized: BTreeMap::new() }
    }
}

impl<V> CatalogMap<V> {
    /// Ids present in the stored document that the catalog does not know.
    pub fn unrecognized_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.unrecognized.keys().map(String::as_str)
    }
}

impl<V> Deref for CatalogMap<V> {
    type Target = BTreeMap<IntegrationId, V>;

    fn deref(&self) -> &Self::Target {
        &self.known
    }
}

impl<V> DerefMut for CatalogMap<V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.known
    }
}

impl<V: Serialize> Serialize for CatalogMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.known.len() + self.unrecognized.len()))?;
        for (id, value) in &self.known {
            map.serialize_entry(id.as_str(), value)?;
        }
        for (id, value) in &self.unrecognized {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

impl<'de, V: DeserializeOwned> Deserialize<'de> for CatalogMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut map = Self::default();
        for (key, value) in raw {
            match key.parse::<IntegrationId>() {
                Ok(id) => {
                    let typed = serde_json::from_value(value)
                        .map_err(|err| D::Error::custom(format!("{key}: {err}")))?;
                    map.known.insert(id, typed);
                }
                Err(_) => {
                    map.unrecognized.insert(key, value);
                }
            }
        }
        Ok(map)
    }
}

/// Integration state of a single tenant.
///
/// Credentials are namespaced per integration so two integrations declaring
/// the same field key cannot overwrite each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantIntegrationConfig {
    /// Partition key; the tenant's human-facing identifier
    pub tenant_id: String,
    /// Opaque internal record id used for webhook routes
    pub tenant_record_id: Option<String>,
    pub credential_fields: CatalogMap<CredentialMap>,
    /// Sparse flag map keyed by each definition's `flag_key`
    pub connection_flags: BTreeMap<String, bool>,
    pub integration_settings: CatalogMap<SettingsMap>,
    /// `Some(None)` is the tombstone written on disconnect
    pub integration_health: CatalogMap<Option<HealthRecord>>,
    pub connected_at: CatalogMap<Option<DateTime<Utc>>>,
    pub last_sync_at: CatalogMap<Option<DateTime<Utc>>>,
}

impl TenantIntegrationConfig {
    /// Fresh document for a newly provisioned tenant.
    pub fn new(tenant_id: impl Into<String>, tenant_record_id: Option<String>) -> Self {
        Self { tenant_id: tenant_id.into(), tenant_record_id, ..Self::default() }
    }

    /// Flag value, absent flags read as `false`.
    pub fn flag(&self, flag_key: &str) -> bool {
        self.connection_flags.get(flag_key).copied().unwrap_or(false)
    }

    /// Current value of a credential field, `None` when absent or cleared.
    pub fn credential(&self, id: IntegrationId, key: &str) -> Option<&str> {
        self.credential_fields.get(&id)?.get(key)?.as_deref()
    }

    pub fn settings(&self, id: IntegrationId) -> Option<&SettingsMap> {
        self.integration_settings.get(&id)
    }

    pub fn health(&self, id: IntegrationId) -> Option<&HealthRecord> {
        self.integration_health.get(&id).and_then(Option::as_ref)
    }

    pub fn connected_at(&self, id: IntegrationId) -> Option<DateTime<Utc>> {
        self.connected_at.get(&id).copied().flatten()
    }

    pub fn last_sync_at(&self, id: IntegrationId) -> Option<DateTime<Utc>> {
        self.last_sync_at.get(&id).copied().flatten()
    }

    /// Record id usable in URLs; blank ids count as absent.
    pub fn record_id(&self) -> Option<&str> {
        self.tenant_record_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// A document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedConfig {
    pub config: TenantIntegrationConfig,
    pub version: u64,
}
