//! Domain types and models

pub mod audit;
pub mod integration;
pub mod status;
pub mod tenant_config;

pub use audit::{AuditAction, AuditEvent};
pub use integration::{
    CredentialFieldSpec, CredentialKind, IntegrationCategory, IntegrationDefinition,
    IntegrationId, SettingKind, SettingSpec,
};
pub use status::{ConnectionState, ConnectionStatus, IntegrationSummary, ResolvedStatus, TestReport};
pub use tenant_config::{
    CatalogMap, CredentialMap, HealthRecord, HealthStatus, SettingsMap, TenantIntegrationConfig,
    VersionedConfig,
};
