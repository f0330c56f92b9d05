//! Database implementations

pub mod audit_repository;
pub mod manager;
pub mod tenant_config_repository;

pub use audit_repository::SqliteAuditSink;
pub use manager::DbManager;
pub use tenant_config_repository::SqliteTenantConfigStore;
