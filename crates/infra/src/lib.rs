//! # TenantLink Infrastructure
//!
//! Infrastructure implementations of core lifecycle ports.
//!
//! This crate contains:
//! - SQLite tenant-config store with versioned writes (r2d2 pool)
//! - Audit trail: bounded channel logger, background worker, SQLite sink
//! - HTTP client and the webhook connection tester
//! - Health monitor that feeds health records back into the lifecycle
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `tenantlink-core`
//! - Depends on `tenantlink-domain` and `tenantlink-core`
//! - Contains all "impure" code (I/O, network, background tasks)

pub mod audit;
pub mod config;
pub mod database;
pub mod errors;
pub mod health;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use audit::{AuditWorker, ChannelAuditLogger, SqliteAuditSink};
pub use database::{DbManager, SqliteTenantConfigStore};
pub use errors::InfraError;
pub use health::HealthMonitor;
pub use http::HttpClient;
pub use integrations::WebhookConnectionTester;
