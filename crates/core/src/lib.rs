//! # TenantLink Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The compiled-in integration registry and its schema validation
//! - Connection status derivation and webhook route construction
//! - Port/adapter interfaces (traits) for the store, audit trail and tester
//! - The connection lifecycle manager
//!
//! ## Architecture Principles
//! - Only depends on `tenantlink-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod lifecycle;
pub mod registry;
pub mod status_resolver;
pub mod webhook_routes;

pub use lifecycle::ports::{
    AuditLogger, ConnectionTester, ProbeFailure, ProbeResponse, TenantConfigStore,
};
pub use lifecycle::ConnectionLifecycleManager;
pub use registry::IntegrationRegistry;
pub use status_resolver::{resolve, resolve_id};
pub use webhook_routes::WebhookRouteBuilder;
