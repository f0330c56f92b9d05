//! Integration connection lifecycle

mod patch;
pub mod ports;
pub mod service;

pub use ports::{AuditLogger, ConnectionTester, ProbeFailure, ProbeResponse, TenantConfigStore};
pub use service::ConnectionLifecycleManager;
