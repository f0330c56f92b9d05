//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Webhook routing
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "https://hooks.tenantlink.local/webhooks";
pub const WEBHOOK_TEST_SEGMENT: &str = "test";

// Connection testing
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 5_000;

// Optimistic concurrency on the tenant document
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 4;
pub const DEFAULT_WRITE_RETRY_BACKOFF_MS: u64 = 20;

// Storage
pub const DEFAULT_DB_PATH: &str = "tenantlink.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

// Audit trail
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1_024;

// Health polling
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 60;

// Logging
pub const DEFAULT_LOG_FILTER: &str = "info,tenantlink=debug";
