//! Configuration structures
//!
//! Every section has serde defaults so a partial JSON/TOML file (or an empty
//! one) yields a usable configuration. Loading lives in the infra crate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIT_QUEUE_CAPACITY, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE,
    DEFAULT_HEALTH_INTERVAL_SECS, DEFAULT_LOG_FILTER, DEFAULT_MAX_WRITE_ATTEMPTS,
    DEFAULT_TEST_TIMEOUT_MS, DEFAULT_WEBHOOK_BASE_URL, DEFAULT_WRITE_RETRY_BACKOFF_MS,
};

/// Top-level configuration for a TenantLink deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantLinkConfig {
    pub webhooks: WebhookConfig,
    pub store: StoreConfig,
    pub audit: AuditConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

/// Inbound webhook routing and connection testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Base URL every webhook route is built from
    pub base_url: String,
    /// Upper bound for one call to an integration's test endpoint
    pub test_timeout_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEBHOOK_BASE_URL.to_string(),
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
        }
    }
}

/// Tenant configuration store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: String,
    pub pool_size: u32,
    /// Total attempts (initial + retries) when the document version moved
    pub max_write_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            pool_size: DEFAULT_DB_POOL_SIZE,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            retry_backoff_ms: DEFAULT_WRITE_RETRY_BACKOFF_MS,
        }
    }
}

/// Audit trail queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY }
    }
}

/// Background health polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Tenants whose connected integrations are polled
    pub tenants: Vec<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { enabled: false, interval_secs: DEFAULT_HEALTH_INTERVAL_SECS, tenants: Vec::new() }
    }
}

/// Structured logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: DEFAULT_LOG_FILTER.to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: TenantLinkConfig = serde_json::from_str("{}").expect("parses");
        assert_eq!(config, TenantLinkConfig::default());
        assert_eq!(config.webhooks.test_timeout_ms, DEFAULT_TEST_TIMEOUT_MS);
        assert_eq!(config.store.max_write_attempts, DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: TenantLinkConfig =
            serde_json::from_str(r#"{ "webhooks": { "base_url": "https://hooks.example.com" } }"#)
                .expect("parses");

        assert_eq!(config.webhooks.base_url, "https://hooks.example.com");
        assert_eq!(config.webhooks.test_timeout_ms, DEFAULT_TEST_TIMEOUT_MS);
        assert!(!config.health.enabled);
    }
}
