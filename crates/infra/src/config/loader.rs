//! Configuration loader
//!
//! Loads TenantLink configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required ones are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `TENANTLINK_WEBHOOK_BASE_URL`: Base URL for inbound webhook routes
//! - `TENANTLINK_DB_PATH`: Database file path
//!
//! Optional (defaults apply when unset):
//! - `TENANTLINK_TEST_TIMEOUT_MS`: Connection test timeout
//! - `TENANTLINK_DB_POOL_SIZE`: Connection pool size
//! - `TENANTLINK_MAX_WRITE_ATTEMPTS`: Versioned write attempts per mutation
//! - `TENANTLINK_AUDIT_QUEUE_CAPACITY`: Audit queue capacity
//! - `TENANTLINK_HEALTH_ENABLED`: Whether the health monitor runs (true/false)
//! - `TENANTLINK_HEALTH_INTERVAL_SECS`: Health sweep interval
//! - `TENANTLINK_HEALTH_TENANTS`: Comma-separated tenants to monitor
//! - `TENANTLINK_LOG_FILTER`: `tracing` filter directive
//! - `TENANTLINK_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` and `./tenantlink.{json,toml}`
//! 2. `../config.{json,toml}` and `../../config.{json,toml}`
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tenantlink_domain::{Result, TenantLinkConfig, TenantLinkError};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `TenantLinkError::Config` if configuration cannot be loaded from
/// either source or a value is malformed.
pub fn load() -> Result<TenantLinkConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `TenantLinkError::Config` if a required variable is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<TenantLinkConfig> {
    let mut config = TenantLinkConfig::default();

    config.webhooks.base_url = env_var("TENANTLINK_WEBHOOK_BASE_URL")?;
    config.store.path = env_var("TENANTLINK_DB_PATH")?;

    if let Some(timeout) = env_parse("TENANTLINK_TEST_TIMEOUT_MS")? {
        config.webhooks.test_timeout_ms = timeout;
    }
    if let Some(pool_size) = env_parse("TENANTLINK_DB_POOL_SIZE")? {
        config.store.pool_size = pool_size;
    }
    if let Some(attempts) = env_parse("TENANTLINK_MAX_WRITE_ATTEMPTS")? {
        config.store.max_write_attempts = attempts;
    }
    if let Some(capacity) = env_parse("TENANTLINK_AUDIT_QUEUE_CAPACITY")? {
        config.audit.queue_capacity = capacity;
    }

    config.health.enabled = env_bool("TENANTLINK_HEALTH_ENABLED", config.health.enabled);
    if let Some(interval) = env_parse("TENANTLINK_HEALTH_INTERVAL_SECS")? {
        config.health.interval_secs = interval;
    }
    if let Ok(tenants) = std::env::var("TENANTLINK_HEALTH_TENANTS") {
        config.health.tenants = tenants
            .split(',')
            .map(str::trim)
            .filter(|tenant| !tenant.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Ok(filter) = std::env::var("TENANTLINK_LOG_FILTER") {
        config.logging.filter = filter;
    }
    config.logging.json = env_bool("TENANTLINK_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Format is detected by file extension.
///
/// # Errors
/// Returns `TenantLinkError::Config` if the file is missing or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<TenantLinkConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TenantLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TenantLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TenantLinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<TenantLinkConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TenantLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TenantLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TenantLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe standard locations for a configuration file.
///
/// Returns the first file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 8] = [
        "config.json",
        "config.toml",
        "tenantlink.json",
        "tenantlink.toml",
        "../config.json",
        "../config.toml",
        "../../config.json",
        "../../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TenantLinkError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric variable; set-but-invalid is an error.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TenantLinkError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
