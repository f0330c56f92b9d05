//! Deterministic webhook URLs per tenant and integration
//!
//! Routes are built from the tenant's internal record id, never the
//! human-facing slug, so URLs cannot be guessed across tenants. Without a
//! record id the builder returns `None`; a partially built URL is never
//! handed out.

use tenantlink_domain::constants::WEBHOOK_TEST_SEGMENT;
use tenantlink_domain::IntegrationId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRouteBuilder {
    base_url: String,
}

impl WebhookRouteBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{tenant_record_id}/{integration_id}`
    pub fn build(&self, tenant_record_id: Option<&str>, integration_id: IntegrationId) -> Option<String> {
        let record_id = usable_record_id(tenant_record_id)?;
        Some(format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(record_id),
            integration_id.as_str()
        ))
    }

    /// `{base}/test/{tenant_record_id}/{integration_id}`
    pub fn test_url(&self, tenant_record_id: Option<&str>, integration_id: IntegrationId) -> Option<String> {
        let record_id = usable_record_id(tenant_record_id)?;
        Some(format!(
            "{}/{}/{}/{}",
            self.base_url,
            WEBHOOK_TEST_SEGMENT,
            urlencoding::encode(record_id),
            integration_id.as_str()
        ))
    }
}

fn usable_record_id(tenant_record_id: Option<&str>) -> Option<&str> {
    tenant_record_id.map(str::trim).filter(|id| !id.is_empty())
}
