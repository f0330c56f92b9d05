//! reqwest-backed `ConnectionTester`
//!
//! Sends a single empty `POST` to an integration's test route. Every HTTP
//! status comes back as a [`ProbeResponse`]; only transport failures become
//! [`ProbeFailure`]s.

use std::time::Duration;

use async_trait::async_trait;
use tenantlink_core::{ConnectionTester, ProbeFailure, ProbeResponse};
use tenantlink_domain::Result;

use crate::errors::describe_http_error;
use crate::http::HttpClient;

/// Connection tester posting to webhook test routes.
#[derive(Clone)]
pub struct WebhookConnectionTester {
    http: HttpClient,
}

impl WebhookConnectionTester {
    /// Tester with a default client.
    pub fn new() -> Result<Self> {
        Ok(Self { http: HttpClient::new()? })
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ConnectionTester for WebhookConnectionTester {
    async fn post(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<ProbeResponse, ProbeFailure> {
        match self.http.post_empty(url, timeout).await {
            Ok(response) => {
                let status = response.status();
                Ok(ProbeResponse {
                    status_code: status.as_u16(),
                    reason: status.canonical_reason().map(str::to_string),
                })
            }
            Err(err) if err.is_timeout() => Err(ProbeFailure::TimedOut),
            Err(err) => Err(ProbeFailure::Unreachable(describe_http_error(&err))),
        }
    }
}
