use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client as ReqwestClient, Response};
use tenantlink_domain::TenantLinkError;
use tracing::debug;

use crate::errors::InfraError;

/// Single-shot HTTP client for integration test endpoints.
///
/// Connection tests are `POST`s and are never replayed, so there is no retry
/// loop: each call is one request, and the raw transport error comes back so
/// the caller can tell a timeout from an unreachable host.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TenantLinkError> {
        Self::builder().build()
    }

    /// Send one empty-bodied `POST` to `url`, bounded by `timeout`.
    pub async fn post_empty(&self, url: &str, timeout: Duration) -> Result<Response, reqwest::Error> {
        let request = self.client.post(url).timeout(timeout).body(Vec::new()).build()?;
        let url = request.url().clone();
        debug!(%url, ?timeout, "posting to test endpoint");

        let response = self.client.execute(request).await;
        match &response {
            Ok(response) => debug!(%url, status = %response.status(), "test endpoint answered"),
            Err(err) => debug!(%url, error = %err, "test endpoint request failed"),
        }
        response
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    connect_timeout: Duration,
    user_agent: String,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("tenantlink/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers,
        }
    }
}

impl HttpClientBuilder {
    /// Upper bound for establishing the TCP/TLS connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Extra headers sent with every test request (for example a shared
    /// signing header expected by the webhook gateway).
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, TenantLinkError> {
        let client = ReqwestClient::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent)
            .default_headers(self.default_headers)
            .no_proxy()
            .build()
            .map_err(|err| TenantLinkError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
