//! HTTP transport for the Harbor v2.0 API
//!
//! The transport policy is fixed for the whole process: it is built once and
//! injected into every component that talks to a registry, so tests can swap
//! in a different implementation or point the real one at a mock server.

use crate::config::RegistryEndpoint;
use crate::error::handlers::NetworkErrorHandler;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use reqwest::header::{CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use url::Url;

pub const USER_AGENT: &str = concat!("harbor-migrate/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Status and raw body of a registry response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Registry HTTP operations used by the migration pipeline.
///
/// Implementations authenticate every call with the endpoint's basic-auth
/// credentials and return the body whatever the status; interpreting it is the
/// caller's business.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn get(&self, endpoint: &RegistryEndpoint, url: Url) -> Result<TransportResponse>;

    async fn post(
        &self,
        endpoint: &RegistryEndpoint,
        url: Url,
        body: Vec<u8>,
    ) -> Result<TransportResponse>;
}

/// Transport policy applied to every registry call
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub skip_tls: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 100,
            // Harbor installs behind self-signed certificates are the norm
            skip_tls: true,
        }
    }
}

/// [`RegistryTransport`] backed by a single `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .http1_only()
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .danger_accept_invalid_certs(config.skip_tls)
            .danger_accept_invalid_hostnames(config.skip_tls)
            .build()
            .map_err(|e| MigrateError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &RegistryEndpoint,
        context: &str,
    ) -> Result<TransportResponse> {
        let response = request
            .basic_auth(&endpoint.username, Some(&endpoint.password))
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, context))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, context))?;

        tracing::trace!(%status, bytes = body.len(), "{} completed", context);
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn get(&self, endpoint: &RegistryEndpoint, url: Url) -> Result<TransportResponse> {
        let context = format!("GET {}", url);
        tracing::debug!("{}", context);
        self.send(self.client.get(url), endpoint, &context).await
    }

    async fn post(
        &self,
        endpoint: &RegistryEndpoint,
        url: Url,
        body: Vec<u8>,
    ) -> Result<TransportResponse> {
        let context = format!("POST {}", url);
        tracing::debug!("{}", context);
        self.send(self.client.post(url).body(body), endpoint, &context)
            .await
    }
}
