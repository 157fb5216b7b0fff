#![allow(dead_code)]

use async_trait::async_trait;
use harbor_migrate::error::{MigrateError, Result};
use harbor_migrate::registry::{HttpTransport, RegistryTransport, TransportConfig, TransportResponse};
use harbor_migrate::transfer::ImageTransfer;
use harbor_migrate::{RegistryEndpoint, RunContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::MockServer;

pub const SOURCE_USER: &str = "admin";
pub const SOURCE_PASS: &str = "s3cret";
pub const TARGET_USER: &str = "robot";
pub const TARGET_PASS: &str = "t0ken";

pub fn source_endpoint(server: &MockServer) -> RegistryEndpoint {
    RegistryEndpoint::parse(&server.uri(), SOURCE_USER, SOURCE_PASS).unwrap()
}

pub fn target_endpoint(server: &MockServer) -> RegistryEndpoint {
    RegistryEndpoint::parse(&server.uri(), TARGET_USER, TARGET_PASS).unwrap()
}

pub fn http_transport() -> Arc<dyn RegistryTransport> {
    Arc::new(HttpTransport::new(&TransportConfig::default()).unwrap())
}

/// Records executor calls as strings such as `pull host/ns/img`.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails the call whose recorded form equals `call`.
    pub fn failing_on(call: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(call.into()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_on.as_deref() == Some(call.as_str()) {
            return Err(MigrateError::process(call, "exited with exit status: 1"));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageTransfer for RecordingExecutor {
    async fn login(&self, _ctx: &RunContext, host: &str, username: &str, _password: &str) -> Result<()> {
        self.record(format!("login {} {}", host, username))
    }

    async fn pull(&self, _ctx: &RunContext, reference: &str) -> Result<()> {
        self.record(format!("pull {}", reference))
    }

    async fn tag_all(&self, _ctx: &RunContext, source: &str, target: &str) -> Result<()> {
        self.record(format!("tag {} {}", source, target))
    }

    async fn push(&self, _ctx: &RunContext, reference: &str) -> Result<()> {
        self.record(format!("push {}", reference))
    }
}

/// Real HTTP transport whose `nth` POST (1-based) fails with a network error
/// instead of being sent.
pub struct FailingPostTransport {
    inner: Arc<dyn RegistryTransport>,
    fail_at: usize,
    posts: AtomicUsize,
}

impl FailingPostTransport {
    pub fn new(fail_at: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: http_transport(),
            fail_at,
            posts: AtomicUsize::new(0),
        })
    }

    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryTransport for FailingPostTransport {
    async fn get(&self, endpoint: &RegistryEndpoint, url: Url) -> Result<TransportResponse> {
        self.inner.get(endpoint, url).await
    }

    async fn post(&self, endpoint: &RegistryEndpoint, url: Url, body: Vec<u8>) -> Result<TransportResponse> {
        let attempt = self.posts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_at {
            return Err(MigrateError::Network("connection reset by peer".to_string()));
        }
        self.inner.post(endpoint, url, body).await
    }
}
