//! Repository operations for the Harbor v2.0 API
//!
//! Implements repository discovery:
//! - Repository listing (GET /api/v2.0/repositories, paginated)

use crate::common::RunContext;
use crate::config::RegistryEndpoint;
use crate::error::Result;
use crate::registry::paginate::{PageFetcher, PageHandler, PageOutcome, decode_page};
use crate::registry::transport::RegistryTransport;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const REPOSITORIES_PATH: &str = "/api/v2.0/repositories";

/// A repository as listed by the registry; `name` is `project/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

#[derive(Clone)]
pub struct RepositoryOperations {
    fetcher: PageFetcher,
}

impl RepositoryOperations {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self {
            fetcher: PageFetcher::new(transport),
        }
    }

    /// Lists every repository name on `registry`, in page order.
    ///
    /// Names are not deduplicated. On error nothing is returned, not even the
    /// names gathered from earlier pages.
    pub async fn fetch_image_names(
        &self,
        ctx: &RunContext,
        registry: &RegistryEndpoint,
    ) -> Result<Vec<String>> {
        let mut collector = NameCollector::default();
        let pages = self
            .fetcher
            .fetch_pages(ctx, registry, REPOSITORIES_PATH, &mut collector)
            .await?;

        tracing::info!(
            repositories = collector.names.len(),
            pages,
            "Found repositories on {}",
            registry.host()
        );
        Ok(collector.names)
    }
}

#[derive(Default)]
struct NameCollector {
    names: Vec<String>,
}

#[async_trait]
impl PageHandler for NameCollector {
    async fn handle_page(&mut self, _ctx: &RunContext, body: &[u8]) -> Result<PageOutcome> {
        let repositories: Vec<Repository> = decode_page(body)?;
        if repositories.is_empty() {
            return Ok(PageOutcome::Done);
        }

        self.names
            .extend(repositories.into_iter().map(|repository| repository.name));
        Ok(PageOutcome::Continue)
    }
}
