//! Sequencing of image replication from source registry to target registry

use crate::common::RunContext;
use crate::config::RegistryEndpoint;
use crate::error::Result;
use crate::registry::RepositoryOperations;
use crate::transfer::executor::ImageTransfer;
use std::sync::Arc;
use std::time::Instant;

pub struct ImageTransferOrchestrator {
    repositories: RepositoryOperations,
    executor: Arc<dyn ImageTransfer>,
}

impl ImageTransferOrchestrator {
    pub fn new(repositories: RepositoryOperations, executor: Arc<dyn ImageTransfer>) -> Self {
        Self {
            repositories,
            executor,
        }
    }

    /// Replicates every repository of `source` onto `target`, one at a time.
    ///
    /// Discovery runs first, then both hosts are logged in, then each
    /// repository is pulled, re-tagged and pushed. The first failure of any
    /// step stops the whole transfer. Returns the number of repositories
    /// replicated.
    pub async fn transfer_images(
        &self,
        ctx: &RunContext,
        source: &RegistryEndpoint,
        target: &RegistryEndpoint,
    ) -> Result<usize> {
        let names = self.repositories.fetch_image_names(ctx, source).await?;

        let source_host = source.host();
        let target_host = target.host();
        self.executor
            .login(ctx, &source_host, &source.username, &source.password)
            .await?;
        self.executor
            .login(ctx, &target_host, &target.username, &target.password)
            .await?;

        let total = names.len();
        for (index, name) in names.iter().enumerate() {
            let source_ref = format!("{}/{}", source_host, name);
            let target_ref = format!("{}/{}", target_host, name);
            let started = Instant::now();

            tracing::info!(
                "[{}/{}] transfer {} => {}",
                index + 1,
                total,
                source_ref,
                target_ref
            );
            self.executor.pull(ctx, &source_ref).await?;
            self.executor.tag_all(ctx, &source_ref, &target_ref).await?;
            self.executor.push(ctx, &target_ref).await?;

            tracing::debug!(
                elapsed = %crate::logging::format_duration(started.elapsed()),
                "Transferred {}",
                name
            );
        }

        Ok(total)
    }
}
