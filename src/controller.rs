//! Run controller: project migration, then image transfer

use crate::common::RunContext;
use crate::config::MigrateOptions;
use crate::error::Result;
use crate::logging::format_duration;
use crate::registry::{ProjectOperations, RegistryTransport, RepositoryOperations};
use crate::transfer::{ImageTransfer, ImageTransferOrchestrator};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Counts from a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub projects: usize,
    pub repositories: usize,
}

pub struct MigrationController {
    projects: ProjectOperations,
    images: ImageTransferOrchestrator,
}

impl MigrationController {
    pub fn new(transport: Arc<dyn RegistryTransport>, executor: Arc<dyn ImageTransfer>) -> Self {
        Self {
            projects: ProjectOperations::new(transport.clone()),
            images: ImageTransferOrchestrator::new(RepositoryOperations::new(transport), executor),
        }
    }

    /// Migrates projects, then images, within a child of `ctx`.
    ///
    /// The child context is cancelled when this returns, successfully or not,
    /// so nothing started by the run keeps going afterwards. Image transfer
    /// never starts if project migration failed.
    pub async fn run(&self, ctx: &RunContext, options: &MigrateOptions) -> Result<MigrationSummary> {
        let span = tracing::info_span!("migrate", run_id = %Uuid::new_v4());
        self.run_phases(ctx, options).instrument(span).await
    }

    async fn run_phases(&self, ctx: &RunContext, options: &MigrateOptions) -> Result<MigrationSummary> {
        tracing::info!("harbor-migrate version {}", env!("CARGO_PKG_VERSION"));
        tracing::info!(
            "Migrating {} => {}",
            options.source.url,
            options.target.url
        );

        let run_ctx = ctx.child();
        let _cancel_on_return = run_ctx.cancel_on_drop();

        let started = Instant::now();
        tracing::info!("transfer projects start");
        let projects = self
            .projects
            .transfer_projects(&run_ctx, &options.source, &options.target)
            .await?;
        tracing::info!(
            projects,
            "transfer projects end ({})",
            format_duration(started.elapsed())
        );

        let started = Instant::now();
        tracing::info!("transfer images start");
        let repositories = self
            .images
            .transfer_images(&run_ctx, &options.source, &options.target)
            .await?;
        tracing::info!(
            repositories,
            "transfer images end ({})",
            format_duration(started.elapsed())
        );

        Ok(MigrationSummary {
            projects,
            repositories,
        })
    }
}
