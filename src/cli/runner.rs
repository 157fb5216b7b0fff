//! Runner wiring the command line to the migration controller

use crate::cli::args::Args;
use crate::common::RunContext;
use crate::controller::{MigrationController, MigrationSummary};
use crate::error::{MigrateError, Result};
use crate::logging;
use crate::registry::{HttpTransport, TransportConfig};
use crate::transfer::ContainerCli;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

/// Exit status for a run stopped by SIGINT/SIGTERM
pub const EXIT_CANCELLED: u8 = 130;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;

pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    pub async fn run(self) -> ExitCode {
        logging::init(self.args.verbosity());

        let start_time = Instant::now();
        let result = self.execute().await;

        match &result {
            Ok(summary) => tracing::info!(
                "Migration completed: {} projects, {} repositories in {}",
                summary.projects,
                summary.repositories,
                logging::format_duration(start_time.elapsed())
            ),
            Err(MigrateError::Cancelled) => tracing::info!("Migration cancelled"),
            Err(err @ MigrateError::Configuration(_)) => {
                tracing::error!("Validate options failed: {}", err)
            }
            Err(err) => tracing::error!("Migration failed: {}", err),
        }

        ExitCode::from(exit_code(&result))
    }

    async fn execute(&self) -> Result<MigrationSummary> {
        let options = self.args.to_options()?;

        let transport = Arc::new(HttpTransport::new(&TransportConfig::default())?);
        let executor = Arc::new(ContainerCli::new(options.container_cli.clone()));
        let controller = MigrationController::new(transport, executor);

        let ctx = RunContext::new();
        let watcher = tokio::spawn(cancel_on_signal(ctx.clone()));

        let result = controller.run(&ctx, &options).await;
        watcher.abort();
        settle(&ctx, result)
    }
}

/// Reports any failure of a run whose context was cancelled as a cancellation.
fn settle<T>(ctx: &RunContext, result: Result<T>) -> Result<T> {
    match result {
        Err(err) if ctx.is_cancelled() && !err.is_cancelled() => {
            tracing::debug!("Error after cancellation: {}", err);
            Err(MigrateError::Cancelled)
        }
        other => other,
    }
}

/// Maps the outcome of a run to a process exit status.
pub fn exit_code<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(MigrateError::Cancelled) => EXIT_CANCELLED,
        Err(MigrateError::Configuration(_)) => EXIT_CONFIG,
        Err(_) => EXIT_FAILURE,
    }
}

/// Cancels `ctx` on the first SIGINT (Ctrl+C) or SIGTERM.
async fn cancel_on_signal(ctx: RunContext) {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C), cancelling migration"),
        _ = terminate => tracing::info!("Received SIGTERM, cancelling migration"),
    }

    ctx.cancel();
}
