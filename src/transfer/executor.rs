//! Image transfer executor: login, pull, re-tag and push through a container CLI

use crate::common::RunContext;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Moves image bytes between registries.
///
/// References are `host/project/image` without a tag; every operation acts on
/// all tags of the reference.
#[async_trait]
pub trait ImageTransfer: Send + Sync {
    async fn login(&self, ctx: &RunContext, host: &str, username: &str, password: &str) -> Result<()>;

    /// Pulls every tag of `reference`.
    async fn pull(&self, ctx: &RunContext, reference: &str) -> Result<()>;

    /// Tags every locally present tag of `source` as the same tag of `target`.
    async fn tag_all(&self, ctx: &RunContext, source: &str, target: &str) -> Result<()>;

    /// Pushes every tag of `reference`.
    async fn push(&self, ctx: &RunContext, reference: &str) -> Result<()>;
}

/// [`ImageTransfer`] that runs `docker` (or a compatible CLI such as `podman`).
///
/// One process per call; stdout and stderr are inherited so progress shows up
/// in the terminal.
#[derive(Debug, Clone)]
pub struct ContainerCli {
    program: String,
}

impl ContainerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, ctx: &RunContext, args: &[&str]) -> Result<()> {
        self.execute(ctx, args, None, false).await.map(|_| ())
    }

    /// Spawns the CLI and waits for it, killing it if `ctx` is cancelled.
    ///
    /// `input` is written to stdin, which is then closed. With `capture` the
    /// child's stdout is returned instead of inherited.
    async fn execute(
        &self,
        ctx: &RunContext,
        args: &[&str],
        input: Option<&str>,
        capture: bool,
    ) -> Result<Vec<u8>> {
        if ctx.is_cancelled() {
            return Err(MigrateError::Cancelled);
        }

        let command_line = format!("{} {}", self.program, args.join(" "));
        tracing::debug!("Executing command: {}", command_line);

        let mut command = Command::new(&self.program);
        command.args(args);
        // Own process group: a terminal Ctrl+C reaches only this process, which
        // then kills the child through `ctx`.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(if capture { Stdio::piped() } else { Stdio::inherit() })
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MigrateError::process(&command_line, format!("failed to start: {}", e)))?;

        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();

        let completion = async {
            if let (Some(pipe), Some(input)) = (stdin.as_mut(), input) {
                pipe.write_all(input.as_bytes()).await?;
            }
            drop(stdin.take());

            let mut output = Vec::new();
            if let Some(pipe) = stdout.as_mut() {
                pipe.read_to_end(&mut output).await?;
            }
            let status = child.wait().await?;
            Ok::<(ExitStatus, Vec<u8>), MigrateError>((status, output))
        };

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            result = completion => Some(result),
        };

        match outcome {
            Some(result) => {
                let (status, output) = result?;
                if status.success() {
                    Ok(output)
                } else {
                    Err(exit_error(ctx, command_line, status))
                }
            }
            None => {
                tracing::warn!("Terminating `{}` after cancellation", command_line);
                if let Err(e) = child.start_kill() {
                    tracing::debug!("Kill of `{}` failed: {}", command_line, e);
                }
                // Reap the child so no zombie outlives the run
                let _ = child.wait().await;
                Err(MigrateError::Cancelled)
            }
        }
    }
}

#[async_trait]
impl ImageTransfer for ContainerCli {
    async fn login(&self, ctx: &RunContext, host: &str, username: &str, password: &str) -> Result<()> {
        tracing::info!("Logging in to {} as {}", host, username);
        self.execute(
            ctx,
            &["login", host, "--username", username, "--password-stdin"],
            Some(password),
            false,
        )
        .await
        .map(|_| ())
    }

    async fn pull(&self, ctx: &RunContext, reference: &str) -> Result<()> {
        self.run(ctx, &["pull", "--all-tags", reference]).await
    }

    async fn tag_all(&self, ctx: &RunContext, source: &str, target: &str) -> Result<()> {
        let listing = self
            .execute(ctx, &["images", source, "--format", "{{.Tag}}"], None, true)
            .await?;
        let tags = parse_tags(&listing);
        if tags.is_empty() {
            tracing::warn!("No local tags found for {}", source);
        }

        for tag in &tags {
            let from = format!("{}:{}", source, tag);
            let to = format!("{}:{}", target, tag);
            self.run(ctx, &["tag", &from, &to]).await?;
        }

        tracing::debug!(tags = tags.len(), "Tagged {} as {}", source, target);
        Ok(())
    }

    async fn push(&self, ctx: &RunContext, reference: &str) -> Result<()> {
        self.run(ctx, &["push", "--all-tags", reference]).await
    }
}

/// A child that failed while the run was being cancelled counts as cancelled.
fn exit_error(ctx: &RunContext, command_line: String, status: ExitStatus) -> MigrateError {
    if ctx.is_cancelled() {
        tracing::debug!("`{}` exited with {} during cancellation", command_line, status);
        return MigrateError::Cancelled;
    }
    MigrateError::process(command_line, format!("exited with {}", status))
}

/// One tag per line, skipping dangling `<none>` entries and repeats.
fn parse_tags(listing: &[u8]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for line in String::from_utf8_lossy(listing).lines() {
        let tag = line.trim().trim_matches('\'');
        if tag.is_empty() || tag == "<none>" || tags.iter().any(|t| t == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}
