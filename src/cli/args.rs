//! Command-line argument parsing

use crate::config::{MigrateOptions, RegistryEndpoint};
use crate::error::Result;
use crate::logging::Verbosity;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "harbor-migrate")]
#[command(about = "Migrate projects and images from one Harbor registry to another")]
#[command(
    long_about = "Creates every project of the source registry on the target registry, \
then pulls every repository from the source, re-tags it and pushes all tags to the target \
using a local container CLI."
)]
#[command(version)]
pub struct Args {
    /// Source registry URL
    #[arg(long = "source-url", env = "HARBOR_MIGRATE_SOURCE_URL", default_value = "https://pcr.io")]
    pub source_url: String,

    /// Source registry username
    #[arg(long = "source-user", env = "HARBOR_MIGRATE_SOURCE_USER", default_value = "admin")]
    pub source_user: String,

    /// Source registry password
    #[arg(long = "source-pass", env = "HARBOR_MIGRATE_SOURCE_PASS", hide_env_values = true)]
    pub source_pass: String,

    /// Target registry URL
    #[arg(long = "target-url", env = "HARBOR_MIGRATE_TARGET_URL", default_value = "https://3.pcr.io")]
    pub target_url: String,

    /// Target registry username
    #[arg(long = "target-user", env = "HARBOR_MIGRATE_TARGET_USER", default_value = "admin")]
    pub target_user: String,

    /// Target registry password
    #[arg(long = "target-pass", env = "HARBOR_MIGRATE_TARGET_PASS", hide_env_values = true)]
    pub target_pass: String,

    /// Container CLI used to pull, tag and push images
    #[arg(long = "container-cli", env = "HARBOR_MIGRATE_CONTAINER_CLI", default_value = "docker")]
    pub container_cli: String,

    /// Enable verbose output
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(long = "quiet", short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// Builds validated run options; fails on malformed URLs or identical
    /// source and target.
    pub fn to_options(&self) -> Result<MigrateOptions> {
        let source = RegistryEndpoint::parse(&self.source_url, &self.source_user, &self.source_pass)?;
        let target = RegistryEndpoint::parse(&self.target_url, &self.target_user, &self.target_pass)?;

        let options = MigrateOptions::new(source, target).with_container_cli(self.container_cli.trim());
        options.validate()?;
        Ok(options)
    }
}
