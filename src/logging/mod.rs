//! Logging setup and output helpers
//!
//! All user-visible output goes through `tracing`. This module installs the
//! subscriber once per process, honouring the `--verbose`/`--quiet` flags and
//! `RUST_LOG`, and provides the formatting helpers used in log lines.

use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How chatty the process should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbosity` when set.
///
/// Calling this twice is harmless; the second call leaves the first subscriber
/// in place.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity == Verbosity::Verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 1 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
