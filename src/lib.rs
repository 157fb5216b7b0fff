//! Harbor Migrate Library
//!
//! Copies the projects of one Harbor registry onto another, then replicates
//! every image repository with all of its tags.

pub mod cli;
pub mod common;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod registry;
pub mod transfer;

pub use common::RunContext;
pub use config::{MigrateOptions, RegistryEndpoint};
pub use controller::{MigrationController, MigrationSummary};
pub use error::{MigrateError, Result};
