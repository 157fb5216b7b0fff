//! Command line interface module
//!
//! This module provides argument parsing and validation, and the runner that
//! wires logging, signal handling and the migration controller together.

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
