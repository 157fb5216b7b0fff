//! Common building blocks shared across the migration pipeline

pub mod context;

pub use context::RunContext;
