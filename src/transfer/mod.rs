//! Image transfer module
//!
//! The orchestrator decides what to move and in which order; the executor
//! moves the bytes.

pub mod executor;
pub mod orchestrator;

pub use executor::{ContainerCli, ImageTransfer};
pub use orchestrator::ImageTransferOrchestrator;
