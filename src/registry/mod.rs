//! Registry module for Harbor API interactions
//!
//! This module provides the HTTP transport, the paginated list walker and the
//! project/repository operations built on top of them.

pub mod operations;
pub mod paginate;
pub mod transport;

pub use operations::{ProjectOperations, RepositoryOperations};
pub use paginate::{PageFetcher, PageHandler, PageOutcome};
pub use transport::{HttpTransport, RegistryTransport, TransportConfig, TransportResponse};
