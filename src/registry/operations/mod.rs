//! Harbor API operations used by the migration

pub mod project_operations;
pub mod repository_operations;

pub use project_operations::{Project, ProjectMetadata, ProjectOperations};
pub use repository_operations::{Repository, RepositoryOperations};
