//! Standardized error handling for registry HTTP calls

use crate::error::MigrateError;
use reqwest::StatusCode;

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> MigrateError {
        if error.is_timeout() {
            MigrateError::Network(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            MigrateError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.is_body() || error.is_decode() {
            MigrateError::Network(format!("Failed to read {} response body: {}", context, error))
        } else if error.to_string().contains("certificate") {
            MigrateError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            MigrateError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Describes a non-success registry status for log output.
///
/// Registry responses are never rejected on status alone; callers log this and
/// let the body speak for itself.
pub fn describe_status(status: StatusCode, operation: &str) -> String {
    match status.as_u16() {
        401 => format!("Unauthorized to perform {}", operation),
        403 => format!("Forbidden: insufficient permissions for {}", operation),
        404 => format!("Resource not found for {}", operation),
        409 => format!("Conflict during {}: resource already exists", operation),
        429 => format!("Rate limited during {}", operation),
        500 => format!("Registry server error during {}", operation),
        502 | 503 => format!("Registry unavailable for {}", operation),
        _ => format!("{} returned status {}", operation, status),
    }
}
