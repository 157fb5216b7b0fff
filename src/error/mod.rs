//! Error types and handlers for migration operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// Invalid options, detected before any network activity
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Connection, TLS or timeout failures
    #[error("Network error: {0}")]
    Network(String),
    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
    /// External container CLI failed to start or exited non-zero
    #[error("Command `{command}` failed: {reason}")]
    Process { command: String, reason: String },
    /// A URL built during the run could not be parsed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// The run context was cancelled
    #[error("Operation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MigrateError::Cancelled)
    }

    pub fn process(command: impl Into<String>, reason: impl Into<String>) -> Self {
        MigrateError::Process {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        handlers::NetworkErrorHandler::handle_network_error(&err, "request")
    }
}
