//! Error types for the fleet manager

use thiserror::Error;

/// Main error type for the fleet manager
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream API error ({status}): {message}")]
    UpstreamApi { status: u16, message: String },

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl ManagerError {
    /// Build an error from a non-success upstream response.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamApi {
            status,
            message: message.into(),
        }
    }
}
