//! Error types for the orchestrator

use thiserror::Error;

/// Main error type for the orchestrator.
///
/// `CommandFailed` is a business-level failure (the remote command ran and
/// exited non-zero); `ExecError` means the channel itself broke mid-command.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    ValidationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Exec error: {0}")]
    ExecError(String),

    #[error("{0}")]
    CommandFailed(String),

    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("{0}")]
    PreconditionError(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        OrchestratorError::Internal(err.to_string())
    }
}
