use thiserror::Error;

/// Application-wide error types for hoops.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// HTTP request failed (fetching a page).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request or persist call timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid configuration (bad limits, malformed selectors, missing env vars).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Document could not be turned into records.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// The surrounding run was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            AppError::DatabaseError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("pool timed out")
                    || msg.contains("connection")
                    || msg.contains("broken pipe")
                    || msg.contains("deadlock")
            }
            _ => false,
        }
    }
}
