use thiserror::Error;

/// Application-wide error types for Hermes.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP-level failure (malformed response, body read failure).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error (connect refused, DNS failure, reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// URL could not be parsed or uses a disallowed scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            AppError::InvalidUrl(_) => false,
        }
    }
}
