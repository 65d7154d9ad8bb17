//! Internal error types for HTTP adapters.
//!
//! These errors are internal to `parley-http` and are mapped to core port
//! errors at the boundary.

use parley_core::{ResponseError, SynthesisError};
use thiserror::Error;

/// Result type alias for HTTP adapter operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors raised while talking to an HTTP endpoint.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The endpoint answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The endpoint answered with something we could not use.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl HttpError {
    fn is_timeout(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_timeout())
    }
}

impl From<HttpError> for ResponseError {
    fn from(err: HttpError) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err {
            HttpError::Status { status, .. } => Self::Status { status },
            HttpError::Network(e) => Self::Transport(e.to_string()),
            HttpError::InvalidUrl(e) => Self::Transport(e.to_string()),
            HttpError::InvalidResponse { message } => Self::InvalidResponse(message),
            HttpError::JsonParse(e) => Self::InvalidResponse(e.to_string()),
        }
    }
}

impl From<HttpError> for SynthesisError {
    fn from(err: HttpError) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err {
            HttpError::Status { status, .. } => Self::Status { status },
            other => Self::Transport(other.to_string()),
        }
    }
}
