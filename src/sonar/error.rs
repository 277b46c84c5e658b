//! Backend Error Types

use thiserror::Error;

/// Errors from the analysis backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Request never produced a response (DNS, connect, timeout)
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Response body was not the expected JSON
    #[error("Cannot decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl BackendError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport { .. } => true,
            BackendError::Status { status, .. } => *status == 429 || *status >= 500,
            BackendError::Decode { .. } => false,
        }
    }
}
