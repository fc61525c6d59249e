//! Backend client error types

use thiserror::Error;

/// Errors talking to the content backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the bearer token
    #[error("Backend rejected the session token")]
    Unauthorized,

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// A request URL could not be built from the given input
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the response could not be read
    #[error("Backend request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl BackendError {
    /// Message sent by the backend, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}
