//! Client error types

use thiserror::Error;

/// Failure of a single `get`/`post` call
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with a non-2xx status
    #[error("{status} {status_text}: {body_text}")]
    Request {
        status: u16,
        status_text: String,
        body_text: String,
    },

    /// A 2xx body that is not the expected JSON
    #[error("Failed to parse response: {0}")]
    Parse(#[source] serde_json::Error),

    /// Request body could not be encoded
    #[error("Failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No response was received at all
    #[error("Network error: {0}")]
    Network(#[from] TransportError),
}

/// Transport-level failure (DNS, refused connection, broken body stream)
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err.to_string())
    }
}
