//! Error taxonomy of the transport client.
//!
//! Malformed payloads are *not* errors: the normalizer absorbs them into
//! defaults. What remains is the transport itself: a non-success status with
//! the best human-readable message the body offered, a network-level failure,
//! or a base endpoint that never made sense to begin with.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-success response status. `Display` is exactly the resolved message.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// Connection, timeout or body-read failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base endpoint is not a usable HTTP URL.
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Response status, when the backend got far enough to send one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(source) => source.status(),
            ClientError::BaseUrl(_) => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
