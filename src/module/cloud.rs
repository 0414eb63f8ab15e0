//! Google Drive connectivity.
//!
pub mod auth;
pub mod drive;

use thiserror::Error;

/// Errors raised by the cloud session and file transfer code.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("drive api error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The remote record addressed by id is gone (HTTP 404).
    #[error("remote file not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token error: {0}")]
    Token(String),

    #[error("no destination folder mapped for device '{0}'")]
    UnmappedDevice(String),
}
