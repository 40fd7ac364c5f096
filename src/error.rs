//! Error types shared by the catalog client and the playback controller.

use thiserror::Error;

/// A page or preview fetch against the catalog service failed.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected shape.
    #[error("malformed catalog response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            CatalogError::Status(status.as_u16())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

/// Failure scoped to a single preview request.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("preview fetch failed: {0}")]
    Fetch(#[from] CatalogError),

    #[error("audio output failed: {0}")]
    Output(String),

    #[error("audio output unavailable")]
    Unavailable,
}
