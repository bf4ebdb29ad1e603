//! Error types used by the crate.

use thiserror::Error;

/// Portolan error type.
#[derive(Debug, Error)]
pub enum PortolanError {
    /// I/O error (network or file).
    #[error("failed to load data")]
    Io,
    /// Error decoding data received from a remote service.
    #[error("failed to decode data: {0}")]
    Decoding(String),
    /// Item not found.
    #[error("item not found")]
    NotFound,
    /// Operation requires a map, but no map has been created yet.
    #[error("map is not created")]
    NoMap,
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<reqwest::Error> for PortolanError {
    fn from(_value: reqwest::Error) -> Self {
        Self::Io
    }
}

impl From<serde_json::Error> for PortolanError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decoding(value.to_string())
    }
}
