//! Pinning client error types.

use std::path::PathBuf;

/// Errors from pinning service calls.
#[derive(Debug, thiserror::Error)]
pub enum PinningError {
    /// HTTP transport error (connect, timeout, TLS).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The pinning service returned a non-2xx status.
    #[error("pinning service {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service answered 2xx but the CID it returned is unusable.
    #[error("pinning service {endpoint} returned an invalid CID: {source}")]
    InvalidCid {
        endpoint: String,
        source: baseroot_core::ValidationError,
    },
    /// Local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl PinningError {
    /// HTTP status returned by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
