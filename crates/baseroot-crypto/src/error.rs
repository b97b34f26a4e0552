//! # Cryptographic Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors from hashing, key loading and signing.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A file could not be read (missing, unreadable, permission denied).
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key material is malformed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Signature bytes are malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Signature did not verify.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Key source not configured.
    #[error("signing key not configured: {0}")]
    NotConfigured(String),
}
