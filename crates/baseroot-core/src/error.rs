//! # Validation Errors
//!
//! Errors raised when constructing the core newtypes from untrusted text
//! (request fields, RPC responses, configuration values).

use thiserror::Error;

/// A value failed validation while being parsed into a core type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Digest text is not 64 hex characters.
    #[error("invalid content digest: {0}")]
    InvalidDigest(String),

    /// Content identifier is empty or contains whitespace/control characters.
    #[error("invalid content identifier: {0}")]
    InvalidCid(String),

    /// Public key is not valid base58 or does not decode to 32 bytes.
    #[error("invalid public key: {0}")]
    InvalidPubkey(String),

    /// Upload identifier is not a UUID.
    #[error("invalid upload id: {0}")]
    InvalidUploadId(String),
}
