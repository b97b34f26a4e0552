//! Anchor submitter error types.

use baseroot_crypto::{CryptoError, Ed25519Signature};

/// Instruction payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is {len} bytes, shorter than the {min}-byte header")]
    TooShort { len: usize, min: usize },
    #[error("unexpected opcode {0} (expected 1)")]
    WrongOpcode(u8),
    #[error("reserved bytes are not zero")]
    NonZeroReserved,
    #[error("CID bytes are not valid: {0}")]
    InvalidCid(String),
}

/// Errors from building, submitting or confirming an anchor transaction.
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    /// HTTP transport error talking to the RPC endpoint.
    #[error("HTTP error calling {method}: {source}")]
    Http {
        method: String,
        source: reqwest::Error,
    },
    /// The RPC node returned a JSON-RPC error object.
    #[error("RPC {method} failed with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    /// The transaction landed but failed on chain.
    #[error("transaction {signature} rejected: {reason}")]
    Rejected {
        signature: Ed25519Signature,
        reason: String,
    },
    /// No confirmation arrived before the deadline.
    #[error("transaction {signature} not confirmed after {waited_ms} ms")]
    ConfirmationTimeout {
        signature: Ed25519Signature,
        waited_ms: u64,
    },
    /// The transaction was sent, or may have been, but its fate could not
    /// be observed.
    #[error("transaction {signature} outcome unknown: {source}")]
    Unresolved {
        signature: Ed25519Signature,
        source: Box<AnchorError>,
    },
    /// The RPC response was not in the expected shape.
    #[error("invalid response from {method}: {detail}")]
    InvalidResponse { method: String, detail: String },
    /// Instruction data could not be built or parsed.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),
    /// The signed transaction could not be encoded.
    #[error("transaction encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    /// The signer failed.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl AnchorError {
    /// Whether the transaction may still land on chain. True whenever a
    /// send was attempted and no definite answer came back.
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, Self::ConfirmationTimeout { .. } | Self::Unresolved { .. })
    }

    pub(crate) fn unresolved(signature: Ed25519Signature, source: AnchorError) -> Self {
        Self::Unresolved {
            signature,
            source: Box::new(source),
        }
    }
}
