//! # Content Hasher
//!
//! SHA-256 of an uploaded file. The whole file is buffered, so memory use
//! is O(file size); there is no streaming or chunking. All three entry
//! points delegate to [`baseroot_core::sha256_digest()`].

use std::path::Path;

use baseroot_core::{sha256_digest, ContentDigest};

use crate::error::CryptoError;

/// Digest of an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    sha256_digest(data)
}

/// Read the file at `path` into memory and return its SHA-256 digest.
///
/// Fails with [`CryptoError::Io`] if the file is missing or unreadable.
pub fn hash_file(path: impl AsRef<Path>) -> Result<ContentDigest, CryptoError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(sha256_digest(&bytes))
}

/// Async variant of [`hash_file`] for use inside request handlers.
pub async fn hash_file_async(path: impl AsRef<Path>) -> Result<ContentDigest, CryptoError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "hashed file");
    Ok(sha256_digest(&bytes))
}
