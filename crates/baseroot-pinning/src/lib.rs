//! # baseroot-pinning: IPFS Pinning Clients
//!
//! Uploads file bytes to an IPFS pinning service and returns the content
//! identifier (CID) the network assigned. Two backends:
//!
//! - **Pinata** via its REST pinning API (`pinFileToIPFS`), downloads via
//!   the Pinata gateway.
//! - **Kubo** via a local node's RPC API (`/api/v0/add`, `/api/v0/cat`).
//!
//! Every call creates a new pin. There is no client-side cache, no
//! deduplication and no retry: pinning is billable and not idempotent, so
//! failures are logged and returned to the caller unchanged.

pub mod config;
pub mod error;
pub mod kubo;
pub mod pinata;

pub use config::{BackendConfig, KuboConfig, PinataAuth, PinataConfig, PinningBackend, PinningConfig};
pub use error::PinningError;
pub use kubo::KuboClient;
pub use pinata::PinataClient;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use baseroot_core::ContentId;

/// An IPFS pinning service.
#[async_trait]
pub trait Pinner: Send + Sync {
    /// Upload `bytes` and pin them under `name`. Returns the CID.
    async fn pin(&self, name: &str, bytes: Vec<u8>) -> Result<ContentId, PinningError>;

    /// Remove a pin. Used to compensate a failed anchor.
    async fn unpin(&self, cid: &ContentId) -> Result<(), PinningError>;

    /// Download the content behind `cid`.
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, PinningError>;

    /// Short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;
}

/// Read the file at `path` and pin it, named after the file.
pub async fn pin_file(pinner: &dyn Pinner, path: impl AsRef<Path>) -> Result<ContentId, PinningError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| PinningError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    pinner.pin(&name, bytes).await
}

/// Build the configured backend.
pub fn build_pinner(config: &PinningConfig) -> Result<Arc<dyn Pinner>, PinningError> {
    Ok(match &config.backend {
        BackendConfig::Pinata(cfg) => Arc::new(PinataClient::new(cfg.clone())?),
        BackendConfig::Kubo(cfg) => Arc::new(KuboClient::new(cfg.clone())?),
    })
}

/// Validate a CID string returned by `endpoint`.
pub(crate) fn parse_cid(endpoint: &str, raw: String) -> Result<ContentId, PinningError> {
    ContentId::new(raw).map_err(|source| PinningError::InvalidCid {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Turn a non-2xx response into [`PinningError::ApiError`].
pub(crate) async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, PinningError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::warn!(endpoint, status, "pinning service returned an error");
    Err(PinningError::ApiError {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
