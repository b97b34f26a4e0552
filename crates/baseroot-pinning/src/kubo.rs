//! Client for a local Kubo (go-ipfs) node RPC API.
//!
//! The Kubo RPC API takes `POST` for every call, including reads.

use std::time::Duration;

use async_trait::async_trait;
use baseroot_core::ContentId;
use serde::Deserialize;

use crate::config::KuboConfig;
use crate::error::PinningError;
use crate::pinata::join;
use crate::{check_status, parse_cid, Pinner};

/// Response of `/api/v0/add`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddResponse {
    pub name: String,
    pub hash: String,
    #[serde(default)]
    pub size: Option<String>,
}

/// Kubo RPC client.
#[derive(Debug, Clone)]
pub struct KuboClient {
    http: reqwest::Client,
    api_url: url::Url,
}

impl KuboClient {
    pub fn new(config: KuboConfig) -> Result<Self, PinningError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PinningError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            api_url: config.api_url,
        })
    }

    async fn post(&self, endpoint: &str, url: &str) -> Result<reqwest::Response, PinningError> {
        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| PinningError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        check_status(endpoint, resp).await
    }
}

#[async_trait]
impl Pinner for KuboClient {
    /// Calls `POST {api}/api/v0/add?cid-version=0&pin=true`.
    async fn pin(&self, name: &str, bytes: Vec<u8>) -> Result<ContentId, PinningError> {
        let endpoint = "POST /api/v0/add";
        let url = join(&self.api_url, "api/v0/add?cid-version=0&pin=true");
        let size = bytes.len();

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()),
        );

        tracing::debug!(endpoint, name, size, "adding file to Kubo");
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint, error = %e, "Kubo add failed");
                PinningError::Http {
                    endpoint: endpoint.into(),
                    source: e,
                }
            })?;
        let resp = check_status(endpoint, resp).await?;
        let added: AddResponse = resp.json().await.map_err(|e| PinningError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let cid = parse_cid(endpoint, added.hash)?;
        tracing::info!(cid = %cid, "pinned to Kubo");
        Ok(cid)
    }

    /// Calls `POST {api}/api/v0/pin/rm?arg={cid}`.
    async fn unpin(&self, cid: &ContentId) -> Result<(), PinningError> {
        let endpoint = format!("POST /api/v0/pin/rm?arg={cid}");
        let url = join(&self.api_url, &format!("api/v0/pin/rm?arg={cid}"));
        self.post(&endpoint, &url).await?;
        tracing::info!(cid = %cid, "unpinned from Kubo");
        Ok(())
    }

    /// Calls `POST {api}/api/v0/cat?arg={cid}`.
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, PinningError> {
        let endpoint = format!("POST /api/v0/cat?arg={cid}");
        let url = join(&self.api_url, &format!("api/v0/cat?arg={cid}"));
        let resp = self.post(&endpoint, &url).await?;
        let bytes = resp.bytes().await.map_err(|e| PinningError::Http {
            endpoint,
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    fn backend_name(&self) -> &'static str {
        "kubo"
    }
}
