//! Client for the Pinata pinning API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/pinning/pinFileToIPFS` | Upload and pin a file |
//! | DELETE | `/pinning/unpin/{cid}` | Remove a pin |
//! | GET    | `{gateway}/ipfs/{cid}` | Download pinned content |
//!
//! Pins are created as CIDv0, matching what the service has always
//! anchored.

use std::time::Duration;

use async_trait::async_trait;
use baseroot_core::ContentId;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PinataAuth, PinataConfig};
use crate::error::PinningError;
use crate::{check_status, parse_cid, Pinner};

/// `pinataMetadata` form field.
#[derive(Debug, Serialize)]
struct PinataMetadata<'a> {
    name: &'a str,
}

/// `pinataOptions` form field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinataOptions {
    cid_version: u8,
}

/// Response of `pinFileToIPFS`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PinFileResponse {
    pub ipfs_hash: String,
    #[serde(default)]
    pub pin_size: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Set when Pinata already held this content for the account.
    #[serde(default)]
    pub is_duplicate: Option<bool>,
}

/// Pinata REST client.
#[derive(Debug, Clone)]
pub struct PinataClient {
    http: reqwest::Client,
    gateway: reqwest::Client,
    api_url: url::Url,
    gateway_url: url::Url,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> Result<Self, PinningError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(auth_headers(&config.auth)?)
            .build()
            .map_err(|e| PinningError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        // Credentials are never sent to the gateway.
        let gateway = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PinningError::Http {
                endpoint: "gateway_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            gateway,
            api_url: config.api_url,
            gateway_url: config.gateway_url,
        })
    }

    /// Upload and pin, returning the full Pinata response.
    ///
    /// Calls `POST {api}/pinning/pinFileToIPFS`.
    pub async fn pin_file_to_ipfs(
        &self,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<PinFileResponse, PinningError> {
        let endpoint = "POST /pinning/pinFileToIPFS";
        let url = join(&self.api_url, "pinning/pinFileToIPFS");
        let size = bytes.len();

        let metadata = serde_json::to_string(&PinataMetadata { name })
            .unwrap_or_else(|_| "{}".to_string());
        let options = serde_json::to_string(&PinataOptions { cid_version: 0 })
            .unwrap_or_else(|_| "{}".to_string());
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()),
            )
            .text("pinataMetadata", metadata)
            .text("pinataOptions", options);

        tracing::debug!(endpoint, name, size, "pinning file");
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint, error = %e, "pinning request failed");
                PinningError::Http {
                    endpoint: endpoint.into(),
                    source: e,
                }
            })?;
        let resp = check_status(endpoint, resp).await?;

        resp.json().await.map_err(|e| PinningError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }
}

#[async_trait]
impl Pinner for PinataClient {
    async fn pin(&self, name: &str, bytes: Vec<u8>) -> Result<ContentId, PinningError> {
        let endpoint = "POST /pinning/pinFileToIPFS";
        let resp = self.pin_file_to_ipfs(name, bytes).await?;
        let cid = parse_cid(endpoint, resp.ipfs_hash)?;
        tracing::info!(
            cid = %cid,
            pin_size = resp.pin_size,
            duplicate = resp.is_duplicate.unwrap_or(false),
            "pinned to Pinata"
        );
        Ok(cid)
    }

    /// Calls `DELETE {api}/pinning/unpin/{cid}`.
    async fn unpin(&self, cid: &ContentId) -> Result<(), PinningError> {
        let endpoint = format!("DELETE /pinning/unpin/{cid}");
        let url = join(&self.api_url, &format!("pinning/unpin/{cid}"));

        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| PinningError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        check_status(&endpoint, resp).await?;
        tracing::info!(cid = %cid, "unpinned from Pinata");
        Ok(())
    }

    /// Calls `GET {gateway}/ipfs/{cid}`.
    async fn fetch(&self, cid: &ContentId) -> Result<Vec<u8>, PinningError> {
        let endpoint = format!("GET /ipfs/{cid}");
        let url = join(&self.gateway_url, &format!("ipfs/{cid}"));

        let resp = self
            .gateway
            .get(&url)
            .send()
            .await
            .map_err(|e| PinningError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let resp = check_status(&endpoint, resp).await?;
        let bytes = resp.bytes().await.map_err(|e| PinningError::Http {
            endpoint,
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    fn backend_name(&self) -> &'static str {
        "pinata"
    }
}

fn auth_headers(auth: &PinataAuth) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    match auth {
        PinataAuth::Jwt(jwt) => {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", jwt.as_str()))
                .map_err(|_| ConfigError::InvalidHeader("PINATA_JWT"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        PinataAuth::ApiKey { key, secret } => {
            let mut key = HeaderValue::from_str(key.as_str())
                .map_err(|_| ConfigError::InvalidHeader("PINATA_API_KEY"))?;
            key.set_sensitive(true);
            let mut secret = HeaderValue::from_str(secret.as_str())
                .map_err(|_| ConfigError::InvalidHeader("PINATA_SECRET_API_KEY"))?;
            secret.set_sensitive(true);
            headers.insert("pinata_api_key", key);
            headers.insert("pinata_secret_api_key", secret);
        }
    }
    Ok(headers)
}

/// `base` + `path` without doubling or dropping the separator.
pub(crate) fn join(base: &url::Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}
