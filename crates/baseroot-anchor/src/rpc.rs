//! Minimal Solana JSON-RPC client.
//!
//! Covers the three methods the submitter needs: `getLatestBlockhash`,
//! `sendTransaction` and `getSignatureStatuses`. Requests are plain
//! JSON-RPC 2.0 over HTTP POST.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use baseroot_crypto::Ed25519Signature;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_program::hash::Hash;

use crate::config::Commitment;
use crate::error::AnchorError;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Wrapper used by `getLatestBlockhash` and `getSignatureStatuses`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    #[serde(default)]
    last_valid_block_height: Option<u64>,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Transaction error, `null` on success.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureStatus {
    /// The commitment this status has reached, if recognizable.
    pub fn commitment(&self) -> Option<Commitment> {
        self.confirmation_status.as_deref()?.parse().ok()
    }

    /// Whether the status satisfies `target`.
    pub fn reached(&self, target: Commitment) -> bool {
        self.commitment().is_some_and(|c| c >= target)
    }
}

/// JSON-RPC client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: url::Url,
    commitment: Commitment,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: url::Url, commitment: Commitment, timeout: Duration) -> Result<Self, AnchorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnchorError::Http {
                method: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            url,
            commitment,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, AnchorError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| AnchorError::Http {
                method: method.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AnchorError::InvalidResponse {
                method: method.to_string(),
                detail: format!("HTTP {status}: {body}"),
            });
        }

        let body: RpcResponse<T> = resp.json().await.map_err(|e| AnchorError::InvalidResponse {
            method: method.to_string(),
            detail: e.to_string(),
        })?;

        if let Some(err) = body.error {
            tracing::warn!(method, code = err.code, message = %err.message, "RPC error");
            return Err(AnchorError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or_else(|| AnchorError::InvalidResponse {
            method: method.to_string(),
            detail: "response has neither result nor error".into(),
        })
    }

    /// `getLatestBlockhash` at the configured commitment.
    pub async fn get_latest_blockhash(&self) -> Result<Hash, AnchorError> {
        let method = "getLatestBlockhash";
        let res: WithContext<LatestBlockhash> = self
            .call(method, json!([{ "commitment": self.commitment.as_str() }]))
            .await?;
        tracing::debug!(
            blockhash = %res.value.blockhash,
            last_valid_block_height = res.value.last_valid_block_height,
            "fetched blockhash"
        );
        res.value
            .blockhash
            .parse()
            .map_err(|e| AnchorError::InvalidResponse {
                method: method.into(),
                detail: format!("blockhash {:?}: {e}", res.value.blockhash),
            })
    }

    /// `sendTransaction` with base64 encoding. Returns the signature the
    /// node reports.
    pub async fn send_transaction(&self, wire: &[u8]) -> Result<Ed25519Signature, AnchorError> {
        let method = "sendTransaction";
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);
        let sig: String = self
            .call(
                method,
                json!([
                    encoded,
                    { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
                ]),
            )
            .await?;
        sig.parse().map_err(|e| AnchorError::InvalidResponse {
            method: method.into(),
            detail: format!("{e}"),
        })
    }

    /// `getSignatureStatuses` for one signature. `None` when the node has
    /// not seen it.
    pub async fn get_signature_status(
        &self,
        signature: &Ed25519Signature,
    ) -> Result<Option<SignatureStatus>, AnchorError> {
        let method = "getSignatureStatuses";
        let res: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                method,
                json!([[signature.to_base58()], { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(res.value.into_iter().next().flatten())
    }
}
