//! `GET /v1/content/:cid/verify?hash=<hex>`: download the content behind a
//! CID and check it against an expected SHA-256.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use baseroot_core::{ContentDigest, ContentId};
use baseroot_crypto::hash_bytes;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/content/:cid/verify", get(verify_content))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub cid: String,
    pub expected: String,
    pub actual: String,
    pub size: usize,
    pub matches: bool,
}

async fn verify_content(
    State(state): State<AppState>,
    Path(cid): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifyResponse>, AppError> {
    let cid = ContentId::new(cid)?;
    let expected = ContentDigest::from_hex(query.hash.trim())?;

    let bytes = state.pinner.fetch(&cid).await?;
    let actual = hash_bytes(&bytes);
    let matches: bool = actual.as_bytes()[..].ct_eq(&expected.as_bytes()[..]).into();

    tracing::info!(cid = %cid, matches, size = bytes.len(), "verified pinned content");
    Ok(Json(VerifyResponse {
        cid: cid.to_string(),
        expected: expected.to_hex(),
        actual: actual.to_hex(),
        size: bytes.len(),
        matches,
    }))
}
