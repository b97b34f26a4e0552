//! # Upload Endpoint
//!
//! `POST /upload` with multipart fields `file` and `owner`.
//!
//! The file is streamed into a temp file under the upload directory, then
//! handed to [`run_upload`]. The temp file is removed when the request
//! ends, whatever the outcome.
//!
//! Responses keep a plain contract: 200 with `{cid, hash, solanaResult}`,
//! 400 with a short text for a missing file or bad owner, and a generic 500
//! text for everything else. The `x-upload-id` header points at the saga
//! record, which carries the actual failure cause.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use baseroot_core::Pubkey;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::orchestration::{run_upload, UploadFailure};
use crate::state::AppState;

pub const UPLOAD_ID_HEADER: HeaderName = HeaderName::from_static("x-upload-id");

pub const NO_FILE_MESSAGE: &str = "No file uploaded.";
pub const MULTIPLE_FILES_MESSAGE: &str = "Only one file may be uploaded per request.";
pub const BAD_OWNER_MESSAGE: &str = "Missing or invalid owner public key.";
pub const UPLOAD_FAILED_MESSAGE: &str = "An error occurred during file upload.";

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

/// Success body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub cid: String,
    /// SHA-256 of the file, lowercase hex.
    pub hash: String,
    /// Base58 signature of the anchor transaction.
    pub solana_result: String,
}

struct ReceivedFile {
    temp: NamedTempFile,
    name: String,
    size: u64,
}

async fn upload(State(state): State<AppState>, multipart: Result<Multipart, MultipartRejection>) -> Response {
    let Ok(mut multipart) = multipart else {
        return (StatusCode::BAD_REQUEST, NO_FILE_MESSAGE).into_response();
    };

    let mut file: Option<ReceivedFile> = None;
    let mut owner: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(e),
        };
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                if file.is_some() {
                    return (StatusCode::BAD_REQUEST, MULTIPLE_FILES_MESSAGE).into_response();
                }
                match receive_file(&state, field).await {
                    Ok(received) => file = Some(received),
                    Err(response) => return response,
                }
            }
            Some("owner") => match field.text().await {
                Ok(text) => owner = Some(text),
                Err(e) => return multipart_error(e),
            },
            _ => {}
        }
    }

    let Some(file) = file else {
        return (StatusCode::BAD_REQUEST, NO_FILE_MESSAGE).into_response();
    };
    let Some(owner) = owner.as_deref().and_then(|o| o.trim().parse::<Pubkey>().ok()) else {
        tracing::info!(owner = ?owner, "rejected upload with bad owner");
        return (StatusCode::BAD_REQUEST, BAD_OWNER_MESSAGE).into_response();
    };

    let result = run_upload(&state, file.temp.path(), &file.name, owner, file.size).await;

    if let Err(e) = file.temp.close() {
        tracing::warn!(error = %e, "failed to remove upload temp file");
    }

    match result {
        Ok(outcome) => {
            let body = UploadResponse {
                cid: outcome.cid.to_string(),
                hash: outcome.digest.to_hex(),
                solana_result: outcome.signature.to_base58(),
            };
            (StatusCode::OK, [upload_id_header(&outcome.upload_id)], Json(body)).into_response()
        }
        Err(UploadFailure { upload_id, error, .. }) => {
            tracing::error!(upload_id = ?upload_id.map(|id| id.to_string()), error = %error, "upload request failed");
            let mut response = (StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED_MESSAGE).into_response();
            if let Some(id) = upload_id {
                let (name, value) = upload_id_header(&id);
                response.headers_mut().insert(name, value);
            }
            response
        }
    }
}

/// Stream one multipart field into a temp file under the upload directory.
async fn receive_file(state: &AppState, mut field: Field<'_>) -> Result<ReceivedFile, Response> {
    let name = field
        .file_name()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("upload")
        .to_string();

    let internal = |e: std::io::Error| {
        tracing::error!(error = %e, dir = %state.config.upload_dir.display(), "cannot write upload temp file");
        (StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED_MESSAGE).into_response()
    };

    let temp = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(&state.config.upload_dir)
        .map_err(internal)?;
    let mut out = tokio::fs::File::from_std(temp.reopen().map_err(internal)?);

    let mut size = 0u64;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len() as u64;
                out.write_all(&chunk).await.map_err(internal)?;
            }
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        }
    }
    out.flush().await.map_err(internal)?;

    tracing::debug!(file_name = %name, size, path = %temp.path().display(), "upload buffered");
    Ok(ReceivedFile { temp, name, size })
}

fn multipart_error(err: MultipartError) -> Response {
    tracing::info!(error = %err, "rejected malformed multipart body");
    (err.status(), err.body_text()).into_response()
}

fn upload_id_header(id: &baseroot_core::UploadId) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&id.to_string()).unwrap_or(HeaderValue::from_static(""));
    (UPLOAD_ID_HEADER, value)
}
