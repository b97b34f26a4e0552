//! # Upload Saga Records
//!
//! - `GET /v1/uploads`: all journaled uploads, oldest first. Optional
//!   `?state=PINNED` filter.
//! - `GET /v1/uploads/:id`: one record, including its transition and
//!   compensation logs.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use baseroot_core::UploadId;
use baseroot_state::{UploadRecord, UploadState};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/uploads", get(list_uploads))
        .route("/v1/uploads/:id", get(get_upload))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
}

async fn list_uploads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UploadRecord>>, AppError> {
    let filter = query
        .state
        .as_deref()
        .map(str::parse::<UploadState>)
        .transpose()
        .map_err(AppError::Validation)?;

    let mut records = state.journal.list().await?;
    if let Some(wanted) = filter {
        records.retain(|r| r.state == wanted);
    }
    Ok(Json(records))
}

async fn get_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UploadRecord>, AppError> {
    let id: UploadId = id.parse()?;
    state
        .journal
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("upload {id}")))
}
