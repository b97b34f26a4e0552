//! # baseroot-api: Upload and Anchor Service
//!
//! Accepts a research file, hashes it, pins it to IPFS and records the
//! digest and CID on Solana. Each upload is tracked as a saga record in an
//! [`journal::UploadJournal`] so partial work can be compensated.
//!
//! ## API Surface
//!
//! | Route                              | Module                | Purpose                     |
//! |------------------------------------|-----------------------|-----------------------------|
//! | `POST /upload`                     | [`routes::upload`]    | Hash, pin and anchor a file |
//! | `GET /v1/uploads[/:id]`            | [`routes::uploads`]   | Saga records                |
//! | `GET /v1/content/:cid/verify`      | [`routes::content`]   | Integrity check by CID      |
//! | `GET /health/liveness`, `/readiness` | here                | Health checks               |
//! | `GET /metrics`                     | here                  | Prometheus scrape           |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod config;
pub mod error;
pub mod journal;
pub mod middleware;
pub mod orchestration;
pub mod routes;
pub mod state;

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use baseroot_state::UploadState;
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Body limit for everything except `POST /upload`.
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = state.config.metrics_enabled;

    let upload = routes::upload::router().layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    let mut api = Router::new()
        .merge(routes::uploads::router())
        .merge(routes::content::router())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .merge(upload);

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api.layer(TraceLayer::new_for_http()).with_state(state.clone());

    let mut health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    if metrics_on {
        health = health
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    Router::new().merge(health.with_state(state)).merge(api)
}

/// GET /metrics: refresh saga gauges from the journal, then encode.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    match state.journal.list().await {
        Ok(records) => {
            let mut by_state: HashMap<UploadState, usize> = HashMap::new();
            let mut orphaned = 0usize;
            for r in &records {
                *by_state.entry(r.state).or_default() += 1;
                if r.compensation_log.iter().any(|c| !c.succeeded) {
                    orphaned += 1;
                }
            }
            metrics.uploads_total().reset();
            for st in UploadState::ALL {
                let count = by_state.get(&st).copied().unwrap_or(0);
                metrics
                    .uploads_total()
                    .with_label_values(&[st.as_str()])
                    .set(count as f64);
            }
            metrics.compensations_failed_total().set(orphaned as f64);
        }
        Err(e) => tracing::warn!(error = %e, "journal unavailable; upload gauges not refreshed"),
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness check: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: the upload directory exists and the journal answers.
///
/// Returns 200 "ready" or 503 with a diagnostic message. The pinning
/// service and RPC node are not contacted.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::fs::metadata(&state.config.upload_dir).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return (StatusCode::SERVICE_UNAVAILABLE, "upload directory unavailable").into_response(),
    }

    if let Err(e) = state.journal.list().await {
        tracing::warn!(error = %e, "journal health check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "journal unavailable").into_response();
    }

    (StatusCode::OK, "ready").into_response()
}
