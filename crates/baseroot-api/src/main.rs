//! # baseroot-api server
//!
//! Loads configuration from the environment, builds the pinning client,
//! signing key and anchor submitter, resolves interrupted uploads left in
//! the journal, then serves the router until Ctrl-C.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use baseroot_anchor::{AnchorConfig, AnchorSubmitter, Anchorer};
use baseroot_api::config::ApiConfig;
use baseroot_api::journal::{FileJournal, MemoryJournal, UploadJournal};
use baseroot_api::orchestration::recover;
use baseroot_api::state::AppState;
use baseroot_crypto::{EnvKeyProvider, KeyProvider};
use baseroot_pinning::{build_pinner, PinningConfig};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("baseroot-api: {e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(config.log_json);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "baseroot-api exited with error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: ApiConfig) -> Result<(), BoxError> {
    let pinning = PinningConfig::from_env()?;
    let pinner = build_pinner(&pinning)?;

    let anchor_config = AnchorConfig::from_env()?;
    let signer: Arc<dyn KeyProvider> = Arc::new(EnvKeyProvider::from_env()?);
    let anchorer: Arc<dyn Anchorer> = Arc::new(AnchorSubmitter::new(&anchor_config, signer)?);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let journal: Arc<dyn UploadJournal> = match &config.journal_dir {
        Some(dir) => Arc::new(FileJournal::open(dir).await?),
        None => {
            tracing::warn!("BASEROOT_JOURNAL_DIR not set; upload records are kept in memory only");
            Arc::new(MemoryJournal::new())
        }
    };

    tracing::info!(
        backend = pinner.backend_name(),
        rpc_url = %anchor_config.rpc_url,
        program_id = %anchor_config.program_id,
        commitment = %anchor_config.commitment,
        payer = %anchorer.payer(),
        journal = journal.kind(),
        upload_dir = %config.upload_dir.display(),
        "baseroot-api configured"
    );

    let port = config.port;
    let state = AppState::with_journal(config, pinner, anchorer, journal).with_pin_name(pinning.pin_name.clone());

    recover(&state).await?;

    let app = baseroot_api::app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("baseroot-api listening on {addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("baseroot-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
