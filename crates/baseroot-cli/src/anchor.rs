//! # Anchoring commands
//!
//! - `upload`: the full hash, pin and anchor saga for one local file, run
//!   through the same orchestration as `POST /upload`.
//! - `recover`: settle uploads a journal left unfinished, for example one
//!   whose anchor transaction had an unknown outcome.
//! - `pubkey`: show the configured fee payer, or generate a new keypair.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use baseroot_anchor::{AnchorConfig, AnchorSubmitter, Anchorer};
use baseroot_api::config::ApiConfig;
use baseroot_api::journal::{FileJournal, MemoryJournal, UploadJournal};
use baseroot_api::orchestration::{recover, run_upload};
use baseroot_api::state::AppState;
use baseroot_core::Pubkey;
use baseroot_crypto::{EnvKeyProvider, KeyProvider, Keypair};
use baseroot_pinning::{build_pinner, PinningConfig};
use clap::Args;

/// Arguments for `baseroot upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload.
    pub file: PathBuf,
    /// Base58 public key recorded as the owner.
    #[arg(long)]
    pub owner: String,
    /// Persist the saga record in this directory.
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

/// Arguments for `baseroot recover`.
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// Journal directory written by `upload --journal` or the server.
    #[arg(long)]
    pub journal: PathBuf,
}

/// Arguments for `baseroot pubkey`.
#[derive(Args, Debug)]
pub struct PubkeyArgs {
    /// Generate a fresh keypair and print it instead of reading the
    /// configured one.
    #[arg(long)]
    pub generate: bool,
}

fn network_state(journal: Arc<dyn UploadJournal>) -> Result<AppState> {
    let pinning = PinningConfig::from_env().context("pinning configuration")?;
    let pinner = build_pinner(&pinning)?;
    let anchor_config = AnchorConfig::from_env().context("anchor configuration")?;
    let signer: Arc<dyn KeyProvider> = Arc::new(EnvKeyProvider::from_env()?);
    let anchorer: Arc<dyn Anchorer> = Arc::new(AnchorSubmitter::new(&anchor_config, signer)?);
    Ok(AppState::with_journal(ApiConfig::default(), pinner, anchorer, journal)
        .with_pin_name(pinning.pin_name))
}

pub async fn run_upload_file(args: &UploadArgs) -> Result<u8> {
    let owner: Pubkey = args.owner.trim().parse().context("invalid --owner")?;
    let size = tokio::fs::metadata(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?
        .len();
    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let journal: Arc<dyn UploadJournal> = match &args.journal {
        Some(dir) => Arc::new(FileJournal::open(dir).await?),
        None => Arc::new(MemoryJournal::new()),
    };
    let state = network_state(journal)?;

    match run_upload(&state, &args.file, &file_name, owner, size).await {
        Ok(outcome) => {
            let body = serde_json::json!({
                "cid": outcome.cid.as_str(),
                "hash": outcome.digest.to_hex(),
                "solanaResult": outcome.signature.to_base58(),
                "uploadId": outcome.upload_id.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(0)
        }
        Err(failure) => {
            let state = failure
                .final_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "UNRECORDED".to_string());
            tracing::error!(state = %state, "{}", failure.error);
            Ok(1)
        }
    }
}

pub async fn run_recover(args: &RecoverArgs) -> Result<u8> {
    let journal = FileJournal::open(&args.journal)
        .await
        .with_context(|| format!("opening journal {}", args.journal.display()))?;
    let state = network_state(Arc::new(journal))?;
    let report = recover(&state).await?;
    let body = serde_json::json!({
        "completed": report.completed,
        "compensated": report.compensated,
        "failed": report.failed,
        "deferred": report.deferred,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(if report.deferred > 0 { 2 } else { 0 })
}

pub fn run_pubkey(args: &PubkeyArgs) -> Result<u8> {
    if args.generate {
        let keypair = Keypair::generate();
        let secret = keypair.to_base58_secret();
        println!("pubkey: {}", keypair.pubkey());
        println!("secret: {}", secret.as_str());
        return Ok(0);
    }

    let provider = EnvKeyProvider::from_env()?;
    println!("{}", provider.pubkey());
    tracing::debug!(source = provider.source(), "signer source");
    Ok(0)
}
