//! # Pinning commands
//!
//! `pin` uploads a file to the configured backend and prints the CID.
//! `fetch` downloads content by CID, optionally writing it to a file and
//! checking it against an expected digest. Both read the pinning backend
//! from the same environment variables as the server.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use baseroot_core::{ContentDigest, ContentId};
use baseroot_crypto::hash_bytes;
use baseroot_pinning::{build_pinner, pin_file, PinningConfig};
use clap::Args;

/// Arguments for `baseroot pin`.
#[derive(Args, Debug)]
pub struct PinArgs {
    /// File to pin.
    pub file: PathBuf,
}

/// Arguments for `baseroot fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Content identifier.
    pub cid: String,
    /// Write the content here instead of printing its digest only.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
    /// Expected SHA-256 (hex). Exit code 1 on mismatch.
    #[arg(long)]
    pub verify: Option<String>,
}

pub async fn run_pin(args: &PinArgs) -> Result<u8> {
    let config = PinningConfig::from_env().context("pinning configuration")?;
    let pinner = build_pinner(&config)?;
    tracing::info!(backend = pinner.backend_name(), file = %args.file.display(), "pinning");

    let cid = pin_file(pinner.as_ref(), &args.file).await?;
    println!("{cid}");
    Ok(0)
}

pub async fn run_fetch(args: &FetchArgs) -> Result<u8> {
    let cid = ContentId::new(args.cid.as_str()).context("invalid CID")?;
    let expected = args
        .verify
        .as_deref()
        .map(ContentDigest::from_hex)
        .transpose()
        .context("invalid --verify digest")?;

    let config = PinningConfig::from_env().context("pinning configuration")?;
    let pinner = build_pinner(&config)?;
    let bytes = pinner.fetch(&cid).await?;
    let actual = hash_bytes(&bytes);

    if let Some(out) = &args.out {
        tokio::fs::write(out, &bytes)
            .await
            .with_context(|| format!("writing {}", out.display()))?;
    }
    println!("{actual}  {} bytes", bytes.len());

    if let Some(expected) = expected {
        if expected != actual {
            bail!("digest mismatch: expected {expected}, got {actual}");
        }
        tracing::info!(cid = %cid, "digest verified");
    }
    Ok(0)
}
