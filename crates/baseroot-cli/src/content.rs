//! # Offline content commands
//!
//! - `hash`: SHA-256 of a file, as the upload endpoint computes it.
//! - `payload encode`: anchor instruction data for a digest and CID,
//!   base64 encoded the way the RPC node reports instruction data.
//! - `payload decode`: the reverse.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use baseroot_anchor::{decode_payload, encode_payload};
use baseroot_core::{ContentDigest, ContentId};
use baseroot_crypto::hash_file;
use clap::{Args, Subcommand};

/// Arguments for `baseroot hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub file: PathBuf,
}

/// Arguments for `baseroot payload`.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    #[command(subcommand)]
    pub command: PayloadCommand,
}

#[derive(Subcommand, Debug)]
pub enum PayloadCommand {
    /// Build instruction data for a digest and CID.
    Encode {
        /// SHA-256 digest, 64 hex characters.
        #[arg(long)]
        hash: String,
        /// Content identifier returned by the pinning service.
        #[arg(long)]
        cid: String,
    },
    /// Parse base64 instruction data.
    Decode {
        /// Base64 instruction data.
        data: String,
    },
}

pub fn run_hash(args: &HashArgs) -> Result<u8> {
    println!("{}", hash_path(&args.file)?);
    Ok(0)
}

fn hash_path(path: &Path) -> Result<ContentDigest> {
    hash_file(path).with_context(|| format!("hashing {}", path.display()))
}

pub fn run_payload(args: &PayloadArgs) -> Result<u8> {
    match &args.command {
        PayloadCommand::Encode { hash, cid } => {
            println!("{}", encode(hash, cid)?);
        }
        PayloadCommand::Decode { data } => {
            println!("{}", serde_json::to_string_pretty(&decode(data)?)?);
        }
    }
    Ok(0)
}

fn encode(hash: &str, cid: &str) -> Result<String> {
    let digest = ContentDigest::from_hex(hash).context("invalid --hash")?;
    let cid = ContentId::new(cid).context("invalid --cid")?;
    Ok(base64::engine::general_purpose::STANDARD.encode(encode_payload(&digest, &cid)))
}

fn decode(data: &str) -> Result<serde_json::Value> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("instruction data is not base64")?;
    let decoded = decode_payload(&bytes)?;
    Ok(serde_json::json!({
        "opcode": bytes[0],
        "hash": decoded.digest.to_hex(),
        "cid": decoded.cid.as_str(),
        "length": bytes.len(),
    }))
}
