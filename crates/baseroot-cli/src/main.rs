//! # baseroot CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use baseroot_cli::anchor::{
    run_pubkey, run_recover, run_upload_file, PubkeyArgs, RecoverArgs, UploadArgs,
};
use baseroot_cli::content::{run_hash, run_payload, HashArgs, PayloadArgs};
use baseroot_cli::pin::{run_fetch, run_pin, FetchArgs, PinArgs};

/// Hash, pin and anchor research files.
#[derive(Parser, Debug)]
#[command(name = "baseroot", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 of a file.
    Hash(HashArgs),

    /// Encode or decode anchor instruction data.
    Payload(PayloadArgs),

    /// Pin a file to the configured IPFS backend.
    Pin(PinArgs),

    /// Download content by CID.
    Fetch(FetchArgs),

    /// Hash, pin and anchor a file.
    Upload(UploadArgs),

    /// Settle unfinished uploads in a journal directory.
    Recover(RecoverArgs),

    /// Show the signing key's public key, or generate a keypair.
    Pubkey(PubkeyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Hash(args) => run_hash(&args),
        Commands::Payload(args) => run_payload(&args),
        Commands::Pubkey(args) => run_pubkey(&args),
        Commands::Pin(args) => block_on(run_pin(&args)),
        Commands::Fetch(args) => block_on(run_fetch(&args)),
        Commands::Upload(args) => block_on(run_upload_file(&args)),
        Commands::Recover(args) => block_on(run_recover(&args)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn block_on<F>(future: F) -> anyhow::Result<u8>
where
    F: std::future::Future<Output = anyhow::Result<u8>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
