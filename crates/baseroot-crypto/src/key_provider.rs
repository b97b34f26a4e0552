//! # Key Provider Abstraction
//!
//! The anchor submitter signs transactions through [`KeyProvider`] so the
//! source of the fee-payer key is swappable:
//!
//! - [`LocalKeyProvider`]: an in-memory keypair, for tests and the CLI.
//! - [`EnvKeyProvider`]: loaded once at startup from
//!   `BASEROOT_SIGNER_KEY` (base58 64-byte secret) or
//!   `BASEROOT_SIGNER_KEYPAIR` (path to a `solana-keygen` JSON file).
//!
//! Key material never appears in source, logs or `Debug` output.

use baseroot_core::Pubkey;

use crate::ed25519::{Ed25519Signature, Keypair};
use crate::error::CryptoError;

/// Environment variable holding a base58-encoded 64-byte secret key.
pub const SIGNER_KEY_VAR: &str = "BASEROOT_SIGNER_KEY";

/// Environment variable holding a path to a JSON keypair file.
pub const SIGNER_KEYPAIR_VAR: &str = "BASEROOT_SIGNER_KEYPAIR";

/// Ed25519 signing backend for the service fee payer.
pub trait KeyProvider: Send + Sync {
    /// Sign raw message bytes.
    fn sign(&self, message: &[u8]) -> Result<Ed25519Signature, CryptoError>;

    /// Public key of the managed keypair.
    fn pubkey(&self) -> Pubkey;

    /// Name for diagnostics and logging.
    fn provider_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// LocalKeyProvider
// ---------------------------------------------------------------------------

/// Wraps a [`Keypair`] held directly in process memory.
#[derive(Debug)]
pub struct LocalKeyProvider {
    keypair: Keypair,
}

impl LocalKeyProvider {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Fresh random key.
    pub fn generate() -> Self {
        Self::new(Keypair::generate())
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(Keypair::from_seed(seed))
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign(&self, message: &[u8]) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.keypair.sign(message))
    }

    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

// ---------------------------------------------------------------------------
// EnvKeyProvider
// ---------------------------------------------------------------------------

/// Loads the signing key from the environment at construction.
///
/// `BASEROOT_SIGNER_KEY` wins when both variables are set.
///
/// ```bash
/// export BASEROOT_SIGNER_KEY="4Z7cXSy..."           # base58, 64 bytes
/// # or
/// export BASEROOT_SIGNER_KEYPAIR=~/.config/solana/id.json
/// ```
#[derive(Debug)]
pub struct EnvKeyProvider {
    keypair: Keypair,
    source: String,
}

impl EnvKeyProvider {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, CryptoError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup. Lets tests avoid mutating
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CryptoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(secret) = non_empty(SIGNER_KEY_VAR) {
            let secret = zeroize::Zeroizing::new(secret);
            let keypair = Keypair::from_base58(&secret)
                .map_err(|e| CryptoError::InvalidKey(format!("{SIGNER_KEY_VAR}: {e}")))?;
            tracing::info!(pubkey = %keypair.pubkey(), source = SIGNER_KEY_VAR, "loaded signing key");
            return Ok(Self {
                keypair,
                source: SIGNER_KEY_VAR.to_string(),
            });
        }

        if let Some(path) = non_empty(SIGNER_KEYPAIR_VAR) {
            let keypair = Keypair::read_json_file(path.trim())?;
            tracing::info!(pubkey = %keypair.pubkey(), source = %path, "loaded signing key");
            return Ok(Self {
                keypair,
                source: path,
            });
        }

        Err(CryptoError::NotConfigured(format!(
            "set {SIGNER_KEY_VAR} or {SIGNER_KEYPAIR_VAR}"
        )))
    }

    /// Variable name or file path the key was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, message: &[u8]) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.keypair.sign(message))
    }

    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}
