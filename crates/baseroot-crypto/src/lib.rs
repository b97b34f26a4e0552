//! # baseroot-crypto: Cryptographic Primitives
//!
//! - **Content hashing**: SHA-256 of an uploaded file, read whole into
//!   memory ([`sha256::hash_file`]).
//! - **Ed25519** keypairs and signatures in the base58 forms Solana tooling
//!   uses, for signing anchor transactions.
//! - **Key providers**: the process-wide signing key is loaded once at
//!   startup from injected configuration, never from source literals.
//!
//! ## Crate Policy
//!
//! - Depends only on `baseroot-core` internally.
//! - Private key bytes are never serialized or logged.

pub mod ed25519;
pub mod error;
pub mod key_provider;
pub mod sha256;

pub use ed25519::{Ed25519Signature, Keypair};
pub use error::CryptoError;
pub use key_provider::{EnvKeyProvider, KeyProvider, LocalKeyProvider};
pub use sha256::{hash_bytes, hash_file, hash_file_async};
