//! # Ed25519 Keypairs and Signatures
//!
//! Keys and signatures in the encodings Solana tooling uses:
//!
//! - A secret key is 64 bytes, `seed || public key`, either base58 text or
//!   a JSON array of byte values (the `solana-keygen` file format).
//! - A signature is 64 bytes rendered as base58; the first signature of a
//!   transaction doubles as its id.
//!
//! `Keypair` does not implement `Serialize` and its `Debug` output never
//! contains key material.

use std::path::Path;

use baseroot_core::Pubkey;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Length of a serialized Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Length of a `seed || pubkey` secret key.
pub const KEYPAIR_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature, base58 in text form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; SIGNATURE_LEN]);

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Render as base58.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Parse from base58 text.
    pub fn from_base58(s: &str) -> Result<Self, CryptoError> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let arr: [u8; SIGNATURE_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Verify this signature over `message` against `signer`.
    pub fn verify(&self, message: &[u8], signer: &Pubkey) -> Result<(), CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid public key: {e}")))?;
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        vk.verify(message, &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({})", self.to_base58())
    }
}

impl std::fmt::Display for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl std::str::FromStr for Ed25519Signature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing keypair.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a new random keypair from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut csprng = rand_core::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Build from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Build from 64 `seed || pubkey` bytes. The embedded public key must
    /// match the one derived from the seed.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: Zeroizing<[u8; KEYPAIR_LEN]> =
            Zeroizing::new(bytes.try_into().map_err(|_| {
                CryptoError::InvalidKey(format!(
                    "secret key must be {KEYPAIR_LEN} bytes, got {}",
                    bytes.len()
                ))
            })?);
        let signing_key = ed25519_dalek::SigningKey::from_keypair_bytes(&arr)
            .map_err(|e| CryptoError::InvalidKey(format!("public half does not match seed: {e}")))?;
        Ok(Self { signing_key })
    }

    /// Parse a base58-encoded 64-byte secret key.
    pub fn from_base58(secret: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            bs58::decode(secret.trim())
                .into_vec()
                .map_err(|e| CryptoError::InvalidKey(format!("invalid base58: {e}")))?,
        );
        Self::from_keypair_bytes(&bytes)
    }

    /// Parse the JSON byte-array format written by `solana-keygen`.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
            serde_json::from_str(json)
                .map_err(|e| CryptoError::InvalidKey(format!("keypair file is not a byte array: {e}")))?,
        );
        Self::from_keypair_bytes(&bytes)
    }

    /// Read a `solana-keygen` JSON keypair file.
    pub fn read_json_file(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        let text = Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
            CryptoError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?);
        Self::from_json(&text)
    }

    /// The public key.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign arbitrary message bytes.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Export as base58 `seed || pubkey`.
    pub fn to_base58_secret(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(bs58::encode(&bytes[..]).into_string())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({}, <private>)", self.pubkey())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sign_and_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"message");
        assert!(sig.verify(b"message", &kp.pubkey()).is_ok());
        assert!(sig.verify(b"tampered", &kp.pubkey()).is_err());
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Keypair::from_seed(&[42u8; 32]);
        assert_eq!(kp.sign(b"abc"), kp.sign(b"abc"));
    }

    #[test]
    fn base58_secret_roundtrip() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let secret = kp.to_base58_secret();
        let restored = Keypair::from_base58(&secret).unwrap();
        assert_eq!(restored.pubkey(), kp.pubkey());
    }

    #[test]
    fn keypair_bytes_with_wrong_public_half_rejected() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let mut bytes = kp.signing_key.to_keypair_bytes();
        bytes[63] ^= 0xff;
        let err = Keypair::from_keypair_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
    }

    #[test]
    fn short_secret_rejected() {
        let err = Keypair::from_keypair_bytes(&[0u8; 32]).unwrap_err();
        assert!(err.to_string().contains("64 bytes"));
    }

    #[test]
    fn json_keypair_file() {
        let kp = Keypair::from_seed(&[9u8; 32]);
        let bytes = kp.signing_key.to_keypair_bytes().to_vec();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", serde_json::to_string(&bytes).unwrap()).unwrap();
        let loaded = Keypair::read_json_file(f.path()).unwrap();
        assert_eq!(loaded.pubkey(), kp.pubkey());
    }

    #[test]
    fn json_keypair_rejects_garbage() {
        assert!(Keypair::from_json("{\"not\": \"bytes\"}").is_err());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_seed(&[3u8; 32]);
        let dbg = format!("{kp:?}");
        assert!(dbg.contains("<private>"));
        assert!(!dbg.contains(kp.to_base58_secret().as_str()));
    }

    #[test]
    fn signature_base58_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"x");
        let parsed: Ed25519Signature = sig.to_base58().parse().unwrap();
        assert_eq!(parsed, sig);
        assert!(Ed25519Signature::from_base58("abc").is_err());
    }
}
