//! # baseroot-core: Foundational Types for the Baseroot Anchor Service
//!
//! Defines the value types that flow between the hasher, the pinning client,
//! the anchor submitter and the upload endpoint. Every other crate in the
//! workspace depends on `baseroot-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for every identifier.** `ContentDigest`, `ContentId`,
//!    `Pubkey` and `UploadId` are validated on construction. No bare strings
//!    cross crate boundaries.
//!
//! 2. **One digest path.** [`sha256_digest()`] is the single SHA-256
//!    implementation in the workspace.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `baseroot-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;

pub use digest::{sha256_digest, ContentDigest, DIGEST_LEN};
pub use error::ValidationError;
pub use identity::{ContentId, Pubkey, UploadId, PUBKEY_LEN};
