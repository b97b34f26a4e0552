//! # baseroot-anchor: Solana Anchor Submitter
//!
//! Records `(digest, CID, owner)` on Solana by sending one transaction
//! with one instruction to the configured anchor program.
//!
//! - [`instruction`]: the instruction data layout and its decoder.
//! - [`transaction`]: message compilation and fee-payer signing.
//! - [`rpc`]: JSON-RPC calls (`getLatestBlockhash`, `sendTransaction`,
//!   `getSignatureStatuses`).
//! - [`submitter`]: the [`Anchorer`] trait and its RPC-backed
//!   implementation.

pub mod config;
pub mod error;
pub mod instruction;
pub mod rpc;
pub mod submitter;
pub mod transaction;

pub use config::{AnchorConfig, Commitment};
pub use error::{AnchorError, PayloadError};
pub use instruction::{decode_payload, encode_payload, AnchorRecord, ANCHOR_OPCODE, RESERVED_LEN};
pub use submitter::{AnchorStatus, AnchorSubmitter, Anchorer, PreparedAnchor};
pub use solana_program::hash::Hash;
