//! # baseroot-cli: Operator CLI
//!
//! ## Subcommands
//!
//! - `baseroot hash <file>`: SHA-256 of a file.
//! - `baseroot payload encode|decode`: anchor instruction data.
//! - `baseroot pin <file>`, `baseroot fetch <cid>`: pinning backend.
//! - `baseroot upload <file> --owner <pubkey>`: hash, pin and anchor.
//! - `baseroot recover --journal <dir>`: settle unfinished uploads.
//! - `baseroot pubkey`: fee payer of the configured signing key.
//!
//! Network commands read the same environment variables as the server.

pub mod anchor;
pub mod content;
pub mod pin;
