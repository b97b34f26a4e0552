//! # baseroot-state: Upload Saga State Machine
//!
//! One upload touches two external systems: the pinning service and the
//! chain. A pin that is never anchored is an orphan the service pays for,
//! so the pair is run as a saga with an explicit, serializable record:
//!
//! ```text
//! RECEIVED → HASHED → PINNED → ANCHORED → RESPONDED
//!     │         │        │
//!     └────┬────┘        └──→ COMPENSATED   (pin removed, or removal attempted)
//!          └──→ FAILED                      (nothing remote to undo)
//! ```
//!
//! The record is plain data; persisting it is the caller's job.

pub mod upload;

pub use upload::{CompensationRecord, TransitionRecord, UploadError, UploadRecord, UploadState};
