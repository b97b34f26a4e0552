//! # Upload Saga
//!
//! Every transition is checked against the current state. Terminal states
//! reject all further transitions, and forward steps cannot be skipped.
//! Failure has two exits:
//!
//! - [`UploadRecord::fail`] before anything was pinned.
//! - [`UploadRecord::compensate`] once a pin exists. The compensation
//!   record keeps the unpin outcome either way; a failed unpin is recorded,
//!   not swallowed.

use baseroot_core::{ContentDigest, ContentId, Pubkey, UploadId};
use baseroot_crypto::Ed25519Signature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Upload State ─────────────────────────────────────────────────────

/// Saga phases (4 forward + 3 terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadState {
    /// File accepted and written to temporary storage.
    Received,
    /// SHA-256 computed.
    Hashed,
    /// Bytes pinned; CID known.
    Pinned,
    /// Anchor transaction confirmed.
    Anchored,
    /// Success returned to the client. Terminal.
    Responded,
    /// Failed before any remote side effect. Terminal.
    Failed,
    /// Failed after pinning; unpin attempted. Terminal.
    Compensated,
}

impl UploadState {
    /// Every state, in declaration order.
    pub const ALL: [UploadState; 7] = [
        Self::Received,
        Self::Hashed,
        Self::Pinned,
        Self::Anchored,
        Self::Responded,
        Self::Failed,
        Self::Compensated,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Responded | Self::Failed | Self::Compensated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Hashed => "HASHED",
            Self::Pinned => "PINNED",
            Self::Anchored => "ANCHORED",
            Self::Responded => "RESPONDED",
            Self::Failed => "FAILED",
            Self::Compensated => "COMPENSATED",
        }
    }

    /// No wildcard, so a new variant must be placed here explicitly.
    fn next_forward_phase(&self) -> Option<UploadState> {
        match self {
            Self::Received => Some(Self::Hashed),
            Self::Hashed => Some(Self::Pinned),
            Self::Pinned => Some(Self::Anchored),
            Self::Anchored => Some(Self::Responded),
            Self::Responded | Self::Failed | Self::Compensated => None,
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UploadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown upload state: {s}"))
    }
}

// ── Error Types ──────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("invalid upload transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: UploadState,
        to: UploadState,
        reason: String,
    },
    #[error("upload {id} is in terminal state {state}")]
    AlreadyTerminal { id: UploadId, state: UploadState },
}

// ── Records ──────────────────────────────────────────────────────────

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: UploadState,
    pub to: UploadState,
    pub timestamp: DateTime<Utc>,
}

/// A compensating action taken after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRecord {
    /// State the saga was in when compensation ran.
    pub from_state: UploadState,
    pub action: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The saga record for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: UploadId,
    pub file_name: String,
    pub owner: Pubkey,
    pub size: u64,
    pub state: UploadState,
    pub digest: Option<ContentDigest>,
    pub cid: Option<ContentId>,
    /// Set as soon as the anchor transaction is signed, before it is sent.
    pub signature: Option<Ed25519Signature>,
    pub transitions: Vec<TransitionRecord>,
    pub compensation_log: Vec<CompensationRecord>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Start a saga in `RECEIVED`.
    pub fn new(file_name: impl Into<String>, owner: Pubkey, size: u64) -> Self {
        let now = Utc::now();
        Self {
            id: UploadId::new(),
            file_name: file_name.into(),
            owner,
            size,
            state: UploadState::Received,
            digest: None,
            cid: None,
            signature: None,
            transitions: Vec::new(),
            compensation_log: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether something exists remotely that a failure must undo.
    pub fn has_remote_effects(&self) -> bool {
        self.cid.is_some()
    }

    fn ensure_live(&self) -> Result<(), UploadError> {
        if self.state.is_terminal() {
            return Err(UploadError::AlreadyTerminal {
                id: self.id,
                state: self.state,
            });
        }
        Ok(())
    }

    fn advance_to(&mut self, to: UploadState) -> Result<(), UploadError> {
        self.ensure_live()?;
        if self.state.next_forward_phase() != Some(to) {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to,
                reason: "steps must run in order".to_string(),
            });
        }
        self.move_to(to);
        Ok(())
    }

    fn move_to(&mut self, to: UploadState) {
        let now = Utc::now();
        self.transitions.push(TransitionRecord {
            from: self.state,
            to,
            timestamp: now,
        });
        self.state = to;
        self.updated_at = now;
    }

    /// `RECEIVED → HASHED`.
    pub fn record_hash(&mut self, digest: ContentDigest) -> Result<(), UploadError> {
        self.advance_to(UploadState::Hashed)?;
        self.digest = Some(digest);
        Ok(())
    }

    /// `HASHED → PINNED`.
    pub fn record_pin(&mut self, cid: ContentId) -> Result<(), UploadError> {
        self.advance_to(UploadState::Pinned)?;
        self.cid = Some(cid);
        Ok(())
    }

    /// Remember the signature of a prepared transaction. Only valid while
    /// `PINNED`; does not change state.
    pub fn record_signature(&mut self, signature: Ed25519Signature) -> Result<(), UploadError> {
        self.ensure_live()?;
        if self.state != UploadState::Pinned {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to: UploadState::Anchored,
                reason: "a transaction can only be prepared after pinning".to_string(),
            });
        }
        self.signature = Some(signature);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Note an error that leaves the upload where it is, such as an anchor
    /// transaction whose outcome could not be observed.
    pub fn note_error(&mut self, reason: impl Into<String>) -> Result<(), UploadError> {
        self.ensure_live()?;
        self.last_error = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `PINNED → ANCHORED`.
    pub fn record_anchor(&mut self, signature: Ed25519Signature) -> Result<(), UploadError> {
        self.advance_to(UploadState::Anchored)?;
        self.signature = Some(signature);
        Ok(())
    }

    /// `ANCHORED → RESPONDED`.
    pub fn mark_responded(&mut self) -> Result<(), UploadError> {
        self.advance_to(UploadState::Responded)
    }

    /// Terminate without compensation. Rejected once a pin exists.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), UploadError> {
        self.ensure_live()?;
        if !matches!(self.state, UploadState::Received | UploadState::Hashed) {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to: UploadState::Failed,
                reason: "remote side effects exist; compensate instead".to_string(),
            });
        }
        self.last_error = Some(reason.into());
        self.move_to(UploadState::Failed);
        Ok(())
    }

    /// Terminate after pinning, recording the outcome of the compensating
    /// `action`. `outcome` is `Err(detail)` if the action itself failed.
    pub fn compensate(
        &mut self,
        reason: impl Into<String>,
        action: impl Into<String>,
        outcome: Result<(), String>,
    ) -> Result<(), UploadError> {
        self.ensure_live()?;
        if self.state != UploadState::Pinned {
            return Err(UploadError::InvalidTransition {
                from: self.state,
                to: UploadState::Compensated,
                reason: "compensation only applies to a pinned, unanchored upload".to_string(),
            });
        }
        self.compensation_log.push(CompensationRecord {
            from_state: self.state,
            action: action.into(),
            succeeded: outcome.is_ok(),
            error_detail: outcome.err(),
            timestamp: Utc::now(),
        });
        self.last_error = Some(reason.into());
        self.move_to(UploadState::Compensated);
        Ok(())
    }
}
