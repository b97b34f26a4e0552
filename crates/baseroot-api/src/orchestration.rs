//! # Upload Orchestration
//!
//! Runs one upload through the saga: hash, pin, anchor. The record is
//! journaled after every transition and before the anchor transaction is
//! sent, so a restart can always tell what was done remotely.
//!
//! ```text
//! read file ─▶ HASHED ─▶ pin ─▶ PINNED ─▶ prepare ─▶ (signature saved) ─▶ submit ─▶ ANCHORED ─▶ RESPONDED
//!    │            │        │                  │                              │
//!    └────────────┴────────┘                  └──────────────────────────────┘
//!          FAILED                    release pin once, COMPENSATED
//!                                    (outcome unknown: stays PINNED)
//! ```
//!
//! Nothing is retried. A pinning failure never reaches the anchor step;
//! a definite anchor failure after a pin triggers at most one unpin. The
//! unpin is skipped while another upload of the same CID still depends on
//! the pin.
//!
//! A transaction whose outcome is unknown after the send is not
//! compensated. The record stays `PINNED` with its signature and
//! [`recover`] settles it from the chain.

use std::path::{Path, PathBuf};

use baseroot_anchor::{AnchorError, AnchorRecord, AnchorStatus};
use baseroot_core::{ContentDigest, ContentId, Pubkey, UploadId};
use baseroot_crypto::{hash_bytes, Ed25519Signature};
use baseroot_pinning::PinningError;
use baseroot_state::{UploadError, UploadRecord, UploadState};

use crate::journal::JournalError;
use crate::state::AppState;

/// Compensating action name recorded in the saga.
pub const UNPIN_ACTION: &str = "unpin";

/// Recorded instead of [`UNPIN_ACTION`] when another upload shares the pin.
pub const KEEP_SHARED_PIN_ACTION: &str = "keep_shared_pin";

/// A completed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub upload_id: UploadId,
    pub cid: ContentId,
    pub digest: ContentDigest,
    pub signature: Ed25519Signature,
}

/// The step that stopped an upload.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("failed to read uploaded file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("pinning failed: {0}")]
    Pinning(#[from] PinningError),
    #[error("anchoring failed: {0}")]
    Anchor(#[from] AnchorError),
    /// Sent, but neither confirmed nor rejected.
    #[error("anchor outcome unknown: {source}")]
    Unresolved {
        signature: Ed25519Signature,
        source: AnchorError,
    },
    #[error("journal failed: {0}")]
    Journal(#[from] JournalError),
    #[error("saga error: {0}")]
    State(#[from] UploadError),
}

/// A failed upload. `upload_id` is set once a record exists.
#[derive(Debug, thiserror::Error)]
#[error("upload failed: {error}")]
pub struct UploadFailure {
    pub upload_id: Option<UploadId>,
    pub final_state: Option<UploadState>,
    #[source]
    pub error: StepError,
}

/// Run the saga for the file at `path`.
pub async fn run_upload(
    state: &AppState,
    path: &Path,
    file_name: &str,
    owner: Pubkey,
    size: u64,
) -> Result<UploadOutcome, UploadFailure> {
    let mut record = UploadRecord::new(file_name, owner, size);
    if let Err(e) = state.journal.save(&record).await {
        return Err(UploadFailure {
            upload_id: None,
            final_state: None,
            error: e.into(),
        });
    }
    tracing::info!(upload_id = %record.id, file_name, size, owner = %owner, "upload received");

    match drive(state, &mut record, path).await {
        Ok(outcome) => Ok(outcome),
        Err(error) => {
            match &error {
                StepError::Unresolved { .. } => leave_for_recovery(state, &mut record, &error).await,
                _ => abort(state, &mut record, &error).await,
            }
            Err(UploadFailure {
                upload_id: Some(record.id),
                final_state: Some(record.state),
                error,
            })
        }
    }
}

async fn drive(state: &AppState, record: &mut UploadRecord, path: &Path) -> Result<UploadOutcome, StepError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StepError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let digest = hash_bytes(&bytes);
    record.record_hash(digest)?;
    state.journal.save(record).await?;
    tracing::debug!(upload_id = %record.id, hash = %digest, "hashed");

    let cid = state
        .pinner
        .pin(state.pin_name_for(&record.file_name), bytes)
        .await?;
    record.record_pin(cid.clone())?;
    state.journal.save(record).await?;
    tracing::info!(upload_id = %record.id, cid = %cid, backend = state.pinner.backend_name(), "pinned");

    let anchor = AnchorRecord::new(digest, cid.clone(), record.owner);
    let prepared = state.anchorer.prepare(&anchor).await?;
    record.record_signature(prepared.signature)?;
    state.journal.save(record).await?;

    let signature = match state.anchorer.submit(&prepared).await {
        Ok(signature) => signature,
        Err(e) if e.outcome_unknown() => confirm_late(state, record, prepared.signature, e).await?,
        Err(e) => return Err(e.into()),
    };
    record.record_anchor(signature)?;
    record.mark_responded()?;
    if let Err(e) = state.journal.save(record).await {
        // Anchored on chain; a stale PINNED record resolves on recovery.
        tracing::error!(upload_id = %record.id, error = %e, "failed to journal completed upload");
    }
    tracing::info!(upload_id = %record.id, cid = %cid, signature = %signature, "upload anchored");

    Ok(UploadOutcome {
        upload_id: record.id,
        cid,
        digest,
        signature,
    })
}

/// Ask once more whether a transaction with an unknown outcome landed.
/// Only a confirmation or an on-chain failure settles it here.
async fn confirm_late(
    state: &AppState,
    record: &UploadRecord,
    signature: Ed25519Signature,
    unknown: AnchorError,
) -> Result<Ed25519Signature, StepError> {
    match state.anchorer.signature_status(&signature).await {
        Ok(AnchorStatus::Confirmed) => {
            tracing::info!(upload_id = %record.id, signature = %signature, "confirmed after unknown outcome");
            Ok(signature)
        }
        Ok(AnchorStatus::Failed(reason)) => {
            tracing::warn!(upload_id = %record.id, signature = %signature, reason = %reason, "transaction failed on chain");
            Err(AnchorError::Rejected { signature, reason }.into())
        }
        Ok(status) => {
            tracing::warn!(upload_id = %record.id, signature = %signature, ?status, "still unresolved");
            Err(StepError::Unresolved {
                signature,
                source: unknown,
            })
        }
        Err(e) => {
            tracing::warn!(upload_id = %record.id, signature = %signature, error = %e, "status lookup failed");
            Err(StepError::Unresolved {
                signature,
                source: unknown,
            })
        }
    }
}

/// Keep a `PINNED` upload whose transaction may still land.
async fn leave_for_recovery(state: &AppState, record: &mut UploadRecord, error: &StepError) {
    let reason = error.to_string();
    if let Err(e) = record.note_error(reason.clone()) {
        tracing::error!(upload_id = %record.id, error = %e, "could not note unresolved upload");
        return;
    }
    tracing::warn!(
        upload_id = %record.id,
        signature = ?record.signature,
        error = %reason,
        "anchor outcome unknown; left pinned for recovery"
    );
    if let Err(e) = state.journal.save(record).await {
        tracing::error!(upload_id = %record.id, error = %e, "failed to journal unresolved upload");
    }
}

/// Terminate the saga after `error`: compensate if something was pinned,
/// otherwise mark it failed. Journal errors here are logged only.
async fn abort(state: &AppState, record: &mut UploadRecord, error: &StepError) {
    let reason = error.to_string();
    if record.state.is_terminal() {
        return;
    }

    let result = if record.has_remote_effects() && record.state == UploadState::Pinned {
        let (action, outcome) = release_pin(state, record).await;
        record.compensate(reason.clone(), action, outcome)
    } else if record.state == UploadState::Anchored {
        // Anchored but not yet marked responded; nothing to undo.
        record.mark_responded()
    } else {
        record.fail(reason.clone())
    };
    if let Err(e) = result {
        tracing::error!(upload_id = %record.id, error = %e, "could not terminate saga");
        return;
    }

    tracing::error!(upload_id = %record.id, state = %record.state, error = %reason, "upload failed");
    if let Err(e) = state.journal.save(record).await {
        tracing::error!(upload_id = %record.id, error = %e, "failed to journal terminated upload");
    }
}

/// Undo the pin for `record` unless another live or completed upload
/// still relies on the same CID. Returns the action taken and its outcome.
async fn release_pin(state: &AppState, record: &UploadRecord) -> (&'static str, Result<(), String>) {
    let Some(cid) = &record.cid else {
        return (UNPIN_ACTION, Ok(()));
    };
    match shared_with(state, record, cid).await {
        Ok(Some(other)) => {
            tracing::info!(upload_id = %record.id, cid = %cid, shared_with = %other, "pin shared; not unpinning");
            return (KEEP_SHARED_PIN_ACTION, Ok(()));
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(upload_id = %record.id, cid = %cid, error = %e, "cannot check for shared pin; leaving it");
            return (UNPIN_ACTION, Err(format!("pin left in place, journal unavailable: {e}")));
        }
    }
    match state.pinner.unpin(cid).await {
        Ok(()) => {
            tracing::info!(upload_id = %record.id, cid = %cid, "unpinned after anchor failure");
            (UNPIN_ACTION, Ok(()))
        }
        Err(e) => {
            tracing::error!(upload_id = %record.id, cid = %cid, error = %e, "compensating unpin failed");
            (UNPIN_ACTION, Err(e.to_string()))
        }
    }
}

/// Another upload holding `cid` that is pinned, anchored or responded.
async fn shared_with(
    state: &AppState,
    record: &UploadRecord,
    cid: &ContentId,
) -> Result<Option<UploadId>, JournalError> {
    Ok(state
        .journal
        .list()
        .await?
        .into_iter()
        .find(|other| {
            other.id != record.id
                && other.cid.as_ref() == Some(cid)
                && matches!(
                    other.state,
                    UploadState::Pinned | UploadState::Anchored | UploadState::Responded
                )
        })
        .map(|other| other.id))
}

// ── Recovery ─────────────────────────────────────────────────────────

/// What [`recover`] did with the records it found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub completed: usize,
    pub compensated: usize,
    pub failed: usize,
    /// Left untouched: the chain could not be asked or the transaction is
    /// still pending.
    pub deferred: usize,
}

/// Finish or undo every non-terminal upload in the journal.
///
/// - A recorded signature confirmed on chain: the upload is completed.
/// - A signature that failed on chain or is unknown to the node, or no
///   signature at all: the pin is released and the upload compensated.
/// - Records with no remote side effects are marked failed.
///
/// A signature still pending, or whose status lookup errors, is left for
/// the next run.
pub async fn recover(state: &AppState) -> Result<RecoveryReport, JournalError> {
    let mut report = RecoveryReport::default();
    for mut record in state.journal.list().await? {
        if record.state.is_terminal() {
            continue;
        }
        tracing::info!(upload_id = %record.id, state = %record.state, "recovering interrupted upload");

        let result = match record.state {
            UploadState::Received | UploadState::Hashed => {
                report.failed += 1;
                record.fail("interrupted before pinning")
            }
            UploadState::Anchored => {
                report.completed += 1;
                record.mark_responded()
            }
            UploadState::Pinned => match record.signature {
                Some(signature) => match state.anchorer.signature_status(&signature).await {
                    Ok(AnchorStatus::Confirmed) => {
                        report.completed += 1;
                        record
                            .record_anchor(signature)
                            .and_then(|()| record.mark_responded())
                    }
                    Ok(AnchorStatus::Pending) => {
                        tracing::info!(upload_id = %record.id, signature = %signature, "transaction still pending; deferring");
                        report.deferred += 1;
                        continue;
                    }
                    Ok(status) => {
                        report.compensated += 1;
                        let (action, outcome) = release_pin(state, &record).await;
                        record.compensate(
                            format!("interrupted during anchoring; transaction status {status:?}"),
                            action,
                            outcome,
                        )
                    }
                    Err(e) => {
                        tracing::warn!(upload_id = %record.id, signature = %signature, error = %e, "cannot resolve transaction; deferring");
                        report.deferred += 1;
                        continue;
                    }
                },
                None => {
                    report.compensated += 1;
                    let (action, outcome) = release_pin(state, &record).await;
                    record.compensate("interrupted before anchoring", action, outcome)
                }
            },
            UploadState::Responded | UploadState::Failed | UploadState::Compensated => continue,
        };

        match result {
            Ok(()) => state.journal.save(&record).await?,
            Err(e) => tracing::error!(upload_id = %record.id, error = %e, "recovery transition rejected"),
        }
    }

    if report != RecoveryReport::default() {
        tracing::info!(
            completed = report.completed,
            compensated = report.compensated,
            failed = report.failed,
            deferred = report.deferred,
            "journal recovery finished"
        );
    }
    Ok(report)
}
